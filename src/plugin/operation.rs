//! Structured results of operation invocations.
//!
//! Results are trees of named properties: simple values, maps of named
//! properties, and lists of maps (used for tabular cursor listings).

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySimple {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyMap {
    pub name: String,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyList {
    pub name: String,
    pub items: Vec<PropertyMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Property {
    Simple(PropertySimple),
    Map(PropertyMap),
    List(PropertyList),
}

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::Simple(p) => &p.name,
            Property::Map(p) => &p.name,
            Property::List(p) => &p.name,
        }
    }
}

impl PropertyMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Adds or replaces a simple property, keeping insertion order.
    pub fn put_simple(&mut self, name: impl Into<String>, value: Option<String>) {
        self.put(Property::Simple(PropertySimple {
            name: name.into(),
            value,
        }));
    }

    pub fn put(&mut self, property: Property) {
        match self.properties.iter_mut().find(|p| p.name() == property.name()) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Value of a simple property; `None` when absent, null, or not simple.
    pub fn simple_value(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Property::Simple(p)) => p.value.as_deref(),
            _ => None,
        }
    }
}

impl PropertyList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, item: PropertyMap) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    complex_results: PropertyMap,
}

impl Default for OperationResult {
    fn default() -> Self {
        Self {
            complex_results: PropertyMap::new("results"),
        }
    }
}

impl OperationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_simple(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.complex_results.put_simple(name, Some(value.into()));
    }

    pub fn put_list(&mut self, list: PropertyList) {
        self.complex_results.put(Property::List(list));
    }

    pub fn complex_results(&self) -> &PropertyMap {
        &self.complex_results
    }

    pub fn simple(&self, name: &str) -> Option<&str> {
        self.complex_results.simple_value(name)
    }

    pub fn list(&self, name: &str) -> Option<&PropertyList> {
        match self.complex_results.get(name) {
            Some(Property::List(list)) => Some(list),
            _ => None,
        }
    }
}
