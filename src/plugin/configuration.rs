//! String-keyed property bags exchanged with the host agent.
//!
//! The same type carries the plugin configuration handed to `start` and the
//! parameters handed to `invoke_operation`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::oracle::error::{PluginError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    properties: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(name, value);
        self
    }

    pub fn put(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Raw value of a property, blank values included.
    pub fn simple(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Value of a property, or `default` when it is absent or blank.
    pub fn simple_value<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.simple(name) {
            Some(v) if !v.trim().is_empty() => v,
            _ => default,
        }
    }

    /// Value of a property that must be present.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.simple(name)
            .ok_or_else(|| PluginError::configuration(format!("Missing required property '{}'", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut configuration = Configuration::new();
        for (k, v) in iter {
            configuration.put(k, v);
        }
        configuration
    }
}
