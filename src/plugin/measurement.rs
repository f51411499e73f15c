//! Availability and measurement types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AvailabilityType {
    Up,
    Down,
}

impl AvailabilityType {
    pub fn from_up(up: bool) -> Self {
        if up {
            AvailabilityType::Up
        } else {
            AvailabilityType::Down
        }
    }
}

/// Kind of a scheduled measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// A numeric statistic.
    Measurement,
    /// A configuration-valued measurement, e.g. an instance parameter.
    Trait,
}

/// One metric the host wants collected in this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasurementScheduleRequest {
    pub name: String,
    pub data_type: DataType,
}

impl MeasurementScheduleRequest {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Measurement)
    }

    pub fn trait_value(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Trait)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDataNumeric {
    pub request: MeasurementScheduleRequest,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Sink the components report collected values into.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MeasurementReport {
    numeric_data: Vec<MeasurementDataNumeric>,
}

impl MeasurementReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_data(&mut self, request: &MeasurementScheduleRequest, value: f64) {
        self.numeric_data.push(MeasurementDataNumeric {
            request: request.clone(),
            value,
            timestamp: Utc::now(),
        });
    }

    pub fn numeric_data(&self) -> &[MeasurementDataNumeric] {
        &self.numeric_data
    }

    /// First value reported under `name`.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.numeric_data
            .iter()
            .find(|d| d.request.name == name)
            .map(|d| d.value)
    }

    pub fn len(&self) -> usize {
        self.numeric_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numeric_data.is_empty()
    }
}
