//! Contract between the host monitoring agent and the resource components.
//!
//! The host owns scheduling and discovery. It drives each component through
//! `start`, periodic `availability` / `get_values` calls, on-demand
//! `invoke_operation` calls and finally `stop`.

pub mod configuration;
pub mod measurement;
pub mod operation;

use std::sync::Arc;

pub use configuration::Configuration;
pub use measurement::{
    AvailabilityType, DataType, MeasurementDataNumeric, MeasurementReport,
    MeasurementScheduleRequest,
};
pub use operation::{OperationResult, Property, PropertyList, PropertyMap, PropertySimple};

use crate::oracle::connection::Session;
use crate::oracle::error::Result;

/// What the host knows about the resource a component instance manages.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext {
    /// Identifying key: schema name or user name for child resources.
    pub resource_key: String,
    pub plugin_configuration: Configuration,
}

impl ResourceContext {
    pub fn new(resource_key: impl Into<String>, plugin_configuration: Configuration) -> Self {
        Self {
            resource_key: resource_key.into(),
            plugin_configuration,
        }
    }
}

pub trait ResourceComponent {
    fn start(&mut self, context: ResourceContext) -> Result<()>;

    /// Releases the component's resources. Never fails.
    fn stop(&mut self);

    /// Never fails: every failure mode degrades to `Down`.
    fn availability(&self) -> AvailabilityType;
}

pub trait MeasurementFacet {
    fn get_values(
        &self,
        report: &mut MeasurementReport,
        metrics: &[MeasurementScheduleRequest],
    ) -> Result<()>;
}

pub trait OperationFacet {
    fn invoke_operation(&self, name: &str, parameters: &Configuration) -> Result<OperationResult>;
}

/// Components backed by a database session.
pub trait DatabaseComponent {
    /// The live session, rebuilt if absent or closed. `None` when it cannot be built.
    fn connection(&self) -> Option<Arc<dyn Session>>;

    /// Forgets the cached session so the next access rebuilds it.
    fn remove_connection(&self);
}
