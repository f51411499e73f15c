//! Schema monitoring
//!
//! A schema is available while it owns at least one table.

use std::sync::Arc;

use super::client;
use super::connection::{ConnectionManager, Connector, OracleConnector, Session};
use super::error::{PluginError, Result};
use super::models::ConnectionConfig;
use super::operations::SchemaOperation;
use super::query;
use crate::plugin::{
    AvailabilityType, Configuration, DatabaseComponent, MeasurementFacet, MeasurementReport,
    MeasurementScheduleRequest, OperationFacet, OperationResult, ResourceComponent, ResourceContext,
};

const SQL_AVAILABILITY: &str = "SELECT owner FROM dba_tables WHERE owner = :1 AND ROWNUM <= 1";

/// Component for one schema, keyed by owner name
pub struct OracleSchemaComponent {
    connector: Arc<dyn Connector>,
    owner: String,
    manager: Option<ConnectionManager>,
}

impl Default for OracleSchemaComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleSchemaComponent {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(OracleConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            owner: String::new(),
            manager: None,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn exists(&self) -> Result<bool> {
        let session = self
            .connection()
            .ok_or_else(|| PluginError::connection("No connection available"))?;
        let rows = session.query(SQL_AVAILABILITY, &[self.owner.as_str()])?;
        Ok(!rows.is_empty())
    }
}

impl ResourceComponent for OracleSchemaComponent {
    fn start(&mut self, context: ResourceContext) -> Result<()> {
        let config = ConnectionConfig::from_configuration(&context.plugin_configuration)?;
        client::resolve_driver(&config.driver_class)?;
        log::info!("Starting Oracle schema component for {} on {}", context.resource_key, config.jdbc_url());
        self.owner = context.resource_key;
        self.manager = Some(ConnectionManager::new(config, Arc::clone(&self.connector)));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(manager) = self.manager.take() {
            manager.close();
        }
    }

    fn availability(&self) -> AvailabilityType {
        match self.exists() {
            Ok(up) => AvailabilityType::from_up(up),
            Err(e) => {
                log::debug!("Schema {} availability check failed: {}", self.owner, e);
                AvailabilityType::Down
            }
        }
    }
}

impl MeasurementFacet for OracleSchemaComponent {
    /// Schemas define no metrics.
    fn get_values(&self, _report: &mut MeasurementReport, _metrics: &[MeasurementScheduleRequest]) -> Result<()> {
        Ok(())
    }
}

impl OperationFacet for OracleSchemaComponent {
    fn invoke_operation(&self, name: &str, parameters: &Configuration) -> Result<OperationResult> {
        let SchemaOperation::InvokeSql(request) = SchemaOperation::parse(name, parameters)?;
        let session = self
            .connection()
            .ok_or_else(|| PluginError::connection(format!("No connection available for schema {}", self.owner)))?;
        query::invoke_sql(session.as_ref(), &request)
    }
}

impl DatabaseComponent for OracleSchemaComponent {
    fn connection(&self) -> Option<Arc<dyn Session>> {
        self.manager.as_ref()?.connection()
    }

    fn remove_connection(&self) {
        if let Some(manager) = &self.manager {
            manager.remove_connection();
        }
    }
}
