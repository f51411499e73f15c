//! Database user monitoring

use std::sync::Arc;

use super::client;
use super::connection::{ConnectionManager, Connector, OracleConnector, Session};
use super::error::{PluginError, Result};
use super::models::ConnectionConfig;
use super::query;
use crate::plugin::{
    AvailabilityType, Configuration, DatabaseComponent, MeasurementFacet, MeasurementReport,
    MeasurementScheduleRequest, OperationFacet, OperationResult, ResourceComponent, ResourceContext,
};

/// Number of sessions currently open by the user
pub const SESSIONS_METRIC: &str = "sessions";

const SQL_AVAILABILITY: &str = "SELECT COUNT(*) FROM DBA_USERS WHERE username = :1";
const SQL_SESSIONS: &str = "SELECT COUNT(*) AS active_connections FROM V$SESSION WHERE username = :1";

/// Component for one database account, keyed by username
pub struct OracleUserComponent {
    connector: Arc<dyn Connector>,
    username: String,
    manager: Option<ConnectionManager>,
}

impl Default for OracleUserComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleUserComponent {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(OracleConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            username: String::new(),
            manager: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn session(&self) -> Result<Arc<dyn Session>> {
        self.connection()
            .ok_or_else(|| PluginError::connection(format!("No connection available for user {}", self.username)))
    }

    fn exists(&self) -> Result<bool> {
        let session = self.session()?;
        let count = query::single_numeric_value(session.as_ref(), SQL_AVAILABILITY, &[self.username.as_str()])?;
        Ok(count == Some(1.0))
    }
}

impl ResourceComponent for OracleUserComponent {
    fn start(&mut self, context: ResourceContext) -> Result<()> {
        let config = ConnectionConfig::from_configuration(&context.plugin_configuration)?;
        client::resolve_driver(&config.driver_class)?;
        log::info!("Starting Oracle user component for {} on {}", context.resource_key, config.jdbc_url());
        self.username = context.resource_key;
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
                log::debug!("User {} availability check failed: {}", self.username, e);
                AvailabilityType::Down
            }
        }
    }
}

impl MeasurementFacet for OracleUserComponent {
    fn get_values(&self, report: &mut MeasurementReport, metrics: &[MeasurementScheduleRequest]) -> Result<()> {
        for request in metrics {
            if request.name != SESSIONS_METRIC {
                continue;
            }
            let session = self.session()?;
            let count = query::single_numeric_value(session.as_ref(), SQL_SESSIONS, &[self.username.as_str()])?;
            if let Some(count) = count {
                report.add_data(request, count);
            }
        }
        Ok(())
    }
}

impl OperationFacet for OracleUserComponent {
    /// Users define no operations.
    fn invoke_operation(&self, name: &str, _parameters: &Configuration) -> Result<OperationResult> {
        Err(PluginError::UnsupportedOperation(name.to_string()))
    }
}

impl DatabaseComponent for OracleUserComponent {
    fn connection(&self) -> Option<Arc<dyn Session>> {
        self.manager.as_ref()?.connection()
    }

    fn remove_connection(&self) {
        if let Some(manager) = &self.manager {
            manager.remove_connection();
        }
    }
}
