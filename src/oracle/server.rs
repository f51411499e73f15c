//! Database instance monitoring
//!
//! Reports instance availability, statistics from `V$SYSSTAT`, parameters
//! from `V$PARAMETER` and total data file size, and exposes cursor
//! inspection operations.

use std::collections::HashMap;
use std::sync::Arc;

use super::connection::{ConnectionManager, Connector, OracleConnector, Session};
use super::error::{PluginError, Result};
use super::models::ConnectionConfig;
use super::operations::ServerOperation;
use super::query;
use crate::plugin::{
    AvailabilityType, Configuration, DataType, DatabaseComponent, MeasurementFacet,
    MeasurementReport, MeasurementScheduleRequest, OperationFacet, OperationResult,
    ResourceComponent, ResourceContext,
};

/// Metric reporting the summed size of all data files, in bytes
pub const TOTAL_SIZE_METRIC: &str = "totalSize";

const SQL_STATISTICS: &str = "SELECT name, value FROM V$SYSSTAT";
const SQL_PARAMETERS: &str = "SELECT name, value FROM V$PARAMETER";
const SQL_TOTAL_SIZE: &str = "SELECT SUM(bytes) FROM SYS.DBA_DATA_FILES";

const SQL_OPEN_CURSORS_BY_SESSION: &str = "SELECT s.sid, s.username, s.serial#, a.value \
     FROM v$sesstat a, v$statname b, v$session s \
     WHERE a.statistic# = b.statistic# \
     AND s.sid = a.sid \
     AND b.name = 'opened cursors current'";

const SQL_OPEN_CURSORS_BY_USER_BY_MACHINE: &str = "SELECT s.username, s.machine, \
     SUM(a.value) total_cur, AVG(a.value) avg_cur, MAX(a.value) max_cur \
     FROM v$sesstat a, v$statname b, v$session s \
     WHERE a.statistic# = b.statistic# \
     AND s.sid = a.sid \
     AND b.name = 'opened cursors current' \
     GROUP BY s.username, s.machine \
     ORDER BY total_cur DESC";

const SQL_CACHED_CURSORS_BY_SESSION: &str = "SELECT s.username, s.sid, s.serial#, a.value \
     FROM v$sesstat a, v$statname b, v$session s \
     WHERE a.statistic# = b.statistic# \
     AND s.sid = a.sid \
     AND b.name = 'session cursor cache count'";

const SQL_SESSION_CURSORS_CACHE: &str = "SELECT c.user_name, c.sid, sql.sql_text \
     FROM v$open_cursor c, v$sql sql \
     WHERE c.sql_id = sql.sql_id \
     AND c.sid = :1";

/// Component for a whole database instance
pub struct OracleServerComponent {
    connector: Arc<dyn Connector>,
    manager: Option<ConnectionManager>,
}

impl Default for OracleServerComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleServerComponent {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(OracleConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            manager: None,
        }
    }

    /// JDBC-style URL of the monitored instance, once started
    pub fn url(&self) -> Option<String> {
        self.manager.as_ref().map(|m| m.config().jdbc_url())
    }

    fn session(&self) -> Result<Arc<dyn Session>> {
        self.connection().ok_or_else(|| {
            PluginError::connection(format!(
                "No connection available to {}",
                self.url().unwrap_or_else(|| "unstarted component".to_string())
            ))
        })
    }

    fn list_open_cursors_by_session(&self, session: &dyn Session) -> Result<OperationResult> {
        let rows = session.query(SQL_OPEN_CURSORS_BY_SESSION, &[])?;
        let mut result = OperationResult::new();
        result.put_list(query::property_list(
            &rows,
            "openCursorList",
            "process",
            &[
                ("sid", "SID"),
                ("userName", "USERNAME"),
                ("serialNum", "SERIAL#"),
                ("numCursors", "VALUE"),
            ],
        ));
        Ok(result)
    }

    fn list_open_cursors_by_user_by_machine(&self, session: &dyn Session) -> Result<OperationResult> {
        let rows = session.query(SQL_OPEN_CURSORS_BY_USER_BY_MACHINE, &[])?;
        let mut result = OperationResult::new();
        result.put_list(query::property_list(
            &rows,
            "openCursorByUserList",
            "openCursorsByUser",
            &[
                ("userName", "USERNAME"),
                ("connectingServer", "MACHINE"),
                ("numCursors", "TOTAL_CUR"),
                ("avgCursors", "AVG_CUR"),
                ("maxCursors", "MAX_CUR"),
            ],
        ));
        Ok(result)
    }

    fn list_cached_cursors_by_session(&self, session: &dyn Session) -> Result<OperationResult> {
        let rows = session.query(SQL_CACHED_CURSORS_BY_SESSION, &[])?;
        let mut result = OperationResult::new();
        result.put_list(query::property_list(
            &rows,
            "cachedCursorByUserList",
            "cachedCursorsByUser",
            &[
                ("userName", "USERNAME"),
                ("sid", "SID"),
                ("serialNum", "SERIAL#"),
                ("numCursors", "VALUE"),
            ],
        ));
        Ok(result)
    }

    fn view_session_cursors_cache(&self, session: &dyn Session, sid: &str) -> Result<OperationResult> {
        let rows = session.query(SQL_SESSION_CURSORS_CACHE, &[sid])?;
        let mut result = OperationResult::new();
        result.put_list(query::property_list(
            &rows,
            "sessionCursorCacheList",
            "cachedCursorsBySession",
            &[("userName", "USER_NAME"), ("sid", "SID"), ("sqlText", "SQL_TEXT")],
        ));
        Ok(result)
    }
}

impl ResourceComponent for OracleServerComponent {
    fn start(&mut self, context: ResourceContext) -> Result<()> {
        let config = ConnectionConfig::from_configuration(&context.plugin_configuration)?;
        log::info!("Starting Oracle server component for {}", config.jdbc_url());
        let manager = ConnectionManager::open(config, Arc::clone(&self.connector))?;
        self.manager = Some(manager);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(manager) = self.manager.take() {
            manager.close();
        }
    }

    fn availability(&self) -> AvailabilityType {
        AvailabilityType::from_up(self.connection().is_some())
    }
}

impl MeasurementFacet for OracleServerComponent {
    fn get_values(&self, report: &mut MeasurementReport, metrics: &[MeasurementScheduleRequest]) -> Result<()> {
        let session = self.session()?;
        let mut parameters: Option<HashMap<String, f64>> = None;
        let mut statistics: Option<HashMap<String, f64>> = None;
        // Reported only once every query has succeeded
        let mut collected: Vec<(&MeasurementScheduleRequest, f64)> = Vec::with_capacity(metrics.len());

        for request in metrics {
            if request.name == TOTAL_SIZE_METRIC {
                collected.push((request, total_size(session.as_ref())?));
                continue;
            }

            let values = match request.data_type {
                DataType::Trait => {
                    if parameters.is_none() {
                        parameters = Some(query::numeric_value_map(session.as_ref(), SQL_PARAMETERS)?);
                    }
                    parameters.as_ref()
                }
                DataType::Measurement => {
                    if statistics.is_none() {
                        statistics = Some(query::numeric_value_map(session.as_ref(), SQL_STATISTICS)?);
                    }
                    statistics.as_ref()
                }
            };

            match values.and_then(|map| map.get(&request.name)) {
                Some(value) => collected.push((request, *value)),
                None => log::debug!("No value found for metric {}", request.name),
            }
        }

        for (request, value) in collected {
            report.add_data(request, value);
        }
        Ok(())
    }
}

/// Summed data file size. A NULL sum counts as zero; no row at all is NaN.
fn total_size(session: &dyn Session) -> Result<f64> {
    let rows = session.query(SQL_TOTAL_SIZE, &[])?;
    if rows.is_empty() {
        return Ok(f64::NAN);
    }
    Ok(rows
        .first_value()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .unwrap_or(0.0))
}

impl OperationFacet for OracleServerComponent {
    fn invoke_operation(&self, name: &str, parameters: &Configuration) -> Result<OperationResult> {
        let operation = ServerOperation::parse(name, parameters)?;
        let session = self.session()?;
        log::debug!("Invoking operation {}", operation.name());

        match &operation {
            ServerOperation::InvokeSql(request) => query::invoke_sql(session.as_ref(), request),
            ServerOperation::ListOpenCursorsBySession => self.list_open_cursors_by_session(session.as_ref()),
            ServerOperation::ListOpenCursorsByUserByMachine => {
                self.list_open_cursors_by_user_by_machine(session.as_ref())
            }
            ServerOperation::ListCachedCursorsBySession => self.list_cached_cursors_by_session(session.as_ref()),
            ServerOperation::ViewSessionCursorsCache { sid } => {
                self.view_session_cursors_cache(session.as_ref(), sid)
            }
        }
    }
}

impl DatabaseComponent for OracleServerComponent {
    fn connection(&self) -> Option<Arc<dyn Session>> {
        self.manager.as_ref()?.connection()
    }

    fn remove_connection(&self) {
        if let Some(manager) = &self.manager {
            manager.remove_connection();
        }
    }
}
