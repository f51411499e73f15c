//! Typed operation requests.
//!
//! Each component accepts a closed set of operation names. Parameters are
//! checked here, at dispatch, so handlers only ever see well-formed requests.

use super::error::{PluginError, Result};
use crate::plugin::Configuration;

pub const INVOKE_SQL: &str = "invokeSql";
pub const LIST_OPEN_CURSORS_BY_SESSION: &str = "listOpenCursorsBySession";
pub const LIST_OPEN_CURSORS_BY_USER_BY_MACHINE: &str = "listOpenCursorsByUserByMachine";
pub const LIST_CACHED_CURSORS_BY_SESSION: &str = "listCachedCursorsBySession";
pub const VIEW_SESSION_CURSORS_CACHE: &str = "viewSessionCursorsCache";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlMode {
    /// Mutating statement; reports the update count
    Update,
    /// Anything else; reports the rows as a table
    Query,
}

/// Parameters of `invokeSql`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlRequest {
    pub sql: String,
    pub mode: SqlMode,
}

impl SqlRequest {
    /// Reads `sql` (required, non-blank) and `type` (`update` selects
    /// update mode; any other value, or none, runs a query).
    pub fn from_parameters(parameters: &Configuration) -> Result<Self> {
        let sql = parameters.required("sql")?.trim();
        if sql.is_empty() {
            return Err(PluginError::configuration("Parameter 'sql' cannot be empty"));
        }
        let mode = match parameters.simple("type") {
            Some("update") => SqlMode::Update,
            _ => SqlMode::Query,
        };
        Ok(Self {
            sql: sql.to_string(),
            mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerOperation {
    InvokeSql(SqlRequest),
    ListOpenCursorsBySession,
    ListOpenCursorsByUserByMachine,
    ListCachedCursorsBySession,
    ViewSessionCursorsCache { sid: String },
}

impl ServerOperation {
    pub fn parse(name: &str, parameters: &Configuration) -> Result<Self> {
        match name {
            INVOKE_SQL => Ok(Self::InvokeSql(SqlRequest::from_parameters(parameters)?)),
            LIST_OPEN_CURSORS_BY_SESSION => Ok(Self::ListOpenCursorsBySession),
            LIST_OPEN_CURSORS_BY_USER_BY_MACHINE => Ok(Self::ListOpenCursorsByUserByMachine),
            LIST_CACHED_CURSORS_BY_SESSION => Ok(Self::ListCachedCursorsBySession),
            VIEW_SESSION_CURSORS_CACHE => Ok(Self::ViewSessionCursorsCache {
                sid: session_id(parameters)?,
            }),
            other => Err(PluginError::UnsupportedOperation(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InvokeSql(_) => INVOKE_SQL,
            Self::ListOpenCursorsBySession => LIST_OPEN_CURSORS_BY_SESSION,
            Self::ListOpenCursorsByUserByMachine => LIST_OPEN_CURSORS_BY_USER_BY_MACHINE,
            Self::ListCachedCursorsBySession => LIST_CACHED_CURSORS_BY_SESSION,
            Self::ViewSessionCursorsCache { .. } => VIEW_SESSION_CURSORS_CACHE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOperation {
    InvokeSql(SqlRequest),
}

impl SchemaOperation {
    pub fn parse(name: &str, parameters: &Configuration) -> Result<Self> {
        match name {
            INVOKE_SQL => Ok(Self::InvokeSql(SqlRequest::from_parameters(parameters)?)),
            other => Err(PluginError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Session ids are non-negative integers; the value is still bound as text.
fn session_id(parameters: &Configuration) -> Result<String> {
    let sid = parameters.required("sid")?.trim();
    if sid.is_empty() || !sid.chars().all(|c| c.is_ascii_digit()) {
        return Err(PluginError::configuration(format!(
            "Parameter 'sid' must be a session id, got '{}'",
            sid
        )));
    }
    Ok(sid.to_string())
}
