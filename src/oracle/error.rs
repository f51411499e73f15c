//! Error types shared by every Oracle component.
//!
//! Availability checks never surface these; metric collection and operation
//! invocation hand them back to the host agent, which is the error boundary.

use serde::Serialize;
use thiserror::Error;

/// An Oracle-level failure with its ORA code and an operator hint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OracleError {
    pub code: i32,
    pub message: String,
    pub hint: Option<String>,
}

impl OracleError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        let hint = match code {
            1017 => Some("Check the principal and credentials of the plugin configuration.".into()),
            1031 => Some("Insufficient privileges. The monitoring account needs SELECT on the V$ and DBA_ views.".into()),
            942 => Some("Table or view does not exist, or the monitoring account lacks access to it.".into()),
            12505 => Some("The listener does not know the configured SID.".into()),
            12514 => Some("The listener does not know the requested service.".into()),
            12170 => Some("Connection timed out. Check network and firewall.".into()),
            12541 => Some("No listener at the configured host:port.".into()),
            12545 => Some("Target host does not exist.".into()),
            _ => None,
        };
        Self { code, message, hint }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            hint: None,
        }
    }
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.code == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "ORA-{:05}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for OracleError {}

impl From<oracle::Error> for OracleError {
    fn from(e: oracle::Error) -> Self {
        match e.db_error() {
            Some(db) => OracleError::new(db.code(), db.message()),
            None => OracleError::internal(e.to_string()),
        }
    }
}

/// Error returned to the host agent.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Bad or missing plugin configuration, unknown driver, or malformed
    /// operation parameters.
    #[error("Invalid plugin configuration: {0}")]
    Configuration(String),

    /// Network, authentication or client library failure while opening a session.
    #[error("Connection failed: {0}")]
    Connection(OracleError),

    /// SQL execution failure.
    #[error("Query failed: {0}")]
    Query(OracleError),

    #[error("Operation [{0}] is not supported yet.")]
    UnsupportedOperation(String),
}

impl PluginError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(OracleError::internal(message))
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(OracleError::internal(message))
    }

    /// Hint attached to the underlying Oracle error, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Connection(e) | Self::Query(e) => e.hint.as_deref(),
            _ => None,
        }
    }
}

impl From<oracle::Error> for PluginError {
    fn from(e: oracle::Error) -> Self {
        PluginError::Query(OracleError::from(e))
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;
