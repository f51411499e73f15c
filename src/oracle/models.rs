//! Connection configuration and credentials
//!
//! This module turns the host's plugin configuration into the values used
//! to open an Oracle session.

use serde::{Deserialize, Serialize};

use super::error::{PluginError, Result};
use crate::plugin::Configuration;

pub const PROP_HOST: &str = "host";
pub const PROP_PORT: &str = "port";
pub const PROP_SID: &str = "sid";
pub const PROP_DRIVER_CLASS: &str = "driverClass";
pub const PROP_PRINCIPAL: &str = "principal";
pub const PROP_CREDENTIALS: &str = "credentials";
pub const PROP_CLIENT_LIB_DIR: &str = "clientLibDir";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "1521";
pub const DEFAULT_SID: &str = "XE";

/// Configuration for an Oracle database connection
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host/hostname
    pub host: String,

    /// Listener port, kept as text as the host supplies it
    pub port: String,

    /// Oracle system identifier
    pub sid: String,

    /// Driver identifier, e.g. `oracle.jdbc.driver.OracleDriver`
    pub driver_class: String,

    /// Login user
    pub principal: String,

    /// Login password
    #[serde(skip_serializing)]
    pub credentials: String,

    /// Optional Oracle Instant Client directory to load before connecting
    #[serde(default)]
    pub client_lib_dir: Option<String>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sid", &self.sid)
            .field("driver_class", &self.driver_class)
            .field("principal", &self.principal)
            .field("credentials", &"****")
            .field("client_lib_dir", &self.client_lib_dir)
            .finish()
    }
}

impl ConnectionConfig {
    /// Reads the plugin configuration, applying defaults to blank or absent
    /// `host`, `port` and `sid`.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self> {
        let config = Self {
            host: configuration.simple_value(PROP_HOST, DEFAULT_HOST).trim().to_string(),
            port: configuration.simple_value(PROP_PORT, DEFAULT_PORT).trim().to_string(),
            sid: configuration.simple_value(PROP_SID, DEFAULT_SID).trim().to_string(),
            driver_class: configuration.required(PROP_DRIVER_CLASS)?.trim().to_string(),
            principal: configuration.required(PROP_PRINCIPAL)?.to_string(),
            credentials: configuration.required(PROP_CREDENTIALS)?.to_string(),
            client_lib_dir: configuration
                .simple(PROP_CLIENT_LIB_DIR)
                .map(str::trim)
                .filter(|dir| !dir.is_empty())
                .map(str::to_string),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the connection configuration
    pub fn validate(&self) -> Result<()> {
        if self.driver_class.is_empty() {
            return Err(PluginError::configuration("driverClass cannot be empty"));
        }
        if self.principal.trim().is_empty() {
            return Err(PluginError::configuration("principal cannot be empty"));
        }
        match self.port.parse::<u16>() {
            Ok(0) | Err(_) => Err(PluginError::configuration(format!(
                "port must be a number between 1 and 65535, got '{}'",
                self.port
            ))),
            Ok(_) => Ok(()),
        }
    }

    /// Builds the JDBC-style URL identifying this instance
    ///
    /// Format: `jdbc:oracle:thin:@host:port:sid`
    pub fn jdbc_url(&self) -> String {
        format!("jdbc:oracle:thin:@{}:{}:{}", self.host, self.port, self.sid)
    }

    /// Builds the connect descriptor handed to the Oracle client
    pub fn connect_descriptor(&self) -> String {
        format!(
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST={})(PORT={}))(CONNECT_DATA=(SID={})))",
            self.host, self.port, self.sid
        )
    }

    pub fn login(&self) -> Credentials {
        Credentials::new(self.principal.clone(), self.credentials.clone())
    }
}

/// Privileged login modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalLogon {
    Sysdba,
}

impl InternalLogon {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternalLogon::Sysdba => "sysdba",
        }
    }
}

/// Credentials for Oracle database authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Database username
    pub user: String,

    /// Database password
    pub password: String,

    /// Set when the principal is `SYS`
    pub internal_logon: Option<InternalLogon>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"****")
            .field("internal_logon", &self.internal_logon)
            .finish()
    }
}

impl Credentials {
    /// Creates new Credentials; `SYS` in any letter case logs in as SYSDBA.
    pub fn new(user: String, password: String) -> Self {
        let internal_logon = if user.eq_ignore_ascii_case("SYS") {
            Some(InternalLogon::Sysdba)
        } else {
            None
        };
        Self {
            user,
            password,
            internal_logon,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.internal_logon.is_some()
    }

    /// The login properties as name/value pairs, password masked.
    pub fn redacted_properties(&self) -> Vec<(&'static str, String)> {
        let mut props = vec![("user", self.user.clone()), ("password", "****".to_string())];
        if let Some(logon) = self.internal_logon {
            props.push(("internal_logon", logon.as_str().to_string()));
        }
        props
    }
}
