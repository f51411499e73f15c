//! Oracle database connection management
//!
//! A component owns one [`ConnectionManager`], which holds at most one live
//! [`Session`] and rebuilds it on demand. The Oracle-backed implementation of
//! the session lives here too; tests substitute their own [`Connector`].

use std::sync::{Arc, Mutex, MutexGuard};

use oracle::sql_type::{OracleType, ToSql};

use super::client;
use super::error::{OracleError, PluginError, Result};
use super::models::{ConnectionConfig, Credentials, InternalLogon};

/// Name and SQL type of a result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A fully fetched result set, values rendered as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRows {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, ignoring case
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            rows: self,
            values,
        })
    }

    /// First column of the first row
    pub fn first_value(&self) -> Option<&str> {
        self.rows.first().and_then(|r| r.first()).and_then(|v| v.as_deref())
    }
}

/// One row of a [`QueryRows`], addressable by column name
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    rows: &'a QueryRows,
    values: &'a [Option<String>],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.rows
            .column_index(column)
            .and_then(|idx| self.value(idx))
    }

    pub fn value(&self, idx: usize) -> Option<&'a str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }
}

/// A live database session.
///
/// Every call acquires its statement and result set, and releases them
/// before returning, whether it succeeds or fails.
pub trait Session: Send + Sync {
    /// True once the session is closed or no longer usable
    fn is_closed(&self) -> bool;

    /// Runs a query with positional (`:1`, `:2`, ...) string binds
    fn query(&self, sql: &str, params: &[&str]) -> Result<QueryRows>;

    /// Runs a mutating statement, returning the affected row count
    fn execute(&self, sql: &str, params: &[&str]) -> Result<u64>;

    fn close(&self) -> Result<()>;
}

/// Opens sessions from a connection configuration
pub trait Connector: Send + Sync {
    fn connect(&self, config: &ConnectionConfig, credentials: &Credentials) -> Result<Arc<dyn Session>>;
}

/// Connector backed by the `oracle` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleConnector;

impl Connector for OracleConnector {
    fn connect(&self, config: &ConnectionConfig, credentials: &Credentials) -> Result<Arc<dyn Session>> {
        if let Some(dir) = config.client_lib_dir.as_deref() {
            client::prime_client(dir)?;
        }

        let descriptor = config.connect_descriptor();
        let mut connector = oracle::Connector::new(
            credentials.user.as_str(),
            credentials.password.as_str(),
            descriptor.as_str(),
        );
        if credentials.internal_logon == Some(InternalLogon::Sysdba) {
            connector.privilege(oracle::Privilege::Sysdba);
        }

        let mut conn = connector
            .connect()
            .map_err(|e| classify_connect_error(e, config))?;
        // Statements issued through invokeSql are committed as they run
        conn.set_autocommit(true);

        log::info!("Successfully connected to {}", config.jdbc_url());
        Ok(Arc::new(OracleSession { conn }))
    }
}

/// Maps a connect failure onto a readable connection error
fn classify_connect_error(e: oracle::Error, config: &ConnectionConfig) -> PluginError {
    let url = config.jdbc_url();
    let text = e.to_string();
    let base = OracleError::from(e);

    let message = if text.contains("DPI-1047") || text.contains("Cannot locate") {
        "Oracle client library could not be loaded. Install Oracle Instant Client or set clientLibDir.".to_string()
    } else if text.contains("ORA-12170") || text.contains("ORA-12541") || text.contains("timeout") {
        format!("Could not connect to database at {}: Network error or database not reachable", url)
    } else if text.contains("ORA-01017") {
        format!("Authentication failed for {}: Invalid username or password", url)
    } else if text.contains("ORA-12505") {
        format!("SID '{}' not known by the listener at {}:{}", config.sid, config.host, config.port)
    } else {
        format!("Failed to connect to {}: {}", url, text)
    };

    PluginError::Connection(OracleError {
        message,
        ..base
    })
}

/// Session over an `oracle::Connection`
pub struct OracleSession {
    conn: oracle::Connection,
}

impl Session for OracleSession {
    fn is_closed(&self) -> bool {
        !matches!(self.conn.status(), Ok(oracle::ConnStatus::Normal))
    }

    fn query(&self, sql: &str, params: &[&str]) -> Result<QueryRows> {
        let binds: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let mut stmt = self.conn.statement(sql).build()?;
        let result_set = stmt.query(&binds)?;

        let columns: Vec<ColumnMeta> = result_set
            .column_info()
            .iter()
            .map(|info| ColumnMeta::new(info.name(), base_type_name(info.oracle_type())))
            .collect();
        let types: Vec<OracleType> = result_set
            .column_info()
            .iter()
            .map(|info| info.oracle_type().clone())
            .collect();

        let rows = drain_rows(
            result_set.map(|row| row.map_err(PluginError::from).and_then(|row| row_values(&row, &types))),
        )?;

        Ok(QueryRows { columns, rows })
    }

    fn execute(&self, sql: &str, params: &[&str]) -> Result<u64> {
        let binds: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let mut stmt = self.conn.statement(sql).build()?;
        stmt.execute(&binds)?;
        Ok(stmt.row_count()?)
    }

    fn close(&self) -> Result<()> {
        self.conn.close()?;
        Ok(())
    }
}

/// Consumes a row source to completion or to its first error.
///
/// The source is owned here, so it is dropped exactly once on either path.
pub fn drain_rows<I>(rows: I) -> Result<Vec<Vec<Option<String>>>>
where
    I: IntoIterator<Item = Result<Vec<Option<String>>>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

const BINARY_PLACEHOLDER: &str = "[BINARY DATA]";

/// Column types rendered as a placeholder rather than their content
fn is_opaque(oracle_type: &OracleType) -> bool {
    matches!(oracle_type, OracleType::BLOB)
}

fn row_values(row: &oracle::Row, types: &[OracleType]) -> Result<Vec<Option<String>>> {
    let mut values = Vec::with_capacity(types.len());
    for (idx, oracle_type) in types.iter().enumerate() {
        let value = if is_opaque(oracle_type) {
            row.get::<usize, Option<Vec<u8>>>(idx)?
                .map(|_| BINARY_PLACEHOLDER.to_string())
        } else {
            // RAW and LONG RAW convert to their hex text
            row.get::<usize, Option<String>>(idx)?
        };
        values.push(value);
    }
    Ok(values)
}

/// SQL type name without length/precision, e.g. `VARCHAR2(30)` -> `VARCHAR2`
fn base_type_name(oracle_type: &OracleType) -> String {
    strip_type_modifiers(&oracle_type.to_string())
}

fn strip_type_modifiers(type_name: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(type_name.len());
    for ch in type_name.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Holds a component's single session and rebuilds it on demand
pub struct ConnectionManager {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    slot: Mutex<Option<Arc<dyn Session>>>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.config.jdbc_url())
            .field("connected", &self.lock_slot().is_some())
            .finish()
    }
}

impl ConnectionManager {
    /// Creates a manager with an empty slot; the first access connects.
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            slot: Mutex::new(None),
        }
    }

    /// Creates a manager and connects immediately, propagating failures.
    pub fn open(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        let manager = Self::new(config, connector);
        let session = manager.build_connection()?;
        *manager.lock_slot() = Some(session);
        Ok(manager)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Opens a new session without touching the cached one
    ///
    /// # Returns
    /// A configuration error for an unknown driver, a connection error for
    /// anything that fails while connecting
    pub fn build_connection(&self) -> Result<Arc<dyn Session>> {
        client::resolve_driver(&self.config.driver_class)?;

        let credentials = self.config.login();
        log::debug!(
            "Attempting Oracle connection to [{}] as {:?}",
            self.config.jdbc_url(),
            credentials.redacted_properties()
        );

        self.connector.connect(&self.config, &credentials)
    }

    /// Returns the cached session if it is still open, otherwise builds and
    /// caches a new one. Build failures are logged and yield `None`.
    pub fn connection(&self) -> Option<Arc<dyn Session>> {
        let mut slot = self.lock_slot();

        if let Some(session) = slot.as_ref() {
            if !session.is_closed() {
                return Some(Arc::clone(session));
            }
            log::debug!("Cached connection to {} is closed, rebuilding", self.config.jdbc_url());
        }

        match self.build_connection() {
            Ok(session) => {
                *slot = Some(Arc::clone(&session));
                Some(session)
            }
            Err(e) => {
                log::info!("Unable to create oracle connection: {}", e);
                *slot = None;
                None
            }
        }
    }

    /// Forgets the cached session without closing it
    pub fn remove_connection(&self) {
        self.lock_slot().take();
    }

    /// Closes the cached session, if any. Close failures are only logged.
    pub fn close(&self) {
        if let Some(session) = self.lock_slot().take() {
            if let Err(e) = session.close() {
                log::debug!("Unable to close oracle connection: {}", e);
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Arc<dyn Session>>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
