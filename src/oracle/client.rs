//! Driver resolution and Oracle Instant Client loading
//!
//! The host names a driver in the plugin configuration; this module decides
//! whether it is one this plugin can serve, and optionally loads the Oracle
//! client library from a configured directory before the first connection.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use super::error::{PluginError, Result};

/// Static reference to the Oracle client library (loaded via libloading)
static ORACLE_CLIENT: OnceLock<Mutex<Option<libloading::Library>>> = OnceLock::new();

/// Driver identifiers accepted in `driverClass`
pub const ORACLE_DRIVER_CLASSES: &[&str] = &[
    "oracle.jdbc.OracleDriver",
    "oracle.jdbc.driver.OracleDriver",
    "oracle",
];

#[cfg(target_os = "macos")]
const ORACLE_LIB_NAME: &str = "libclntsh.dylib";

#[cfg(target_os = "windows")]
const ORACLE_LIB_NAME: &str = "oci.dll";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const ORACLE_LIB_NAME: &str = "libclntsh.so";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// Oracle thin-style connections through ODPI-C
    Oracle,
}

/// Resolves a configured driver identifier
///
/// # Returns
/// The driver, or a configuration error naming the unknown identifier
pub fn resolve_driver(driver_class: &str) -> Result<Driver> {
    let driver_class = driver_class.trim();
    if ORACLE_DRIVER_CLASSES.contains(&driver_class) {
        Ok(Driver::Oracle)
    } else {
        Err(PluginError::configuration(format!(
            "Specified JDBC driver class ({}) not found.",
            driver_class
        )))
    }
}

/// Resolves the Oracle client directory path, expanding a leading `~/`
pub fn resolve_client_path(path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path_str)
}

/// Checks that the client library file exists in `client_dir`
pub fn check_client_ready(client_dir: &Path) -> bool {
    let lib_path = client_dir.join(ORACLE_LIB_NAME);

    if !lib_path.exists() {
        log::debug!("Oracle client library not found at: {:?}", lib_path);
        return false;
    }

    if !lib_path.is_file() {
        log::warn!("Oracle client library path exists but is not a file: {:?}", lib_path);
        return false;
    }

    true
}

/// Loads the Oracle client library from `dir` for the lifetime of the process
///
/// Loading happens once; later calls are no-ops.
pub fn prime_client(dir: &str) -> Result<()> {
    if is_client_primed() {
        return Ok(());
    }

    let client_dir = resolve_client_path(dir);
    if !check_client_ready(&client_dir) {
        return Err(PluginError::configuration(format!(
            "Oracle client library {} not found in {}",
            ORACLE_LIB_NAME,
            client_dir.display()
        )));
    }
    let lib_path = client_dir.join(ORACLE_LIB_NAME);

    // Make symbols visible to ODPI-C, which looks them up globally
    #[cfg(unix)]
    let library = unsafe {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
        let unix_lib = UnixLibrary::open(Some(&lib_path), RTLD_NOW | RTLD_GLOBAL).map_err(|e| {
            PluginError::configuration(format!("Failed to load Oracle client library: {}", e))
        })?;
        libloading::Library::from(unix_lib)
    };

    #[cfg(not(unix))]
    let library = unsafe {
        libloading::Library::new(&lib_path).map_err(|e| {
            PluginError::configuration(format!("Failed to load Oracle client library: {}", e))
        })?
    };

    let mutex = ORACLE_CLIENT.get_or_init(|| Mutex::new(None));
    let mut guard = mutex.lock().unwrap_or_else(|e| e.into_inner());
    if guard.is_none() {
        *guard = Some(library);
        log::info!("Oracle client library loaded from: {:?}", lib_path);
    }
    Ok(())
}

/// Checks if the Oracle client has been primed (loaded)
pub fn is_client_primed() -> bool {
    if let Some(mutex) = ORACLE_CLIENT.get() {
        if let Ok(guard) = mutex.lock() {
            return guard.is_some();
        }
    }
    false
}
