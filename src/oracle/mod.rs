//! Oracle database integration module
//!
//! Connection handling, driver/client loading and the three monitored
//! resource components: the instance, its schemas and its users.

pub mod client;
pub mod connection;
pub mod error;
pub mod models;
pub mod operations;
pub mod query;
pub mod schema;
pub mod server;
pub mod user;

pub use client::{check_client_ready, prime_client, resolve_client_path, resolve_driver};
pub use connection::{ConnectionManager, Connector, OracleConnector, OracleSession, QueryRows, Session};
pub use error::{OracleError, PluginError, Result};
pub use models::{ConnectionConfig, Credentials};
pub use schema::OracleSchemaComponent;
pub use server::OracleServerComponent;
pub use user::OracleUserComponent;
