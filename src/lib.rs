// Safe row browsing, mutation and bulk transfer over MySQL tables that are
// only known at runtime.

pub mod config;
pub mod db;
pub mod db_types;
pub mod error;
pub mod gateway;
pub mod mysql;

pub use config::GatewayConfig;
pub use db_types::*;
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use mysql::{MySqlConnector, MySqlSession};
