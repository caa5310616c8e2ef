// =====================================================
// DATABASE LAYER
// Identifier checks, statement builders and the executor seam they run on
// =====================================================

pub mod csv_codec;
pub mod data_transfer;
pub mod executor;
pub mod identifier;
pub mod metadata;
pub mod mutation;
pub mod normalize;
pub mod query_execution;
pub mod rows;
pub mod sql_utils;

// Re-export the pieces callers compose with

pub use data_transfer::{export_table, import_table, ExportLimits};
pub use executor::{Connector, ExecResult, GatewayExecutor, Statement};
pub use identifier::{Identifier, TableRef};
pub use metadata::{describe_table, list_tables, table_schema};
pub use mutation::{delete_row, duplicate_payload, duplicate_row, insert_row, update_row};
pub use normalize::{normalize_value, normalize_value_with, EmptyPolicy};
pub use query_execution::{ensure_limit, run_query, validate_sql};
pub use rows::{list_rows, PageLimits};
