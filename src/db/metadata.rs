// =====================================================
// SCHEMA INTROSPECTION
// Catalog lookups against information_schema, bound by exact name
// =====================================================

use crate::db::executor::{record_text, record_u64, GatewayExecutor, Statement};
use crate::db::identifier::TableRef;
use crate::db_types::{
    ColumnMeta, ForeignKeyColumn, IndexColumn, Record, TableMeta, TableSchema, TableSummary,
};
use crate::error::{GatewayError, GatewayResult};

const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "performance_schema", "mysql", "sys"];

const COLUMNS_SQL: &str = r#"
        SELECT
            COLUMN_NAME AS column_name,
            DATA_TYPE AS data_type,
            COLUMN_TYPE AS column_type,
            IS_NULLABLE AS is_nullable,
            COLUMN_KEY AS column_key,
            COLUMN_DEFAULT AS column_default,
            EXTRA AS extra
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = ?
            AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    "#;

const INDEXES_SQL: &str = r#"
        SELECT
            INDEX_NAME AS index_name,
            SEQ_IN_INDEX AS seq_in_index,
            COLUMN_NAME AS column_name,
            NON_UNIQUE AS non_unique
        FROM information_schema.STATISTICS
        WHERE TABLE_SCHEMA = ?
            AND TABLE_NAME = ?
        ORDER BY INDEX_NAME, SEQ_IN_INDEX
    "#;

const FOREIGN_KEYS_SQL: &str = r#"
        SELECT
            k.CONSTRAINT_NAME AS constraint_name,
            k.COLUMN_NAME AS column_name,
            k.REFERENCED_TABLE_SCHEMA AS ref_schema,
            k.REFERENCED_TABLE_NAME AS ref_table,
            k.REFERENCED_COLUMN_NAME AS ref_column
        FROM information_schema.KEY_COLUMN_USAGE k
        JOIN information_schema.TABLE_CONSTRAINTS c
            ON c.CONSTRAINT_NAME = k.CONSTRAINT_NAME
            AND c.TABLE_SCHEMA = k.TABLE_SCHEMA
            AND c.TABLE_NAME = k.TABLE_NAME
        WHERE c.CONSTRAINT_TYPE = 'FOREIGN KEY'
            AND k.TABLE_SCHEMA = ?
            AND k.TABLE_NAME = ?
        ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION
    "#;

fn table_statement(sql: &str, table: &TableRef) -> Statement {
    Statement::new(sql)
        .bind(table.schema.as_str())
        .bind(table.table.as_str())
}

fn column_from_record(record: &Record) -> ColumnMeta {
    let data_type = record_text(record, "data_type").unwrap_or_default();
    ColumnMeta {
        name: record_text(record, "column_name").unwrap_or_default(),
        column_type: record_text(record, "column_type").unwrap_or_else(|| data_type.clone()),
        data_type,
        is_nullable: record_text(record, "is_nullable")
            .map(|v| v.eq_ignore_ascii_case("YES"))
            .unwrap_or(false),
        is_primary: record_text(record, "column_key").as_deref() == Some("PRI"),
        default: record_text(record, "column_default"),
        extra: record_text(record, "extra").unwrap_or_default(),
    }
}

/// Columns in ordinal order. An unknown table yields `NotFound`.
pub async fn describe_table<E>(executor: &mut E, table: &TableRef) -> GatewayResult<TableMeta>
where
    E: GatewayExecutor + ?Sized,
{
    let rows = executor.fetch_all(&table_statement(COLUMNS_SQL, table)).await?;
    if rows.is_empty() {
        return Err(GatewayError::NotFound(format!("Table {} not found", table)));
    }

    let columns: Vec<ColumnMeta> = rows.iter().map(column_from_record).collect();
    let primary_key = columns
        .iter()
        .filter(|c| c.is_primary)
        .map(|c| c.name.clone())
        .collect();

    log::debug!("Described {} with {} columns", table, columns.len());

    Ok(TableMeta {
        schema: table.schema.to_string(),
        table: table.table.to_string(),
        primary_key,
        columns,
    })
}

pub async fn table_schema<E>(executor: &mut E, table: &TableRef) -> GatewayResult<TableSchema>
where
    E: GatewayExecutor + ?Sized,
{
    let meta = describe_table(executor, table).await?;

    let indexes = executor
        .fetch_all(&table_statement(INDEXES_SQL, table))
        .await?
        .iter()
        .map(|row| IndexColumn {
            index_name: record_text(row, "index_name").unwrap_or_default(),
            seq: record_u64(row, "seq_in_index")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0),
            column_name: record_text(row, "column_name").unwrap_or_default(),
            is_unique: record_u64(row, "non_unique") == Some(0),
        })
        .collect();

    let foreign_keys = executor
        .fetch_all(&table_statement(FOREIGN_KEYS_SQL, table))
        .await?
        .iter()
        .map(|row| ForeignKeyColumn {
            constraint_name: record_text(row, "constraint_name").unwrap_or_default(),
            column_name: record_text(row, "column_name").unwrap_or_default(),
            ref_schema: record_text(row, "ref_schema").unwrap_or_default(),
            ref_table: record_text(row, "ref_table").unwrap_or_default(),
            ref_column: record_text(row, "ref_column").unwrap_or_default(),
        })
        .collect();

    Ok(TableSchema {
        schema: meta.schema,
        table: meta.table,
        columns: meta.columns,
        indexes,
        foreign_keys,
    })
}

/// Tables of one schema, or of every non-system schema when `database` is
/// `None`.
pub async fn list_tables<E>(
    executor: &mut E,
    database: Option<&str>,
) -> GatewayResult<Vec<TableSummary>>
where
    E: GatewayExecutor + ?Sized,
{
    let mut sql = String::from(
        "SELECT TABLE_SCHEMA AS table_schema, TABLE_NAME AS table_name, TABLE_ROWS AS table_rows \
         FROM information_schema.TABLES",
    );
    let database = database.filter(|d| !d.is_empty());
    let mut statement_params = Vec::new();
    match database {
        Some(database) => {
            sql.push_str(" WHERE TABLE_SCHEMA = ?");
            statement_params.push(serde_json::Value::from(database));
        }
        None => {
            let excluded = SYSTEM_SCHEMAS
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<String>>()
                .join(", ");
            sql.push_str(&format!(" WHERE TABLE_SCHEMA NOT IN ({})", excluded));
        }
    }
    sql.push_str(" ORDER BY TABLE_SCHEMA, TABLE_NAME");

    let rows = executor
        .fetch_all(&Statement::with_params(sql, statement_params))
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let schema = record_text(row, "table_schema")?;
            if database.is_none() && SYSTEM_SCHEMAS.contains(&schema.as_str()) {
                return None;
            }
            Some(TableSummary {
                schema,
                name: record_text(row, "table_name")?,
                rows: record_u64(row, "table_rows"),
            })
        })
        .collect())
}
