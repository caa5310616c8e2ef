// =====================================================
// ROW MUTATION
// Insert, update, delete and duplicate single rows by primary key
// =====================================================

use crate::db::executor::{GatewayExecutor, Statement};
use crate::db::identifier::{parse_all, Identifier, TableRef};
use crate::db::metadata::describe_table;
use crate::db::normalize::{coerce_import_value, EmptyPolicy};
use crate::db::sql_utils::placeholders;
use crate::db_types::{InsertOutcome, MutationOutcome, PrimaryKeyValue, Record, TableMeta};
use crate::error::{GatewayError, GatewayResult};
use serde_json::Value;

impl PrimaryKeyValue {
    /// Picks the primary key columns out of a row snapshot.
    pub fn from_row(meta: &TableMeta, row: &Record) -> GatewayResult<Self> {
        if meta.primary_key.is_empty() {
            return Err(GatewayError::invalid_input(format!(
                "Table {}.{} has no primary key",
                meta.schema, meta.table
            )));
        }
        let mut pk = Record::new();
        for column in &meta.primary_key {
            let value = row.get(column).ok_or_else(|| {
                GatewayError::invalid_input(format!(
                    "Row is missing primary key column '{}'",
                    column
                ))
            })?;
            pk.insert(column.clone(), value.clone());
        }
        Ok(PrimaryKeyValue(pk))
    }
}

/// `a = ? AND b IS NULL` over the key columns, table-qualified.
fn key_predicate(table: &TableRef, pk: &PrimaryKeyValue) -> GatewayResult<(String, Vec<Value>)> {
    if pk.is_empty() {
        return Err(GatewayError::invalid_input("Empty primary key"));
    }
    let names = parse_all(pk.0.keys())?;
    let mut clauses = Vec::with_capacity(names.len());
    let mut params = Vec::new();
    for (column, value) in names.iter().zip(pk.0.values()) {
        if value.is_null() {
            clauses.push(format!("{} IS NULL", table.column(column)));
        } else {
            clauses.push(format!("{} = ?", table.column(column)));
            params.push(value.clone());
        }
    }
    Ok((clauses.join(" AND "), params))
}

pub async fn insert_row<E>(
    executor: &mut E,
    table: &TableRef,
    data: &Record,
) -> GatewayResult<InsertOutcome>
where
    E: GatewayExecutor + ?Sized,
{
    if data.is_empty() {
        return Err(GatewayError::invalid_input("No columns to insert"));
    }
    let columns = parse_all(data.keys())?;
    let column_sql = columns
        .iter()
        .map(Identifier::quoted)
        .collect::<Vec<String>>()
        .join(", ");
    let statement = Statement::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.qualified(),
            column_sql,
            placeholders(columns.len())
        ),
        data.values().cloned().collect(),
    );

    let result = executor.execute(&statement).await?;
    log::debug!("Inserted into {} ({} affected)", table, result.rows_affected);
    Ok(InsertOutcome {
        insert_id: result.last_insert_id,
        affected: result.rows_affected,
    })
}

pub async fn update_row<E>(
    executor: &mut E,
    table: &TableRef,
    pk: &PrimaryKeyValue,
    data: &Record,
) -> GatewayResult<MutationOutcome>
where
    E: GatewayExecutor + ?Sized,
{
    let (where_sql, where_params) = key_predicate(table, pk)?;
    if data.is_empty() {
        return Err(GatewayError::invalid_input("No columns to update"));
    }
    let columns = parse_all(data.keys())?;

    let assignments = columns
        .iter()
        .map(|c| format!("{} = ?", table.column(c)))
        .collect::<Vec<String>>()
        .join(", ");
    let mut params: Vec<Value> = data.values().cloned().collect();
    params.extend(where_params);

    let statement = Statement::with_params(
        format!(
            "UPDATE {} SET {} WHERE {} LIMIT 1",
            table.qualified(),
            assignments,
            where_sql
        ),
        params,
    );
    let result = executor.execute(&statement).await?;
    Ok(MutationOutcome {
        affected: result.rows_affected,
    })
}

pub async fn delete_row<E>(
    executor: &mut E,
    table: &TableRef,
    pk: &PrimaryKeyValue,
) -> GatewayResult<MutationOutcome>
where
    E: GatewayExecutor + ?Sized,
{
    let (where_sql, params) = key_predicate(table, pk)?;
    let statement = Statement::with_params(
        format!("DELETE FROM {} WHERE {} LIMIT 1", table.qualified(), where_sql),
        params,
    );
    let result = executor.execute(&statement).await?;
    Ok(MutationOutcome {
        affected: result.rows_affected,
    })
}

/// Builds the insert payload for a copy of `source`.
///
/// Generated columns are left to the engine. Key columns follow their own
/// rules: an auto-increment integer key is omitted, an override is used when
/// given, a `char`/`varchar` key gets a fresh UUID, anything else must be
/// supplied in `overrides`.
pub fn duplicate_payload(
    meta: &TableMeta,
    source: &Record,
    overrides: &Record,
) -> GatewayResult<Record> {
    if let Some(unknown) = overrides.keys().find(|name| meta.column(name).is_none()) {
        return Err(GatewayError::invalid_input(format!(
            "Unknown column '{}'",
            unknown
        )));
    }

    let mut data = Record::new();
    for column in &meta.columns {
        let override_value = overrides
            .get(&column.name)
            .map(|v| coerce_import_value(v, &column.column_type, EmptyPolicy::Null));

        if column.is_primary {
            if column.is_auto_increment() && column.is_integer() {
                continue;
            }
            let value = match override_value {
                Some(value) if !value.is_null() => value,
                _ if column.is_string_key() => Value::from(uuid::Uuid::new_v4().to_string()),
                _ => {
                    return Err(GatewayError::invalid_input(format!(
                        "Primary key column '{}' requires a value",
                        column.name
                    )))
                }
            };
            data.insert(column.name.clone(), value);
            continue;
        }

        if column.is_auto_generated() {
            continue;
        }
        if let Some(value) = override_value {
            data.insert(column.name.clone(), value);
        } else if let Some(value) = source.get(&column.name) {
            data.insert(column.name.clone(), value.clone());
        }
    }
    Ok(data)
}

pub async fn duplicate_row<E>(
    executor: &mut E,
    table: &TableRef,
    source: &Record,
    overrides: &Record,
) -> GatewayResult<InsertOutcome>
where
    E: GatewayExecutor + ?Sized,
{
    let meta = describe_table(executor, table).await?;
    let data = duplicate_payload(&meta, source, overrides)?;
    insert_row(executor, table, &data).await
}
