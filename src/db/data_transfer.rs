// =====================================================
// BULK TRANSFER
// Paged export to CSV/JSON and record-by-record import
// =====================================================

use crate::config::GatewayConfig;
use crate::db::csv_codec;
use crate::db::executor::GatewayExecutor;
use crate::db::identifier::TableRef;
use crate::db::metadata::describe_table;
use crate::db::mutation::insert_row;
use crate::db::normalize::{coerce_import_value, EmptyPolicy};
use crate::db::rows::{list_rows, PageLimits};
use crate::db::sql_utils::value_to_csv_cell;
use crate::db_types::{
    ExportPayload, ExportRequest, ImportFailure, ImportReport, ImportRequest, ListRowsRequest,
    Record, TableMeta, TransferFormat,
};
use crate::error::{GatewayError, GatewayResult};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLimits {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for ExportLimits {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_pages: 5000,
        }
    }
}

impl From<&GatewayConfig> for ExportLimits {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            page_size: config.export_page_size,
            max_pages: config.export_max_pages,
        }
    }
}

// --- Export ---

/// Walks the filtered, sorted table page by page until a short page, the
/// reported total, or the page ceiling.
pub async fn export_table<E>(
    executor: &mut E,
    table: &TableRef,
    request: &ExportRequest,
    limits: &ExportLimits,
) -> GatewayResult<ExportPayload>
where
    E: GatewayExecutor + ?Sized,
{
    let page_size = limits.page_size.max(1);
    let page_limits = PageLimits::fixed(page_size);
    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Record> = Vec::new();
    let mut page_no: u32 = 1;

    loop {
        let page_request = ListRowsRequest {
            page: Some(i64::from(page_no)),
            page_size: Some(i64::from(page_size)),
            q: request.q.clone(),
            sort_by: request.sort_by.clone(),
            sort_dir: request.sort_dir.clone(),
        };
        let page = list_rows(executor, table, &page_request, &page_limits).await?;
        if columns.is_empty() {
            columns = page.columns.clone();
        }
        let fetched = page.rows.len();
        rows.extend(page.rows);
        log::debug!("Export {} page {}: {} rows", table, page_no, fetched);

        if fetched < page_size as usize || rows.len() as u64 >= page.total {
            break;
        }
        if page_no >= limits.max_pages {
            log::warn!(
                "Export of {} stopped at {} pages ({} of {} rows)",
                table,
                page_no,
                rows.len(),
                page.total
            );
            break;
        }
        page_no += 1;
    }

    let body = match request.format {
        TransferFormat::Csv => render_csv(&columns, &rows)?,
        TransferFormat::Json => serde_json::to_string_pretty(&rows).map_err(|e| {
            GatewayError::ExecutionFailed(format!("Failed to serialize export: {}", e))
        })?,
    };

    log::info!("Exported {} rows from {}", rows.len(), table);

    Ok(ExportPayload {
        content_type: request.format.content_type().to_string(),
        filename: format!(
            "{}.{}.{}",
            table.schema,
            table.table,
            request.format.extension()
        ),
        body,
        row_count: rows.len(),
    })
}

fn render_csv(columns: &[String], rows: &[Record]) -> GatewayResult<String> {
    let cells = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map(value_to_csv_cell).unwrap_or_default())
                .collect::<Vec<String>>()
        })
        .collect::<Vec<Vec<String>>>();
    csv_codec::encode(columns, &cells, ",")
}

// --- Import ---

fn parse_records(request: &ImportRequest) -> GatewayResult<Vec<Value>> {
    match request.format {
        TransferFormat::Json => {
            let parsed: Value = serde_json::from_str(&request.contents).map_err(|e| {
                GatewayError::invalid_input(format!("Invalid JSON payload: {}", e))
            })?;
            match parsed {
                Value::Array(items) => Ok(items),
                _ => Err(GatewayError::invalid_input(
                    "JSON must be an array of objects",
                )),
            }
        }
        TransferFormat::Csv => {
            let table = csv_codec::decode(&request.contents, &request.delimiter)?;
            if table.header.is_empty() {
                return Err(GatewayError::invalid_input("CSV header row is required"));
            }
            Ok(table
                .rows
                .iter()
                .map(|row| {
                    let object = table
                        .header
                        .iter()
                        .enumerate()
                        .map(|(idx, name)| {
                            let cell = row.get(idx).cloned().unwrap_or_default();
                            (name.clone(), Value::String(cell))
                        })
                        .collect::<Record>();
                    Value::Object(object)
                })
                .collect())
        }
    }
}

/// Insert payload for one record: writable columns present in the record,
/// normalized for their type. A present field that normalizes to null is
/// bound as NULL; absent fields are left to the column default.
fn import_payload(meta: &TableMeta, item: &Value, policy: EmptyPolicy) -> GatewayResult<Record> {
    let object = item
        .as_object()
        .ok_or_else(|| GatewayError::invalid_input("Record is not a JSON object"))?;

    let data = meta
        .columns
        .iter()
        .filter(|c| !c.is_auto_generated())
        .filter_map(|column| {
            object.get(&column.name).map(|raw| {
                (
                    column.name.clone(),
                    coerce_import_value(raw, &column.column_type, policy),
                )
            })
        })
        .collect();
    Ok(data)
}

/// Inserts records one at a time. Per-record failures are collected and
/// never abort the batch.
pub async fn import_table<E>(
    executor: &mut E,
    table: &TableRef,
    request: &ImportRequest,
) -> GatewayResult<ImportReport>
where
    E: GatewayExecutor + ?Sized,
{
    let records = parse_records(request)?;
    let meta = describe_table(executor, table).await?;
    let policy = if request.empty_as_null {
        EmptyPolicy::Null
    } else {
        EmptyPolicy::Keep
    };

    let mut report = ImportReport::default();
    for (index, item) in records.iter().enumerate() {
        let outcome = match import_payload(&meta, item, policy) {
            Ok(data) => insert_row(executor, table, &data).await.map(|_| ()),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                log::warn!("Import into {} failed for record {}: {}", table, index, e);
                report.errors.push(ImportFailure {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }
    report.failed = report.errors.len();

    log::info!(
        "Imported into {}: {} inserted, {} failed",
        table,
        report.inserted,
        report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests;
