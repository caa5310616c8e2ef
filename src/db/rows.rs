// =====================================================
// ROW BROWSER
// Search, sort and paginate rows of an introspected table
// =====================================================

use crate::config::GatewayConfig;
use crate::db::executor::{record_u64, GatewayExecutor, Statement};
use crate::db::identifier::TableRef;
use crate::db::metadata::describe_table;
use crate::db::sql_utils::qualified_column_name;
use crate::db_types::{ColumnMeta, ListRowsRequest, RowPage, SortDirection, SortSpec, TableMeta};
use crate::error::GatewayResult;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 200,
        }
    }
}

impl From<&GatewayConfig> for PageLimits {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

impl PageLimits {
    /// Fixed-size window, used by export to walk a table in large pages.
    pub fn fixed(page_size: u32) -> Self {
        Self {
            default_page_size: page_size,
            max_page_size: page_size,
        }
    }

    /// Clamps to `page >= 1` and `1 <= page_size <= max_page_size`.
    pub fn window(&self, request: &ListRowsRequest) -> (u32, u32) {
        let page = request.page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let max = self.max_page_size.max(1);
        let page_size = request
            .page_size
            .unwrap_or(i64::from(self.default_page_size))
            .clamp(1, i64::from(max));
        // both values were clamped into u32 range above
        (page as u32, page_size as u32)
    }
}

fn column_sql(meta: &TableMeta, column: &ColumnMeta) -> String {
    qualified_column_name(&meta.schema, &meta.table, &column.name)
}

/// `WHERE a LIKE ? OR b LIKE ?` over text-family columns, or nothing when
/// there is no search term or nothing to search.
fn search_clause(meta: &TableMeta, q: &str) -> (String, Vec<Value>) {
    if q.is_empty() {
        return (String::new(), Vec::new());
    }
    let searchable: Vec<&ColumnMeta> = meta.columns.iter().filter(|c| c.is_searchable()).collect();
    if searchable.is_empty() {
        return (String::new(), Vec::new());
    }

    let pattern = Value::from(format!("%{}%", q));
    let predicates = searchable
        .iter()
        .map(|c| format!("{} LIKE ?", column_sql(meta, c)))
        .collect::<Vec<String>>()
        .join(" OR ");
    let params = vec![pattern; searchable.len()];
    (format!(" WHERE {}", predicates), params)
}

/// Sort is honored only for an exact column name match.
fn resolve_sort<'a>(
    meta: &'a TableMeta,
    sort_by: Option<&str>,
    sort_dir: Option<&str>,
) -> Option<(&'a ColumnMeta, SortDirection)> {
    let column = meta.column(sort_by?)?;
    Some((column, SortDirection::parse(sort_dir)))
}

pub async fn list_rows<E>(
    executor: &mut E,
    table: &TableRef,
    request: &ListRowsRequest,
    limits: &PageLimits,
) -> GatewayResult<RowPage>
where
    E: GatewayExecutor + ?Sized,
{
    let meta = describe_table(executor, table).await?;
    let (page, page_size) = limits.window(request);
    let q = request.q.as_deref().map(str::trim).unwrap_or("").to_string();
    let qualified = table.qualified();

    let (where_sql, where_params) = search_clause(&meta, &q);

    let count = Statement::with_params(
        format!("SELECT COUNT(*) AS cnt FROM {}{}", qualified, where_sql),
        where_params.clone(),
    );
    let total = executor
        .fetch_optional(&count)
        .await?
        .and_then(|row| record_u64(&row, "cnt"))
        .unwrap_or(0);

    let sort = resolve_sort(&meta, request.sort_by.as_deref(), request.sort_dir.as_deref());
    let order_sql = match &sort {
        Some((column, dir)) => format!(" ORDER BY {} {}", column_sql(&meta, column), dir.as_sql()),
        None => String::new(),
    };

    let select_list = meta
        .columns
        .iter()
        .map(|c| column_sql(&meta, c))
        .collect::<Vec<String>>()
        .join(", ");
    let offset = u64::from(page - 1) * u64::from(page_size);
    let mut params = where_params;
    params.push(Value::from(page_size));
    params.push(Value::from(offset));
    let select = Statement::with_params(
        format!(
            "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
            select_list, qualified, where_sql, order_sql
        ),
        params,
    );

    log::debug!(
        "Listing {} page {} size {} (search: {})",
        table,
        page,
        page_size,
        !where_sql.is_empty()
    );
    let rows = executor.fetch_all(&select).await?;

    let sort = match sort {
        Some((column, dir)) => SortSpec {
            by: Some(column.name.clone()),
            dir: Some(dir),
        },
        None => SortSpec::default(),
    };

    Ok(RowPage {
        columns: meta.column_names(),
        schema: meta.schema,
        table: meta.table,
        rows,
        page,
        page_size,
        total,
        sort,
        q,
    })
}

#[cfg(test)]
mod tests;
