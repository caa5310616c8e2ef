// =====================================================
// COMMON GATEWAY TYPES AND STRUCTURES
// =====================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row as an ordered column -> value object.
pub type Record = Map<String, Value>;

// --- Connection Profile ---
/// Resolved connection settings, read per call and never persisted here.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    pub id: String,
    pub owner_id: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl std::fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

// --- Caller Identity ---
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub user_id: String,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

// --- Column Metadata ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMeta {
    pub name: String,
    /// Catalog DATA_TYPE, e.g. `tinyint`.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Catalog COLUMN_TYPE, e.g. `tinyint(1) unsigned`.
    pub column_type: String,
    pub is_nullable: bool,
    pub is_primary: bool,
    pub default: Option<String>,
    pub extra: String,
}

const SEARCHABLE_TYPES: &[&str] = &["char", "varchar", "text", "tinytext", "mediumtext", "longtext"];

impl ColumnMeta {
    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }

    /// Columns the engine fills itself: auto_increment and generated columns.
    /// `DEFAULT_GENERATED` only marks an expression default and stays writable.
    pub fn is_auto_generated(&self) -> bool {
        let extra = self.extra.to_ascii_lowercase();
        extra.contains("auto_increment")
            || extra.contains("virtual generated")
            || extra.contains("stored generated")
    }

    pub fn is_searchable(&self) -> bool {
        SEARCHABLE_TYPES.contains(&self.data_type.to_ascii_lowercase().as_str())
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.data_type.to_ascii_lowercase().as_str(),
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint"
        )
    }

    pub fn is_string_key(&self) -> bool {
        matches!(self.data_type.to_ascii_lowercase().as_str(), "char" | "varchar")
    }
}

// --- Table Metadata ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableMeta {
    pub schema: String,
    pub table: String,
    /// Primary key columns in declaration order, possibly empty.
    pub primary_key: Vec<String>,
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

// --- Row Browsing ---
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` in any case selects descending; any other text means ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort actually applied to a page; both fields are null when unsorted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub by: Option<String>,
    pub dir: Option<SortDirection>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListRowsRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_dir: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RowPage {
    pub schema: String,
    pub table: String,
    /// Column names in ordinal order.
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub sort: SortSpec,
    pub q: String,
}

// --- Schema Details ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub index_name: String,
    pub seq: u32,
    pub column_name: String,
    pub is_unique: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyColumn {
    pub constraint_name: String,
    pub column_name: String,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_column: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnMeta>,
    pub indexes: Vec<IndexColumn>,
    pub foreign_keys: Vec<ForeignKeyColumn>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub schema: String,
    pub name: String,
    /// Approximate count from the catalog; engines may not report one.
    pub rows: Option<u64>,
}

// --- Mutation Results ---
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub insert_id: Option<u64>,
    pub affected: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    pub affected: u64,
}

/// Primary key column -> value, identifying exactly one row.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct PrimaryKeyValue(pub Record);

impl PrimaryKeyValue {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }
}

impl From<Record> for PrimaryKeyValue {
    fn from(map: Record) -> Self {
        PrimaryKeyValue(map)
    }
}

// --- Bulk Transfer ---
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferFormat {
    #[default]
    Csv,
    Json,
}

impl TransferFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            TransferFormat::Csv => "text/csv; charset=utf-8",
            TransferFormat::Json => "application/json; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TransferFormat::Csv => "csv",
            TransferFormat::Json => "json",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub format: TransferFormat,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_dir: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub content_type: String,
    pub filename: String,
    pub body: String,
    pub row_count: usize,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_empty_as_null() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default)]
    pub format: TransferFormat,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_empty_as_null")]
    pub empty_as_null: bool,
    pub contents: String,
}

impl ImportRequest {
    pub fn csv(contents: impl Into<String>) -> Self {
        Self {
            format: TransferFormat::Csv,
            delimiter: default_delimiter(),
            empty_as_null: default_empty_as_null(),
            contents: contents.into(),
        }
    }

    pub fn json(contents: impl Into<String>) -> Self {
        Self {
            format: TransferFormat::Json,
            ..Self::csv(contents)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImportFailure {
    pub index: usize,
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub failed: usize,
    pub errors: Vec<ImportFailure>,
}

// --- Ad-hoc Query ---
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRows {
    pub rows: Vec<Record>,
    /// Row cap appended to the statement, absent when it already had a LIMIT.
    pub applied_limit: Option<u64>,
}
