// =====================================================
// IDENTIFIER VALIDATION
// Allowlist for schema, table and column names that end up in SQL text
// =====================================================

use crate::db::sql_utils::{qualified_column_name, qualified_table_name, quote_identifier_mysql};
use crate::error::{GatewayError, GatewayResult};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-$]+$").expect("valid identifier regex"));

/// A name proven to match `[A-Za-z0-9_-$]+`. The only way caller text
/// reaches a statement structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(raw: &str) -> GatewayResult<Self> {
        if is_valid_identifier(raw) {
            Ok(Identifier(raw.to_string()))
        } else {
            Err(GatewayError::InvalidIdentifier(format!(
                "'{}' is not a valid identifier",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        quote_identifier_mysql(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_valid_identifier(raw: &str) -> bool {
    IDENTIFIER_RE.is_match(raw)
}

/// Validates every name up front so one bad name aborts before any SQL exists.
pub fn parse_all<'a, I>(names: I) -> GatewayResult<Vec<Identifier>>
where
    I: IntoIterator<Item = &'a String>,
{
    names.into_iter().map(|name| Identifier::parse(name)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Identifier,
    pub table: Identifier,
}

impl TableRef {
    /// Parses `schema.table`; exactly one dot, both parts valid identifiers.
    pub fn parse(table_id: &str) -> GatewayResult<Self> {
        let (schema, table) = table_id.split_once('.').ok_or_else(|| {
            GatewayError::InvalidIdentifier(format!(
                "'{}' must have the form schema.table",
                table_id
            ))
        })?;
        if table.contains('.') {
            return Err(GatewayError::InvalidIdentifier(format!(
                "'{}' must have the form schema.table",
                table_id
            )));
        }
        Ok(TableRef {
            schema: Identifier::parse(schema)?,
            table: Identifier::parse(table)?,
        })
    }

    pub fn qualified(&self) -> String {
        qualified_table_name(self.schema.as_str(), self.table.as_str())
    }

    pub fn column(&self, column: &Identifier) -> String {
        qualified_column_name(self.schema.as_str(), self.table.as_str(), column.as_str())
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}
