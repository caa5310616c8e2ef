// =====================================================
// SQL UTILITIES MODULE
// Quoting and SQL text helpers shared by the statement builders
// =====================================================

use serde_json::Value;

/// Callers pass names that already passed identifier validation; quoting
/// still doubles embedded backticks.
pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn qualified_table_name(schema: &str, table: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier_mysql(schema),
        quote_identifier_mysql(table)
    )
}

pub fn qualified_column_name(schema: &str, table: &str, column: &str) -> String {
    format!(
        "{}.{}",
        qualified_table_name(schema, table),
        quote_identifier_mysql(column)
    )
}

/// `?, ?, ?` for `count` bound parameters.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub fn value_to_csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(v) => {
            if *v {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        Value::Number(num) => num.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Drops trailing whitespace and any run of trailing semicolons.
pub fn strip_trailing_terminators(statement: &str) -> &str {
    let mut current = statement.trim_end();
    while let Some(stripped) = current.strip_suffix(';') {
        current = stripped.trim_end();
    }
    current
}
