// =====================================================
// AD-HOC QUERY RUNNER
// Read-only SELECT/WITH statements with an enforced row cap
// =====================================================

use regex::Regex;
use std::sync::LazyLock;

use crate::db::executor::{GatewayExecutor, Statement};
use crate::db::sql_utils::strip_trailing_terminators;
use crate::db_types::QueryRows;
use crate::error::{GatewayError, GatewayResult};

static LIMIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\s+\d+").unwrap());

// INSERT() and REPLACE() are string functions; those statements already fail
// the leading SELECT/WITH check.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "UPDATE", "DELETE", "ALTER", "CREATE", "DROP", "TRUNCATE", "RENAME", "GRANT", "REVOKE",
    "CALL", "LOAD", "HANDLER", "LOCK", "UNLOCK", "OUTFILE", "DUMPFILE",
];

fn strip_leading_sql_comments(input: &str) -> &str {
    let mut s = input;
    loop {
        let trimmed = s.trim_start();
        if trimmed.starts_with("--") || trimmed.starts_with('#') {
            if let Some(pos) = trimmed.find('\n') {
                s = &trimmed[pos + 1..];
                continue;
            }
            return "";
        }
        if trimmed.starts_with("/*") {
            if let Some(pos) = trimmed.find("*/") {
                s = &trimmed[pos + 2..];
                continue;
            }
            return "";
        }
        return trimmed;
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Copy of `sql` with string literals, quoted identifiers and
/// comments blanked out. `/*! */` and `/*+ */` bodies are executed by
/// MySQL, so they stay visible.
fn mask_literals_and_comments(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut state = ScanState::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match state {
            ScanState::Code => match c {
                '\'' | '"' | '`' => {
                    state = ScanState::Quoted(c);
                    out.push(' ');
                }
                '#' => {
                    state = ScanState::LineComment;
                    out.push(' ');
                }
                '-' if next == Some('-')
                    && chars
                        .get(i + 2)
                        .map_or(true, |n| n.is_whitespace() || n.is_control()) =>
                {
                    state = ScanState::LineComment;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                '/' if next == Some('*') => {
                    if matches!(chars.get(i + 2).copied(), Some('!') | Some('+')) {
                        out.push_str("   ");
                        i += 3;
                        continue;
                    }
                    state = ScanState::BlockComment;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                _ => out.push(c),
            },
            ScanState::Quoted(quote) => {
                if c == '\\' && quote != '`' {
                    out.push(' ');
                    if next.is_some() {
                        out.push(' ');
                    }
                    i += 2;
                    continue;
                }
                if c == quote {
                    if next == Some(quote) {
                        out.push_str("  ");
                        i += 2;
                        continue;
                    }
                    state = ScanState::Code;
                }
                out.push(' ');
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Code;
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            ScanState::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = ScanState::Code;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                out.push(' ');
            }
        }
        i += 1;
    }
    out
}

fn leading_keyword(sql: &str) -> String {
    strip_leading_sql_comments(sql)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Returns the statement with trailing terminators removed, or the reason it
/// may not run.
pub fn validate_sql(sql: &str) -> GatewayResult<String> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::invalid_input("Query is empty"));
    }

    let head = leading_keyword(trimmed);
    if head != "SELECT" && head != "WITH" {
        return Err(GatewayError::rejected("Only SELECT/WITH queries are allowed"));
    }

    let single = strip_trailing_terminators(trimmed);
    let code = mask_literals_and_comments(single);
    if code.contains(';') {
        return Err(GatewayError::rejected("Multiple statements are not allowed"));
    }

    let forbidden = code
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|word| word.to_ascii_uppercase())
        .find(|word| FORBIDDEN_KEYWORDS.contains(&word.as_str()));
    if let Some(keyword) = forbidden {
        return Err(GatewayError::rejected(format!(
            "{} is not allowed in ad-hoc queries",
            keyword
        )));
    }

    Ok(single.to_string())
}

/// Appends `LIMIT <cap>` on its own line when the statement has none.
pub fn ensure_limit(sql: &str, row_cap: u64) -> (String, Option<u64>) {
    if LIMIT_REGEX.is_match(&mask_literals_and_comments(sql)) {
        (sql.to_string(), None)
    } else {
        (format!("{}\nLIMIT {}", sql, row_cap), Some(row_cap))
    }
}

pub async fn run_query<E>(executor: &mut E, sql: &str, row_cap: u64) -> GatewayResult<QueryRows>
where
    E: GatewayExecutor + ?Sized,
{
    let validated = validate_sql(sql)?;
    let (statement_sql, applied_limit) = ensure_limit(&validated, row_cap);
    let rows = executor.fetch_all(&Statement::new(statement_sql)).await?;
    log::debug!(
        "Ad-hoc query returned {} rows (cap {:?})",
        rows.len(),
        applied_limit
    );
    Ok(QueryRows {
        rows,
        applied_limit,
    })
}
