// =====================================================
// VALUE NORMALIZATION
// Column-type-aware coercion of text input into bindable values
// =====================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::LazyLock;

static CANONICAL_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static CANONICAL_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").unwrap());
static CANONICAL_DATETIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d{1,6})?$").unwrap());
static SHORT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").unwrap());

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// What an empty input string turns into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyPolicy {
    #[default]
    Null,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Decimal,
    Json,
    Date,
    Time,
    DateTime,
    Text,
}

/// Classifies a COLUMN_TYPE such as `tinyint(1) unsigned` or `decimal(10,2)`.
/// Boolean shapes win over the integer family.
pub fn classify(column_type: &str) -> ValueKind {
    let lowered = column_type.trim().to_ascii_lowercase();
    let (base, args) = match lowered.split_once('(') {
        Some((base, rest)) => (
            base.trim().to_string(),
            rest.split(')').next().map(|a| a.trim().to_string()),
        ),
        None => (
            lowered.split_whitespace().next().unwrap_or("").to_string(),
            None,
        ),
    };

    match (base.as_str(), args.as_deref()) {
        ("bool" | "boolean", _) => ValueKind::Boolean,
        ("tinyint", Some("1")) => ValueKind::Boolean,
        ("bit", None | Some("1")) => ValueKind::Boolean,
        ("tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint", _) => {
            ValueKind::Integer
        }
        ("decimal" | "numeric" | "dec" | "fixed" | "float" | "double" | "real", _) => {
            ValueKind::Decimal
        }
        ("json", _) => ValueKind::Json,
        ("date", _) => ValueKind::Date,
        ("time", _) => ValueKind::Time,
        ("datetime" | "timestamp", _) => ValueKind::DateTime,
        _ => ValueKind::Text,
    }
}

/// Empty or absent input becomes null. Never fails: unparseable text is
/// returned as a string for the engine to judge.
pub fn normalize_value(raw: Option<&str>, column_type: &str) -> Value {
    normalize_value_with(raw, column_type, EmptyPolicy::Null)
}

pub fn normalize_value_with(raw: Option<&str>, column_type: &str, policy: EmptyPolicy) -> Value {
    let raw = match raw {
        None => return Value::Null,
        Some("") => {
            return match policy {
                EmptyPolicy::Null => Value::Null,
                EmptyPolicy::Keep => Value::String(String::new()),
            }
        }
        Some(raw) => raw,
    };

    match classify(column_type) {
        ValueKind::Boolean => Value::from(parse_boolean(raw)),
        ValueKind::Integer => parse_integer(raw).unwrap_or_else(|| passthrough(raw)),
        ValueKind::Decimal => parse_decimal(raw).unwrap_or_else(|| passthrough(raw)),
        ValueKind::Json => serde_json::from_str::<Value>(raw).unwrap_or_else(|_| passthrough(raw)),
        kind @ (ValueKind::Date | ValueKind::Time | ValueKind::DateTime) => {
            Value::String(normalize_temporal(raw, kind))
        }
        ValueKind::Text => passthrough(raw),
    }
}

/// JSON import values go through the same rules as text cells. Explicit
/// nulls stay null so the caller can leave the column out.
pub fn coerce_import_value(value: &Value, column_type: &str, policy: EmptyPolicy) -> Value {
    let kind = classify(column_type);
    match value {
        Value::Null => Value::Null,
        Value::String(text) => normalize_value_with(Some(text.as_str()), column_type, policy),
        Value::Bool(flag) => match kind {
            ValueKind::Boolean | ValueKind::Integer | ValueKind::Decimal => {
                Value::from(i64::from(*flag))
            }
            _ => normalize_value_with(Some(flag.to_string().as_str()), column_type, policy),
        },
        Value::Number(number) => {
            normalize_value_with(Some(number.to_string().as_str()), column_type, policy)
        }
        Value::Object(_) | Value::Array(_) => match kind {
            ValueKind::Json => value.clone(),
            _ => Value::String(value.to_string()),
        },
    }
}

fn passthrough(raw: &str) -> Value {
    Value::String(raw.to_string())
}

/// `1/true/yes/on` and `0/false/no/off`, else any finite non-zero number.
pub fn parse_boolean(raw: &str) -> i64 {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "1" | "true" | "yes" | "on" => 1,
        "0" | "false" | "no" | "off" => 0,
        other => match other.parse::<f64>() {
            Ok(n) if n.is_finite() && n != 0.0 => 1,
            _ => 0,
        },
    }
}

fn parse_integer(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Value::from(n));
    }
    trimmed.parse::<u64>().ok().map(Value::from)
}

fn parse_decimal(raw: &str) -> Option<Value> {
    let n = raw.trim().parse::<f64>().ok()?;
    if !n.is_finite() {
        return None;
    }
    Number::from_f64(n).map(Value::Number)
}

fn normalize_temporal(raw: &str, kind: ValueKind) -> String {
    let canonical = match kind {
        ValueKind::Date => CANONICAL_DATE_RE.is_match(raw),
        ValueKind::Time => CANONICAL_TIME_RE.is_match(raw),
        _ => CANONICAL_DATETIME_RE.is_match(raw),
    };
    if canonical {
        return raw.to_string();
    }

    let trimmed = raw.trim();
    if kind == ValueKind::Time && SHORT_TIME_RE.is_match(trimmed) {
        if let Some(time) = parse_short_time(trimmed) {
            return time.format("%H:%M:%S").to_string();
        }
    }

    match parse_timestamp(trimmed) {
        Some(ts) => match kind {
            ValueKind::Date => ts.format("%Y-%m-%d").to_string(),
            ValueKind::Time => ts.format("%H:%M:%S").to_string(),
            _ => format_datetime(&ts),
        },
        None => raw.to_string(),
    }
}

/// `YYYY-MM-DD HH:MM:SS`, with microseconds only when present.
pub fn format_datetime(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() != 0 {
        ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn parse_short_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Zoned inputs are converted to UTC, naive inputs are taken as written.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.with_timezone(&Utc).naive_utc());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|zoned| zoned.with_timezone(&Utc).naive_utc())
}
