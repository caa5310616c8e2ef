// =====================================================
// CSV CODEC
// Quote-aware CSV decoding and encoding for bulk transfer
// =====================================================

use crate::error::{GatewayError, GatewayResult};

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn delimiter_byte(delimiter: &str) -> GatewayResult<u8> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(c as u8),
        _ => Err(GatewayError::invalid_input(format!(
            "CSV delimiter must be a single ASCII character, got {:?}",
            delimiter
        ))),
    }
}

/// Rewrites `\r\n` record terminators to `\n`. Quoted content and a lone
/// `\r` are left untouched.
fn unify_line_endings(text: &str, delimiter: u8) -> String {
    let delimiter = char::from(delimiter);
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_quotes = false;
    let mut field_start = true;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    out.push_str("\"\"");
                    continue;
                }
                in_quotes = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
                out.push(c);
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                field_start = true;
                out.push(c);
            }
            _ if c == delimiter => {
                field_start = true;
                out.push(c);
            }
            _ => {
                field_start = false;
                out.push(c);
            }
        }
    }
    out
}

/// First non-blank record is the header. Records end at `\r\n` or `\n`.
/// Records holding a single empty field are dropped, ragged records are kept
/// as they are.
pub fn decode(text: &str, delimiter: &str) -> GatewayResult<CsvTable> {
    let delimiter = delimiter_byte(delimiter)?;
    let text = unify_line_endings(text.strip_prefix(BOM).unwrap_or(text), delimiter);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            GatewayError::invalid_input(format!("Failed to read CSV record {}: {}", line + 1, e))
        })?;
        if record.len() == 1 && record.get(0) == Some("") {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    let mut records = records.into_iter();
    let header = records.next().unwrap_or_default();
    Ok(CsvTable {
        header,
        rows: records.collect(),
    })
}

pub fn encode(header: &[String], rows: &[Vec<String>], delimiter: &str) -> GatewayResult<String> {
    let delimiter = delimiter_byte(delimiter)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(header.iter())
        .map_err(|e| GatewayError::invalid_input(format!("Failed to write CSV headers: {}", e)))?;
    for row in rows {
        writer
            .write_record(row.iter())
            .map_err(|e| GatewayError::invalid_input(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        GatewayError::ExecutionFailed(format!("Failed to flush CSV writer: {}", e))
    })?;
    String::from_utf8(bytes)
        .map_err(|e| GatewayError::ExecutionFailed(format!("CSV output is not UTF-8: {}", e)))
}
