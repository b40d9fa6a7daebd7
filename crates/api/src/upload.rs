//! CSV upload parsing.
//!
//! Reads an uploaded CSV document into a [`RawTable`]. Handles quoted
//! fields, doubled quotes inside quotes, embedded newlines, and CRLF line
//! endings. Every cell is kept as a string; typing happens in the core
//! normalizer.

use compliance_core::table::RawTable;
use serde_json::Value;

use crate::error::AppError;

/// Parse a CSV document whose first line is the header.
pub fn parse_csv(text: &str) -> Result<RawTable, AppError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = split_records(text)?.into_iter();

    let header = lines
        .next()
        .ok_or_else(|| AppError::BadRequest("CSV upload is empty".to_string()))?;
    let columns: Vec<String> = header.into_iter().map(|c| c.trim().to_string()).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(AppError::BadRequest("CSV header row is empty".to_string()));
    }

    let rows = lines
        .filter(|fields| !(fields.len() == 1 && fields[0].is_empty()))
        .map(|fields| fields.into_iter().map(Value::String).collect())
        .collect();

    Ok(RawTable::from_rows(columns, rows))
}

/// Split CSV text into records of fields.
fn split_records(text: &str) -> Result<Vec<Vec<String>>, AppError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(AppError::BadRequest(
            "CSV upload has an unterminated quoted field".to_string(),
        ));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    Ok(records)
}
