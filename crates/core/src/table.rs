//! Raw tabular input as handed over by an upload collaborator.
//!
//! Cells are kept as JSON values so both CSV text (all strings) and JSON
//! uploads (typed numbers and booleans) fit the same shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One raw row, keyed by column name.
pub type RawRow = Map<String, Value>;

/// Ordered rows with named columns, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column names in their original order.
    pub columns: Vec<String>,
    /// Rows in input order. Missing keys read as empty cells.
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Build a table from a header line and positional rows.
    ///
    /// Short rows are padded with nulls; extra cells beyond the header are
    /// dropped.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|cells| {
                let mut cells = cells.into_iter();
                columns
                    .iter()
                    .map(|name| (name.clone(), cells.next().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a table from keyed records. Columns are collected in the order
    /// they are first seen.
    pub fn from_records(records: Vec<RawRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self {
            columns,
            rows: records,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Return the first column from `candidates` present in this table.
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.has_column(c))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a cell as trimmed text. Nulls and missing keys read as `None`;
/// numbers and booleans are rendered with their JSON spelling.
pub fn cell_text(row: &RawRow, column: &str) -> Option<String> {
    let text = match row.get(column)? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_rows_pads_short_rows() {
        let table = RawTable::from_rows(
            vec!["id".into(), "department".into()],
            vec![vec![json!("U1")]],
        );
        assert_eq!(table.rows[0]["id"], json!("U1"));
        assert_eq!(table.rows[0]["department"], Value::Null);
    }

    #[test]
    fn from_records_collects_columns_in_first_seen_order() {
        let a: RawRow = serde_json::from_value(json!({"id": "U1"})).unwrap();
        let b: RawRow = serde_json::from_value(json!({"id": "U2", "mfa_enabled": true})).unwrap();
        let table = RawTable::from_records(vec![a, b]);
        assert_eq!(table.columns, vec!["id", "mfa_enabled"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn first_present_respects_candidate_order() {
        let table = RawTable::from_rows(vec!["user_id".into(), "Device_ID".into()], vec![]);
        assert_eq!(table.first_present(&["id", "Device_ID", "user_id"]), Some("Device_ID"));
        assert_eq!(table.first_present(&["id"]), None);
    }

    #[test]
    fn cell_text_normalizes_values() {
        let row: RawRow =
            serde_json::from_value(json!({"a": "  x ", "b": "", "c": null, "d": 42, "e": true}))
                .unwrap();
        assert_eq!(cell_text(&row, "a").as_deref(), Some("x"));
        assert_eq!(cell_text(&row, "b"), None);
        assert_eq!(cell_text(&row, "c"), None);
        assert_eq!(cell_text(&row, "d").as_deref(), Some("42"));
        assert_eq!(cell_text(&row, "e").as_deref(), Some("true"));
        assert_eq!(cell_text(&row, "missing"), None);
    }
}
