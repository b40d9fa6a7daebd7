//! Flat delimited export of violation lists.

use crate::rules::Violation;

/// Header of the violation report, in column order.
pub const REPORT_COLUMNS: &[&str] = &["recordId", "department", "kind", "severity", "ageDays"];

/// Render violations as CSV: a header line, then one line per violation in
/// the given order.
pub fn export_csv(violations: &[Violation]) -> String {
    let mut lines = Vec::with_capacity(violations.len() + 1);
    lines.push(REPORT_COLUMNS.join(","));

    for v in violations {
        lines.push(
            [
                csv_escape(&v.record_id),
                csv_escape(&v.department),
                v.kind.as_str().to_string(),
                v.severity.to_string(),
                v.age_days.to_string(),
            ]
            .join(","),
        );
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

/// Escape a value for CSV: wrap in quotes if it contains comma, quote, or newline.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
