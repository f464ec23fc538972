//! CSV and JSON export of an in-memory result.
//!
//! Both serialize the rows already held by the console; nothing is
//! re-queried, so repeated exports of the same result are byte-identical.

use serde_json::Value;

use super::sql::QueryResult;

const CSV_NEWLINE: &str = "\r\n";

/// Render `result` as CSV: a header line, then one line per row.
///
/// Lines are separated by CRLF with no trailing newline. Cells containing a
/// comma, quote, line break, or leading/trailing space are quoted, with
/// embedded quotes doubled.
#[must_use]
pub fn to_csv(result: &QueryResult) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);
    lines.push(
        result
            .columns
            .iter()
            .map(|c| escape_cell(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in &result.rows {
        lines.push(
            result
                .columns
                .iter()
                .map(|c| escape_cell(&cell_text(row.get(c.as_str()))))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join(CSV_NEWLINE)
}

/// Render the rows of `result` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(result: &QueryResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&result.rows)
}

fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_cell(text: &str) -> String {
    let needs_quotes = text.contains([',', '"', '\r', '\n'])
        || text.starts_with(' ')
        || text.ends_with(' ');
    if needs_quotes {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::console::sql::Row;

    fn result(columns: &[&str], rows: Vec<Value>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: rows
                .into_iter()
                .map(|r| serde_json::from_value::<Row>(r).unwrap())
                .collect(),
            row_count: 1,
            execution_time: 3.0,
        }
    }

    #[test]
    fn test_csv_header_and_row() {
        let r = result(&["id", "name"], vec![json!({"id": 1, "name": "a"})]);
        assert_eq!(to_csv(&r), "id,name\r\n1,a");
    }

    #[test]
    fn test_csv_is_idempotent() {
        let r = result(&["id", "name"], vec![json!({"id": 1, "name": "a"})]);
        let first = to_csv(&r);
        for _ in 0..5 {
            assert_eq!(to_csv(&r), first);
        }
        assert_eq!(first.split(CSV_NEWLINE).count(), 2);
    }

    #[test]
    fn test_csv_quoting() {
        let r = result(
            &["text", "note"],
            vec![json!({"text": "say \"hi\", then\nleave", "note": " padded"})],
        );
        assert_eq!(
            to_csv(&r),
            "text,note\r\n\"say \"\"hi\"\", then\nleave\",\" padded\""
        );
    }

    #[test]
    fn test_csv_missing_null_and_nested() {
        let r = result(
            &["a", "b", "c", "d"],
            vec![json!({"a": null, "c": true, "d": {"k": [1, 2]}})],
        );
        assert_eq!(to_csv(&r), "a,b,c,d\r\n,,true,\"{\"\"k\"\":[1,2]}\"");
    }

    #[test]
    fn test_csv_column_order_follows_columns() {
        let r = result(&["z", "a"], vec![json!({"a": 1, "z": 2})]);
        assert_eq!(to_csv(&r), "z,a\r\n2,1");
    }

    #[test]
    fn test_json_export_is_rows_only() {
        let r = result(&["id"], vec![json!({"id": 1})]);
        let json = to_json(&r).unwrap();
        assert_eq!(json, "[\n  {\n    \"id\": 1\n  }\n]");
    }
}
