//! Chart projections of a query result.
//!
//! Drawing is left to the caller; this module only decides what would be
//! plotted: the first column as label, the first column whose first-row
//! value is a number as value, at most [`CHART_ROW_LIMIT`] rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sql::QueryResult;

/// Maximum number of rows plotted.
pub const CHART_ROW_LIMIT: usize = 20;

/// How a result is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Table,
    Bar,
    Line,
    Pie,
}

impl ViewMode {
    #[must_use]
    pub const fn is_chart(self) -> bool {
        !matches!(self, Self::Table)
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            _ => Err(format!("unknown view: {s}")),
        }
    }
}

/// One plotted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// Column plotted as value: the first whose first-row cell is a number.
#[must_use]
pub fn value_column(result: &QueryResult) -> Option<&str> {
    let first = result.rows.first()?;
    result
        .columns
        .iter()
        .find(|col| first.get(col.as_str()).is_some_and(Value::is_number))
        .map(String::as_str)
}

/// Returns `true` if any chart view can be shown for `result`.
#[must_use]
pub fn charts_available(result: &QueryResult) -> bool {
    value_column(result).is_some()
}

/// Project `result` into chart points. Empty when charts are unavailable.
#[must_use]
pub fn chart_points(result: &QueryResult) -> Vec<ChartPoint> {
    let (Some(label), Some(value)) = (result.columns.first(), value_column(result)) else {
        return Vec::new();
    };

    result
        .rows
        .iter()
        .take(CHART_ROW_LIMIT)
        .map(|row| ChartPoint {
            name: label_text(row.get(label.as_str())),
            value: numeric_value(row.get(value)),
        })
        .collect()
}

/// String form of a cell as shown on a chart axis.
fn label_text(cell: Option<&Value>) -> String {
    match cell {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => label_text(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Numeric coercion; anything that is not a finite number becomes 0.
fn numeric_value(cell: Option<&Value>) -> f64 {
    let n = match cell {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(0.0)
            }
        }
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
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
            row_count: 0,
            execution_time: 0.0,
        }
    }

    #[test]
    fn test_first_numeric_column_is_value() {
        let r = result(
            &["region", "label", "users", "views"],
            vec![json!({"region": "Souss", "label": "x", "users": 12, "views": 400})],
        );
        assert_eq!(value_column(&r), Some("users"));
        assert_eq!(
            chart_points(&r),
            vec![ChartPoint {
                name: "Souss".to_string(),
                value: 12.0
            }]
        );
    }

    #[test]
    fn test_no_numeric_column_disables_charts() {
        let r = result(&["name"], vec![json!({"name": "a"}), json!({"name": "b"})]);
        assert!(!charts_available(&r));
        assert!(chart_points(&r).is_empty());
    }

    #[test]
    fn test_numeric_detection_uses_first_row_only() {
        let r = result(
            &["day", "count"],
            vec![json!({"day": "mon", "count": "7"}), json!({"day": "tue", "count": 3})],
        );
        assert!(!charts_available(&r));
    }

    #[test]
    fn test_at_most_twenty_rows() {
        let rows = (0..45).map(|i| json!({"id": i, "n": i * 2})).collect();
        let r = result(&["id", "n"], rows);
        let points = chart_points(&r);
        assert_eq!(points.len(), CHART_ROW_LIMIT);
        assert_eq!(points[19].name, "19");
        // The first numeric column is the label column itself.
        assert!((points[19].value - 19.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_later_rows_are_coerced() {
        let r = result(
            &["k", "v"],
            vec![
                json!({"k": "a", "v": 1.5}),
                json!({"k": null, "v": "2.5"}),
                json!({"k": true, "v": "oops"}),
                json!({"v": true}),
            ],
        );
        let points = chart_points(&r);
        let names: Vec<_> = points.iter().map(|p| p.name.as_str()).collect();
        let values: Vec<_> = points.iter().map(|p| p.value).collect();
        assert_eq!(names, ["a", "null", "true", "undefined"]);
        assert_eq!(values, [1.5, 2.5, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_result() {
        let r = result(&["a"], vec![]);
        assert!(chart_points(&r).is_empty());
        assert!(ViewMode::Pie.is_chart());
        assert!(!ViewMode::Table.is_chart());
        assert_eq!("bar".parse::<ViewMode>().unwrap(), ViewMode::Bar);
    }
}
