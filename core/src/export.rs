//! Column projection for the export layer.
//!
//! Maps report groups onto a header row plus string cells, using a dot-path
//! per column into the serialised group (`metrics.accused`, `key.0`,
//! `offender.fir_ids`). Writing CSV or spreadsheet bytes is the export
//! layer's job; this stops at cells.

use crate::{
    error::ReportResult,
    grouping_engine::Dimension,
    report::{ReportGroup, ReportKind},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub header: String,
    pub path: String,
}

impl Column {
    pub fn new(header: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Project groups through `columns`. A path that does not resolve yields an
/// empty cell rather than an error.
pub fn project(groups: &[ReportGroup], columns: &[Column]) -> ReportResult<Table> {
    let mut rows = Vec::with_capacity(groups.len());
    for group in groups {
        let value = serde_json::to_value(group)?;
        rows.push(
            columns
                .iter()
                .map(|c| lookup(&value, &c.path).map(render).unwrap_or_default())
                .collect(),
        );
    }
    Ok(Table {
        headers: columns.iter().map(|c| c.header.clone()).collect(),
        rows,
    })
}

/// Follow a dot-path through objects (by name) and arrays (by index).
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|seg| !seg.is_empty())
        .try_fold(value, |current, seg| match current {
            Value::Object(map) => map.get(seg),
            Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn dimension_header(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::District => "District",
        Dimension::Thana => "Thana",
        Dimension::Month => "Month",
        Dimension::Day => "Date",
        Dimension::CaseStatus => "Case Status",
    }
}

/// Stock column set for each report kind.
pub fn default_columns(kind: &ReportKind) -> Vec<Column> {
    let mut columns = vec![Column::new("Rank", "rank")];
    match kind {
        ReportKind::CustodyStatus => {
            columns.push(Column::new("Status", "key.0"));
            columns.push(Column::new("Accused", "metrics.accused"));
            columns.push(Column::new("Persons", "metrics.persons"));
            columns.push(Column::new("FIRs", "metrics.incidents"));
        }
        ReportKind::RepeatOffender => {
            columns.push(Column::new("Name", "offender.display_name"));
            columns.push(Column::new("Identity", "offender.fingerprint"));
            columns.push(Column::new("Cases", "metrics.accused"));
            columns.push(Column::new("FIR Ids", "offender.fir_ids"));
            columns.push(Column::new("Districts", "offender.districts"));
            columns.push(Column::new("Latest Status", "offender.latest_status"));
        }
        _ => {
            let dimensions = kind.dimensions().unwrap_or_default();
            for (i, dimension) in dimensions.iter().enumerate() {
                columns.push(Column::new(dimension_header(*dimension), format!("key.{i}")));
            }
            columns.push(Column::new("FIRs", "metrics.incidents"));
            columns.push(Column::new("Accused", "metrics.accused"));
            columns.push(Column::new("Arrested", "metrics.arrested"));
            columns.push(Column::new("Bailed", "metrics.bailed"));
            columns.push(Column::new("Absconding", "metrics.absconding"));
            columns.push(Column::new("Unknown", "metrics.unknown"));
            columns.push(Column::new("Surety Amount", "metrics.surety_amount"));
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_objects_and_array_indices() {
        let v = json!({"key": ["Central", "Kotwali"], "metrics": {"accused": 4}});
        assert_eq!(lookup(&v, "key.1"), Some(&json!("Kotwali")));
        assert_eq!(lookup(&v, "metrics.accused"), Some(&json!(4)));
        assert_eq!(lookup(&v, "metrics.missing"), None);
        assert_eq!(lookup(&v, "key.9"), None);
    }

    #[test]
    fn arrays_render_comma_joined_and_null_renders_empty() {
        assert_eq!(render(&json!([3, 7])), "3, 7");
        assert_eq!(render(&Value::Null), "");
    }
}
