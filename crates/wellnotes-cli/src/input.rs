//! Reading caller tables from disk: JSON edit forms and Parquet result sets.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{ArrayRef, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Value};

/// Parse a JSON array of flat objects into a batch of Utf8 columns.
///
/// Columns appear in first-seen order. Missing keys and `null` become nulls;
/// numbers and booleans are kept as their JSON text.
pub fn rows_from_json(text: &str) -> anyhow::Result<RecordBatch> {
    let rows: Vec<Map<String, Value>> =
        serde_json::from_str(text).context("expected a JSON array of objects")?;

    let mut names: Vec<String> = Vec::new();
    for row in &rows {
        for name in row.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len());
    for name in &names {
        let values = rows
            .iter()
            .map(|row| match row.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
                Some(other) => bail!("column {name}: nested value {other} not supported"),
            })
            .collect::<anyhow::Result<Vec<Option<String>>>>()?;
        columns.push(Arc::new(StringArray::from(values)));
    }

    let fields: Vec<Field> = names
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Read a JSON edits file.
pub fn read_json(path: &Path) -> anyhow::Result<RecordBatch> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    rows_from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Read a Parquet file into a single batch.
pub fn read_table(path: &Path) -> anyhow::Result<RecordBatch> {
    let batches = wellnotes_store::read_parquet(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let Some(first) = batches.first() else {
        bail!("{} holds no record batches", path.display());
    };
    Ok(concat_batches(&first.schema(), &batches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};

    #[test]
    fn json_rows_become_utf8_columns() {
        let batch = rows_from_json(
            r#"[
                {"__deposit": "A", "__well_num": 101, "comment": "leak"},
                {"__deposit": "A", "__well_num": 102, "comment_plan_event": "workover"}
            ]"#,
        )
        .unwrap();
        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec!["__deposit", "__well_num", "comment", "comment_plan_event"]
        );

        let wells = batch.column(1).as_string::<i32>();
        assert_eq!(wells.value(1), "102");
        let comment = batch.column(2).as_string::<i32>();
        assert!(comment.is_null(1));
    }

    #[test]
    fn nested_values_are_rejected() {
        let result = rows_from_json(r#"[{"comment": ["a", "b"]}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(rows_from_json(r#"{"comment": "x"}"#).is_err());
    }
}
