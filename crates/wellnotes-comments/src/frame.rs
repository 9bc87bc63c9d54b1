//! Column-oriented helpers over Arrow RecordBatches: key validation, left
//! join, and equality filtering on entity keys.
//!
//! Key columns are compared as UTF-8 after a cast, so a `well` column typed
//! Int64 on one side matches the Utf8 column of the log on the other.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, BooleanArray, Scalar, StringArray, UInt32Array};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{and, cast, filter_record_batch, take};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};

/// Column names of `batch`, in order.
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

/// Names in `required` that `batch` does not have.
pub fn missing_columns(batch: &RecordBatch, required: &[String]) -> Vec<String> {
    let schema = batch.schema();
    required
        .iter()
        .filter(|c| schema.index_of(c).is_err())
        .cloned()
        .collect()
}

/// A named column cast to Utf8.
pub fn utf8_column(batch: &RecordBatch, name: &str) -> Result<StringArray, ArrowError> {
    let idx = batch.schema().index_of(name)?;
    let col = cast(batch.column(idx), &DataType::Utf8)?;
    Ok(col.as_string::<i32>().clone())
}

fn key_columns(batch: &RecordBatch, on: &[String]) -> Result<Vec<ArrayRef>, ArrowError> {
    on.iter()
        .map(|name| {
            let idx = batch.schema().index_of(name)?;
            cast(batch.column(idx), &DataType::Utf8)
        })
        .collect()
}

/// Left join `right` onto `left` by equality of the `on` columns.
///
/// Every left row appears at least once, in input order; a left row matching
/// several right rows is repeated once per match. The result holds all left
/// columns followed by the right's non-key columns, with nulls where nothing
/// matched. A right column whose name is already taken gets `suffix`
/// appended. Null keys match null keys.
pub fn left_join(
    left: &RecordBatch,
    right: &RecordBatch,
    on: &[String],
    suffix: &str,
) -> Result<RecordBatch, ArrowError> {
    let converter = RowConverter::new(vec![SortField::new(DataType::Utf8); on.len()])?;
    let left_keys = converter.convert_columns(&key_columns(left, on)?)?;
    let right_keys = converter.convert_columns(&key_columns(right, on)?)?;

    let mut index: HashMap<_, Vec<u32>> = HashMap::new();
    for (i, row) in right_keys.iter().enumerate() {
        index.entry(row).or_default().push(i as u32);
    }

    let mut left_take = Vec::with_capacity(left.num_rows());
    let mut right_take: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
    for (i, row) in left_keys.iter().enumerate() {
        match index.get(&row) {
            Some(matches) => {
                for &j in matches {
                    left_take.push(i as u32);
                    right_take.push(Some(j));
                }
            }
            None => {
                left_take.push(i as u32);
                right_take.push(None);
            }
        }
    }
    let left_take = UInt32Array::from(left_take);
    let right_take = UInt32Array::from(right_take);

    let left_schema = left.schema();
    let mut fields: Vec<Field> = left_schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    let mut columns: Vec<ArrayRef> = left
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &left_take, None))
        .collect::<Result<_, _>>()?;

    for (field, col) in right.schema().fields().iter().zip(right.columns()) {
        if on.iter().any(|k| k == field.name()) {
            continue;
        }
        let name = if left_schema.index_of(field.name()).is_ok() {
            format!("{}{suffix}", field.name())
        } else {
            field.name().to_string()
        };
        fields.push(Field::new(name, field.data_type().clone(), true));
        columns.push(take(col.as_ref(), &right_take, None)?);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

/// Rows of `batch` whose `columns` equal `values` pairwise.
pub fn filter_eq(
    batch: &RecordBatch,
    columns: &[String],
    values: &[&str],
) -> Result<RecordBatch, ArrowError> {
    if columns.len() != values.len() {
        return Err(ArrowError::InvalidArgumentError(format!(
            "{} columns but {} values",
            columns.len(),
            values.len()
        )));
    }

    let mut mask = BooleanArray::from(vec![true; batch.num_rows()]);
    for (col, value) in key_columns(batch, columns)?.iter().zip(values) {
        let rhs = Scalar::new(StringArray::from(vec![*value]));
        mask = and(&mask, &eq(col, &rhs)?)?;
    }
    filter_record_batch(batch, &mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array};

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn wells() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("__deposit", DataType::Utf8, false),
            Field::new("__well_num", DataType::Int64, false),
            Field::new("debit", DataType::Int64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A", "A", "B"])),
                Arc::new(Int64Array::from(vec![1, 2, 1])),
                Arc::new(Int64Array::from(vec![40, 55, 12])),
            ],
        )
        .unwrap()
    }

    fn notes() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("__deposit", DataType::Utf8, true),
            Field::new("__well_num", DataType::Utf8, true),
            Field::new("comment", DataType::Utf8, true),
            Field::new("debit", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(StringArray::from(vec!["1", "1"])),
                Arc::new(StringArray::from(vec!["16.10.26: leak", "17.10.26: scale"])),
                Arc::new(StringArray::from(vec!["x", "y"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn missing_columns_reported() {
        let missing = missing_columns(&wells(), &keys(&["__deposit", "__pad_num"]));
        assert_eq!(missing, vec!["__pad_num"]);
    }

    #[test]
    fn left_join_keeps_every_left_row() {
        let joined =
            left_join(&wells(), &notes(), &keys(&["__deposit", "__well_num"]), "_snapshot")
                .unwrap();
        assert_eq!(joined.num_rows(), 3);
        let names = column_names(&joined);
        assert_eq!(
            names,
            vec!["__deposit", "__well_num", "debit", "comment", "debit_snapshot"]
        );

        let comment = utf8_column(&joined, "comment").unwrap();
        assert_eq!(comment.value(0), "16.10.26: leak");
        assert!(comment.is_null(1));
        assert_eq!(comment.value(2), "17.10.26: scale");
    }

    #[test]
    fn left_join_repeats_on_multiple_matches() {
        let right = arrow::compute::concat_batches(&notes().schema(), &[notes(), notes()]).unwrap();
        let joined =
            left_join(&wells(), &right, &keys(&["__deposit", "__well_num"]), "_r").unwrap();
        // A/1 and B/1 match twice each, A/2 once with nulls.
        assert_eq!(joined.num_rows(), 5);
    }

    #[test]
    fn left_join_missing_key_errors() {
        let result = left_join(&wells(), &notes(), &keys(&["__pad_num"]), "_r");
        assert!(result.is_err());
    }

    #[test]
    fn filter_by_entity() {
        let only = filter_eq(&wells(), &keys(&["__deposit", "__well_num"]), &["A", "2"]).unwrap();
        assert_eq!(only.num_rows(), 1);
        let debit = only
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(debit.value(0), 55);
    }

    #[test]
    fn filter_arity_mismatch_errors() {
        let result = filter_eq(&wells(), &keys(&["__deposit"]), &["A", "1"]);
        assert!(matches!(result, Err(ArrowError::InvalidArgumentError(_))));
    }
}
