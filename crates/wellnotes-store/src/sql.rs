//! SQL text helpers shared by the service and the queries built on it.

use arrow::datatypes::{DataType, Schema};

use crate::QueryError;

/// Quote an SQL identifier.
pub fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote an SQL string literal.
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn sql_type(data_type: &DataType) -> Result<&'static str, QueryError> {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 => Ok("VARCHAR"),
        DataType::Int64 => Ok("BIGINT"),
        DataType::Int32 => Ok("INTEGER"),
        DataType::Float64 => Ok("DOUBLE"),
        DataType::Boolean => Ok("BOOLEAN"),
        other => Err(QueryError::Other(format!("no SQL type for {other}"))),
    }
}

/// A `FROM` item with the columns of `schema` and no rows.
pub fn empty_relation(schema: &Schema) -> Result<String, QueryError> {
    let columns = schema
        .fields()
        .iter()
        .map(|f| Ok(format!("NULL::{} AS {}", sql_type(f.data_type())?, ident(f.name()))))
        .collect::<Result<Vec<_>, QueryError>>()?;
    Ok(format!("(SELECT {} WHERE false) AS log", columns.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::Field;

    #[test]
    fn quoting() {
        assert_eq!(ident("user"), "\"user\"");
        assert_eq!(ident("we\"ll"), "\"we\"\"ll\"");
        assert_eq!(literal("o'clock"), "'o''clock'");
    }

    #[test]
    fn empty_relation_is_typed() {
        let schema = Schema::new(vec![
            Field::new("__deposit", DataType::Utf8, true),
            Field::new("_time", DataType::Int64, false),
        ]);
        assert_eq!(
            empty_relation(&schema).unwrap(),
            "(SELECT NULL::VARCHAR AS \"__deposit\", NULL::BIGINT AS \"_time\" WHERE false) AS log"
        );
    }

    #[test]
    fn unmapped_type_errors() {
        let schema = Schema::new(vec![Field::new("blob", DataType::Binary, true)]);
        assert!(matches!(empty_relation(&schema), Err(QueryError::Other(_))));
    }
}
