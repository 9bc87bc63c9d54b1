//! DuckDB-backed tabular query service.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use duckdb::Connection;
use tracing::{debug, info};

use crate::files;
use crate::sql;
use crate::{QueryError, TabularQueryService, WriteMode};

const PARQUET_FORMAT: &str = "parquet";

/// Tabular query service over a DuckDB connection.
///
/// Queries are plain DuckDB SQL; logs are read with `read_parquet` and
/// written as Parquet part directories (see [`files`]).
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for a database that survives across process restarts.
pub struct DuckService {
    conn: Connection,
}

impl DuckService {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, QueryError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, QueryError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Access the underlying DuckDB connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TabularQueryService for DuckService {
    fn execute(&self, query: &str) -> Result<RecordBatch, QueryError> {
        let mut stmt = self.conn.prepare(query)?;
        let arrow = stmt.query_arrow([])?;
        let schema = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();
        let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);
        let result = concat_batches(&schema, &batches)?;
        debug!(rows = result.num_rows(), "query executed");
        Ok(result)
    }

    fn scan(&self, path: &str, schema: &Schema) -> Result<String, QueryError> {
        let p = Path::new(path);
        if !files::has_parquet(p) {
            debug!(path, "no parquet parts, scanning empty log");
            return sql::empty_relation(schema);
        }
        let target = if p.is_file() {
            path.to_string()
        } else {
            format!("{}/*.parquet", path.trim_end_matches('/'))
        };
        Ok(format!(
            "read_parquet({}, union_by_name = true) AS log",
            sql::literal(&target)
        ))
    }

    fn write(
        &self,
        table: &RecordBatch,
        path: &str,
        format: &str,
        mode: WriteMode,
    ) -> Result<RecordBatch, QueryError> {
        if !format.eq_ignore_ascii_case(PARQUET_FORMAT) {
            return Err(QueryError::UnsupportedFormat(format.to_string()));
        }
        let dir = Path::new(path);
        if mode == WriteMode::Overwrite {
            let removed = files::clear_parts(dir)?;
            debug!(path, removed, "cleared log before overwrite");
        }

        let part = files::write_part(dir, table)?;
        info!(path, rows = table.num_rows(), %mode, "rows written");
        acknowledgement(table.num_rows(), &part.display().to_string())
    }
}

fn acknowledgement(rows: usize, file: &str) -> Result<RecordBatch, QueryError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("rows_written", DataType::Int64, false),
        Field::new("file", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![rows as i64])),
            Arc::new(StringArray::from(vec![file])),
        ],
    )?;
    Ok(batch)
}
