use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use crate::QueryError;

/// How [`TabularQueryService::write`] treats data already at the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Overwrite,
}

impl WriteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteMode::Append => "append",
            WriteMode::Overwrite => "overwrite",
        }
    }
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response access to the analytical store.
///
/// Each call blocks until the backend answers. Timeouts and cancellation are
/// the implementation's business; callers only see the resulting error.
pub trait TabularQueryService {
    /// Run a query and return its result as one batch.
    fn execute(&self, query: &str) -> Result<RecordBatch, QueryError>;

    /// SQL `FROM` item, aliased `log`, reading the table stored at `path`.
    ///
    /// Only the service knows where its storage lives, so it decides what a
    /// path resolves to. A path holding no data yet must scan as an empty
    /// relation with the columns of `schema`, not fail.
    fn scan(&self, path: &str, schema: &Schema) -> Result<String, QueryError>;

    /// Persist `table` at `path` in the given serialisation `format`.
    ///
    /// Returns the backend's acknowledgement.
    fn write(
        &self,
        table: &RecordBatch,
        path: &str,
        format: &str,
        mode: WriteMode,
    ) -> Result<RecordBatch, QueryError>;
}

impl<T: TabularQueryService + ?Sized> TabularQueryService for &T {
    fn execute(&self, query: &str) -> Result<RecordBatch, QueryError> {
        (**self).execute(query)
    }

    fn scan(&self, path: &str, schema: &Schema) -> Result<String, QueryError> {
        (**self).scan(path, schema)
    }

    fn write(
        &self,
        table: &RecordBatch,
        path: &str,
        format: &str,
        mode: WriteMode,
    ) -> Result<RecordBatch, QueryError> {
        (**self).write(table, path, format, mode)
    }
}
