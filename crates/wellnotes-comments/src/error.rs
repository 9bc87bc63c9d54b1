use arrow::error::ArrowError;
use thiserror::Error;
use wellnotes_store::QueryError;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("not enough columns to join: missing {missing:?}, join keys {keys:?}, table columns {columns:?}")]
    MissingColumns {
        keys: Vec<String>,
        columns: Vec<String>,
        missing: Vec<String>,
    },

    #[error("comment snapshot was not loaded")]
    SnapshotUnavailable,

    #[error("expected {expected} key values, got {got}")]
    KeyArity { expected: usize, got: usize },

    #[error("join failed: {0}")]
    Join(#[from] ArrowError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("not enough required columns: missing {missing:?}, required {keys:?}, table columns {columns:?}")]
    MissingColumns {
        keys: Vec<String>,
        columns: Vec<String>,
        missing: Vec<String>,
    },

    #[error("comment snapshot was not loaded; cannot compare against history")]
    SnapshotUnavailable,

    #[error("cannot read new comment rows: {0}")]
    Input(#[source] ArrowError),

    #[error("cannot compare new comments with history: {0}")]
    Dedup(#[source] ArrowError),

    #[error("cannot build rows to append: {0}")]
    Build(#[source] ArrowError),

    #[error("cannot save comments: {0}")]
    Write(#[from] QueryError),
}
