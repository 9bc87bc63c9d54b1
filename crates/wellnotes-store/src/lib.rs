//! Storage layer: the tabular query service seam, DuckDB execution, Parquet log files.

mod error;
pub use error::QueryError;

pub mod files;
pub use files::read_parquet;

mod service;
pub mod sql;
pub use service::{TabularQueryService, WriteMode};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckService;
