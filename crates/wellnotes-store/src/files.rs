//! Parquet part files backing append-only logs.
//!
//! A log is a directory of `part-*.parquet` files. Appending writes one new
//! part; nothing already on disk is rewritten.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::debug;

use crate::QueryError;

const PART_PREFIX: &str = "part-";
const PARQUET_EXT: &str = "parquet";

static PART_SEQ: AtomicU64 = AtomicU64::new(0);

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> QueryError + '_ {
    move |source| QueryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, QueryError> {
    let file = File::open(path).map_err(io_err(path))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// True when `path` is a Parquet file or a directory holding at least one part.
pub fn has_parquet(path: &Path) -> bool {
    if path.is_file() {
        return is_parquet(path);
    }
    list_parts(path).map(|p| !p.is_empty()).unwrap_or(false)
}

/// Part files under `dir`, sorted by name (and so by write order).
///
/// A missing directory has no parts.
pub fn list_parts(dir: &Path) -> Result<Vec<PathBuf>, QueryError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_file() && is_parquet(&path) {
            parts.push(path);
        }
    }
    parts.sort();
    Ok(parts)
}

/// Write `batch` as a new part under `dir`, creating the directory if needed.
pub fn write_part(dir: &Path, batch: &RecordBatch) -> Result<PathBuf, QueryError> {
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = PART_SEQ.fetch_add(1, Ordering::Relaxed);
    let name = format!(
        "{PART_PREFIX}{nanos:020}-{}-{seq:04}.{PARQUET_EXT}",
        std::process::id()
    );
    let path = dir.join(name);

    let file = File::create(&path).map_err(io_err(&path))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;

    debug!(path = %path.display(), rows = batch.num_rows(), "wrote parquet part");
    Ok(path)
}

/// Delete every part under `dir`.
pub fn clear_parts(dir: &Path) -> Result<usize, QueryError> {
    let parts = list_parts(dir)?;
    for part in &parts {
        std::fs::remove_file(part).map_err(io_err(part))?;
    }
    Ok(parts.len())
}

fn is_parquet(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PARQUET_EXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn batch(n: i64) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("well", DataType::Utf8, false),
            Field::new("_time", DataType::Int64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![format!("w{n}")])),
                Arc::new(Int64Array::from(vec![n])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn missing_dir_has_no_parts() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("absent");
        assert!(list_parts(&dir).unwrap().is_empty());
        assert!(!has_parquet(&dir));
    }

    #[test]
    fn parts_accumulate_in_order() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("log");
        let first = write_part(&dir, &batch(1)).unwrap();
        let second = write_part(&dir, &batch(2)).unwrap();
        assert_eq!(list_parts(&dir).unwrap(), vec![first, second.clone()]);
        assert!(has_parquet(&dir));
        assert!(has_parquet(&second));

        let back = read_parquet(&second).unwrap();
        assert_eq!(back[0].num_rows(), 1);
        let t = back[0]
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(t.value(0), 2);
    }

    #[test]
    fn clear_removes_only_parts() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        write_part(dir, &batch(1)).unwrap();
        std::fs::write(dir.join("README"), "keep").unwrap();
        assert_eq!(clear_parts(dir).unwrap(), 1);
        assert!(dir.join("README").exists());
        assert!(!has_parquet(dir));
    }

    #[test]
    fn read_missing_file_errors() {
        let result = read_parquet(Path::new("/nonexistent/file.parquet"));
        assert!(matches!(result, Err(QueryError::Io { .. })));
    }
}
