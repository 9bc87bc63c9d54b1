//! Comment store: reconciles edited annotation rows against the canonical log.
//!
//! The log is append-only. A store loads a snapshot of the latest annotation
//! per entity once, at construction, and never refreshes it; build a new
//! store to see rows saved since.
//!
//! Saving is idempotent with respect to the snapshot: a candidate row whose
//! keys and comment content already appear in it is skipped, whatever its
//! time or author. There is no locking. Two stores racing to save the same
//! new text before either sees the other's write can both append it.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use tracing::{Level, debug, error, info};
use wellnotes_core::comment_log::{self, COMMENT, COMMENT_COMPLETED_EVENT, COMMENT_PLAN_EVENT};
use wellnotes_core::{CommentFields, CommentsConfig, resolve_path};
use wellnotes_store::{QueryError, TabularQueryService, WriteMode};

use crate::frame;
use crate::query;
use crate::{MergeError, SaveError};

const WRITE_FORMAT: &str = "parquet";

/// Suffix for snapshot columns whose name is already used by the merged table.
const SNAPSHOT_SUFFIX: &str = "_snapshot";

/// Outcome of [`CommentStore::save`].
#[derive(Debug)]
pub struct SaveReceipt {
    /// Rows appended to the log.
    pub appended: usize,
    /// The service's acknowledgement. `None` when there was nothing to write.
    pub ack: Option<RecordBatch>,
}

type EntityKey = Vec<Option<String>>;

/// A new row that survived normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Candidate {
    keys: EntityKey,
    content: CommentFields,
}

pub struct CommentStore<'a, S: TabularQueryService + ?Sized> {
    service: &'a S,
    source: String,
    keys: Vec<String>,
    salt: i64,
    path: String,
    snapshot: Option<RecordBatch>,
}

impl<'a, S: TabularQueryService + ?Sized> CommentStore<'a, S> {
    /// Load the comment snapshot for the log named by `source`.
    ///
    /// An empty `keys` means the whole dataset is one entity keyed by the
    /// synthetic `__deposit` column. A failed load is logged and leaves the
    /// snapshot empty; it never fails construction.
    pub fn new(service: &'a S, source: impl Into<String>, keys: Vec<String>, salt: i64) -> Self {
        let source = source.into();
        let keys = if keys.is_empty() {
            vec![comment_log::DEFAULT_KEY.to_string()]
        } else {
            keys
        };
        let path = resolve_path(&source).to_string();

        let snapshot = service
            .scan(&path, &comment_log::schema(&keys))
            .and_then(|scan| service.execute(&query::snapshot_sql(&scan, &keys, salt)));
        let snapshot = match snapshot {
            Ok(batch) => {
                info!(path = %path, rows = batch.num_rows(), "loaded comment snapshot");
                log_table("comment snapshot", &batch);
                Some(batch)
            }
            Err(err) => {
                error!(path = %path, error = %err, "failed to read comment snapshot");
                None
            }
        };

        Self {
            service,
            source,
            keys,
            salt,
            path,
            snapshot,
        }
    }

    /// Build a store from the `comments` section of the configuration.
    pub fn from_config(service: &'a S, config: &CommentsConfig) -> Self {
        Self::new(service, config.source.clone(), config.keys.clone(), config.salt)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn salt(&self) -> i64 {
        self.salt
    }

    /// Storage path of the log, used for both reads and appends.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The snapshot loaded at construction, `None` if that load failed.
    pub fn snapshot(&self) -> Option<&RecordBatch> {
        self.snapshot.as_ref()
    }

    /// Left-join `rows` onto the snapshot by the entity keys.
    pub fn merge(&self, rows: &RecordBatch) -> Result<RecordBatch, MergeError> {
        let missing = frame::missing_columns(rows, &self.keys);
        if !missing.is_empty() {
            return Err(MergeError::MissingColumns {
                keys: self.keys.clone(),
                columns: frame::column_names(rows),
                missing,
            });
        }
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or(MergeError::SnapshotUnavailable)?;

        frame::left_join(rows, snapshot, &self.keys, SNAPSHOT_SUFFIX).map_err(|e| {
            error!(error = %e, "comment merge failed");
            MergeError::Join(e)
        })
    }

    /// [`merge`](Self::merge), falling back to `rows` unchanged on error.
    ///
    /// For display paths where a table without comments beats no table.
    pub fn merge_or_passthrough(&self, rows: &RecordBatch) -> RecordBatch {
        match self.merge(rows) {
            Ok(merged) => merged,
            Err(err) => {
                error!(error = %err, "showing table without comments");
                rows.clone()
            }
        }
    }

    /// Every raw annotation row in the log, oldest first, with a readable `time`.
    pub fn list_all(&self) -> Result<RecordBatch, QueryError> {
        let scan = self
            .service
            .scan(&self.path, &comment_log::schema(&self.keys))?;
        self.service
            .execute(&query::history_sql(&scan, &self.keys, self.salt))
    }

    /// Rows of `table` belonging to one entity, `values` given in key order.
    pub fn filter_entity(
        &self,
        table: &RecordBatch,
        values: &[&str],
    ) -> Result<RecordBatch, MergeError> {
        let missing = frame::missing_columns(table, &self.keys);
        if !missing.is_empty() {
            return Err(MergeError::MissingColumns {
                keys: self.keys.clone(),
                columns: frame::column_names(table),
                missing,
            });
        }
        if values.len() != self.keys.len() {
            return Err(MergeError::KeyArity {
                expected: self.keys.len(),
                got: values.len(),
            });
        }
        Ok(frame::filter_eq(table, &self.keys, values)?)
    }

    /// Append the new content in `new_rows` to the log.
    ///
    /// Rows with no comment content, and rows whose keys and content already
    /// appear in the snapshot, are skipped. Survivors are stamped with the
    /// current time, `source`, and `user`, and written in one append.
    pub fn save(
        &self,
        new_rows: &RecordBatch,
        source: &str,
        user: &str,
    ) -> Result<SaveReceipt, SaveError> {
        let missing = frame::missing_columns(new_rows, &self.keys);
        if !missing.is_empty() {
            let err = SaveError::MissingColumns {
                keys: self.keys.clone(),
                columns: frame::column_names(new_rows),
                missing,
            };
            error!(error = %err, "rejecting comments");
            return Err(err);
        }

        let candidates = self.candidates(new_rows).map_err(SaveError::Input)?;
        let pending = self.unseen(candidates)?;

        if pending.is_empty() {
            info!(path = %self.path, "no new comments to save");
            return Ok(SaveReceipt {
                appended: 0,
                ack: None,
            });
        }

        let now = chrono::Utc::now().timestamp();
        let batch = self
            .to_log_rows(&pending, now, source, user)
            .map_err(SaveError::Build)?;
        log_table("comments to append", &batch);

        let ack = self
            .service
            .write(&batch, &self.path, WRITE_FORMAT, WriteMode::Append)
            .map_err(|e| {
                error!(path = %self.path, error = %e, "cannot save comments");
                SaveError::Write(e)
            })?;

        info!(path = %self.path, rows = pending.len(), user, source, "comments appended");
        Ok(SaveReceipt {
            appended: pending.len(),
            ack: Some(ack),
        })
    }

    /// Normalised candidates from `rows`; rows without content are dropped.
    ///
    /// Content is held in canonical form (day prefixes stripped), which is
    /// both what gets compared against history and what gets stored.
    fn candidates(&self, rows: &RecordBatch) -> Result<Vec<Candidate>, ArrowError> {
        let keys = self.key_arrays(rows)?;
        let comment = optional_column(rows, COMMENT)?;
        let plan = optional_column(rows, COMMENT_PLAN_EVENT)?;
        let completed = optional_column(rows, COMMENT_COMPLETED_EVENT)?;

        let mut out = Vec::with_capacity(rows.num_rows());
        for i in 0..rows.num_rows() {
            let content = CommentFields::from_raw(
                value(&comment, i),
                value(&plan, i),
                value(&completed, i),
            )
            .canonical();
            if content.is_empty() {
                continue;
            }
            out.push(Candidate {
                keys: entity_key(&keys, i),
                content,
            });
        }
        debug!(
            rows = rows.num_rows(),
            candidates = out.len(),
            "normalised new comments"
        );
        Ok(out)
    }

    /// Candidates not already present in the snapshot, first occurrence kept.
    fn unseen(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>, SaveError> {
        let snapshot = self.snapshot.as_ref().ok_or_else(|| {
            error!(path = %self.path, "comment snapshot missing, refusing to save");
            SaveError::SnapshotUnavailable
        })?;
        let mut seen = self.history(snapshot).map_err(SaveError::Dedup)?;

        let before = candidates.len();
        let pending: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();
        debug!(
            skipped = before - pending.len(),
            pending = pending.len(),
            "compared with snapshot"
        );
        Ok(pending)
    }

    /// Keys and canonical content of every snapshot row.
    fn history(&self, snapshot: &RecordBatch) -> Result<HashSet<Candidate>, ArrowError> {
        let keys = self.key_arrays(snapshot)?;
        let comment = frame::utf8_column(snapshot, COMMENT)?;
        let plan = frame::utf8_column(snapshot, COMMENT_PLAN_EVENT)?;
        let completed = frame::utf8_column(snapshot, COMMENT_COMPLETED_EVENT)?;

        Ok((0..snapshot.num_rows())
            .map(|i| Candidate {
                keys: entity_key(&keys, i),
                content: CommentFields::from_raw(
                    utf8_value(&comment, i),
                    utf8_value(&plan, i),
                    utf8_value(&completed, i),
                )
                .canonical(),
            })
            .collect())
    }

    fn key_arrays(&self, batch: &RecordBatch) -> Result<Vec<StringArray>, ArrowError> {
        self.keys
            .iter()
            .map(|k| frame::utf8_column(batch, k))
            .collect()
    }

    fn to_log_rows(
        &self,
        rows: &[Candidate],
        time: i64,
        source: &str,
        user: &str,
    ) -> Result<RecordBatch, ArrowError> {
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.keys.len() + 6);
        for k in 0..self.keys.len() {
            let values: StringArray = rows.iter().map(|r| r.keys[k].as_deref()).collect();
            columns.push(Arc::new(values));
        }
        for field in 0..3 {
            let values: StringArray = rows
                .iter()
                .map(|r| Some(r.content.stored()[field]))
                .collect();
            columns.push(Arc::new(values));
        }
        columns.push(Arc::new(Int64Array::from(vec![time; rows.len()])));
        columns.push(Arc::new(StringArray::from(vec![source; rows.len()])));
        columns.push(Arc::new(StringArray::from(vec![user; rows.len()])));

        RecordBatch::try_new(Arc::new(comment_log::schema(&self.keys)), columns)
    }
}

fn optional_column(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>, ArrowError> {
    if batch.schema().index_of(name).is_err() {
        return Ok(None);
    }
    frame::utf8_column(batch, name).map(Some)
}

fn value(col: &Option<StringArray>, i: usize) -> Option<&str> {
    col.as_ref().and_then(|c| utf8_value(c, i))
}

fn utf8_value(col: &StringArray, i: usize) -> Option<&str> {
    if col.is_null(i) { None } else { Some(col.value(i)) }
}

fn entity_key(keys: &[StringArray], i: usize) -> EntityKey {
    keys.iter()
        .map(|k| utf8_value(k, i).map(str::to_string))
        .collect()
}

fn log_table(what: &str, batch: &RecordBatch) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    match pretty_format_batches(std::slice::from_ref(batch)) {
        Ok(table) => debug!("{what}:\n{table}"),
        Err(e) => debug!(error = %e, "cannot render {what}"),
    }
}
