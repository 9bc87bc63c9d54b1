//! Comment reconciliation: merge annotations into result tables and append
//! new ones to the canonical log without duplicating existing content.

mod error;
pub use error::{MergeError, SaveError};

pub mod frame;
pub mod query;

mod store;
pub use store::{CommentStore, SaveReceipt};
