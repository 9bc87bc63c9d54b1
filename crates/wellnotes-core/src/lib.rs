pub mod comment;
pub mod config;
pub mod locator;
pub mod schema;

pub use comment::{CommentFields, PLACEHOLDER, strip_day_prefixes};
pub use config::{CommentsConfig, ConfigError, WellnotesConfig};
pub use locator::resolve_path;
pub use schema::comment_log;
