//! Locator strings name where the comment log lives.
//!
//! A locator is either a bare path (`data/comments`) or a source expression
//! carrying a `path=<value>` token (`parquet path=data/comments`), where the
//! value runs to the next whitespace or the end of the string.

use std::sync::LazyLock;

use regex::Regex;

static PATH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"path=(\S*)").expect("path token regex is valid"));

/// Extract the storage path from a locator string.
///
/// Reads and appends both resolve through this function so they always agree.
pub fn resolve_path(locator: &str) -> &str {
    PATH_TOKEN
        .captures(locator)
        .and_then(|c| c.get(1))
        .map_or(locator, |m| m.as_str())
}
