//! Comment content carried by every annotation row.
//!
//! The log stores three free-text fields per row. A field the editor left
//! untouched is written as the placeholder `"-"`; in memory it is `None`.
//! Reads decorate each value with a `DD.MM.YY: ` day prefix, which
//! [`strip_day_prefixes`] removes again before anything is written back.

use std::sync::LazyLock;

use regex::Regex;

/// Sentinel stored in a comment column that carries no value.
pub const PLACEHOLDER: &str = "-";

/// `DD.MM.YY: ` as prepended to comment text by the snapshot query.
static DAY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}\.\d{2}\.\d{2}:\s").expect("day prefix regex is valid"));

/// The three editable comment fields of one annotation row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommentFields {
    pub comment: Option<String>,
    pub plan_event: Option<String>,
    pub completed_event: Option<String>,
}

impl CommentFields {
    /// Build from raw column values, mapping placeholders and empty strings to `None`.
    pub fn from_raw(
        comment: Option<&str>,
        plan_event: Option<&str>,
        completed_event: Option<&str>,
    ) -> Self {
        Self {
            comment: present(comment),
            plan_event: present(plan_event),
            completed_event: present(completed_event),
        }
    }

    /// True when no field carries a value. Such rows are never persisted.
    pub fn is_empty(&self) -> bool {
        self.comment.is_none() && self.plan_event.is_none() && self.completed_event.is_none()
    }

    /// Content with read-side day prefixes removed, used for equality against history.
    pub fn canonical(&self) -> Self {
        let strip = |v: &Option<String>| present(v.as_deref().map(strip_day_prefixes).as_deref());
        Self {
            comment: strip(&self.comment),
            plan_event: strip(&self.plan_event),
            completed_event: strip(&self.completed_event),
        }
    }

    /// Values as written to storage, with `None` rendered as the placeholder.
    pub fn stored(&self) -> [&str; 3] {
        [
            self.comment.as_deref().unwrap_or(PLACEHOLDER),
            self.plan_event.as_deref().unwrap_or(PLACEHOLDER),
            self.completed_event.as_deref().unwrap_or(PLACEHOLDER),
        ]
    }
}

fn present(value: Option<&str>) -> Option<String> {
    match value {
        None | Some("") | Some(PLACEHOLDER) => None,
        Some(v) => Some(v.to_string()),
    }
}

/// Remove every `DD.MM.YY: ` day prefix from `s`.
///
/// Forward-filled values can pick up several stamps
/// (`"01.01.23: 02.01.23: hello"`), so all occurrences go, not only the first.
pub fn strip_day_prefixes(s: &str) -> String {
    DAY_PREFIX.replace_all(s, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_prefix() {
        assert_eq!(strip_day_prefixes("16.10.26: leak"), "leak");
    }

    #[test]
    fn strips_every_prefix() {
        assert_eq!(strip_day_prefixes("01.01.23: 02.01.23: hello"), "hello");
        assert_eq!(
            strip_day_prefixes("01.01.23: pump 02.01.23: replaced"),
            "pump replaced"
        );
    }

    #[test]
    fn leaves_other_dates_alone() {
        assert_eq!(strip_day_prefixes("due 01.01.2023"), "due 01.01.2023");
        assert_eq!(strip_day_prefixes("1.01.23: x"), "1.01.23: x");
        assert_eq!(strip_day_prefixes("01.01.23:x"), "01.01.23:x");
    }

    #[test]
    fn keeps_non_ascii_text() {
        assert_eq!(
            strip_day_prefixes("05.03.24: Замена ЭЦН"),
            "Замена ЭЦН"
        );
    }

    #[test]
    fn placeholder_and_empty_are_absent() {
        let c = CommentFields::from_raw(Some("-"), Some(""), None);
        assert!(c.is_empty());
    }

    #[test]
    fn one_value_is_enough() {
        let c = CommentFields::from_raw(Some("-"), Some("workover"), Some("-"));
        assert!(!c.is_empty());
        assert_eq!(c.stored(), ["-", "workover", "-"]);
    }

    #[test]
    fn canonical_drops_prefixes() {
        let displayed = CommentFields::from_raw(Some("16.10.26: leak"), None, None);
        let raw = CommentFields::from_raw(Some("leak"), Some("-"), Some(""));
        assert_eq!(displayed.canonical(), raw.canonical());
    }
}
