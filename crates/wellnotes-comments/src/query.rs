//! DuckDB SQL for reading the comment log.
//!
//! Two reads exist: the snapshot (latest forward-filled state per entity,
//! comment text decorated with its day) and the raw history. Both select
//! from `scan`, the `FROM` item the service hands out for the log.

use wellnotes_core::comment_log::{COMMENT_COLUMNS, SERVICE_COLUMNS, TIME};
use wellnotes_core::PLACEHOLDER;
use wellnotes_store::sql::{ident, literal};

fn day_expr(fmt: &str) -> String {
    format!("strftime(epoch_ms({} * 1000), {})", ident(TIME), literal(fmt))
}

fn list(items: impl IntoIterator<Item = String>) -> String {
    items.into_iter().collect::<Vec<_>>().join(", ")
}

/// Aggregation producing the comment snapshot.
///
/// Per row: tag with `salt`, derive the `DD.MM.YY` day, null out
/// placeholders and prefix real text with its day. Rows are grouped by an
/// md5 of the key values, comment fields are forward-filled within each
/// group in time order, only each group's latest timestamp survives, and
/// the survivors fold to one row per (`_time`, group) with a `count` and
/// the minimum of every other column.
pub fn snapshot_sql(scan: &str, keys: &[String], salt: i64) -> String {
    let t = ident(TIME);
    let keys_q: Vec<String> = keys.iter().map(|k| ident(k)).collect();
    let comments_q: Vec<String> = COMMENT_COLUMNS.iter().map(|c| ident(c)).collect();
    let service_q = format!("{t}, {}, {}", ident(SERVICE_COLUMNS[1]), ident(SERVICE_COLUMNS[2]));

    let key_list = keys_q.join(", ");
    let group_expr = format!(
        "md5(concat_ws('|', {}))",
        list(keys_q.iter().map(|k| format!("CAST({k} AS VARCHAR)")))
    );
    let marked = list(comments_q.iter().map(|c| {
        format!(
            "CASE WHEN {c} = {} THEN NULL ELSE \"day\" || ': ' || {c} END AS {c}",
            literal(PLACEHOLDER)
        )
    }));
    let filled = list(
        comments_q
            .iter()
            .map(|c| format!("last_value({c} IGNORE NULLS) OVER w AS {c}")),
    );
    let folded = list(
        keys_q
            .iter()
            .chain(comments_q.iter())
            .cloned()
            .chain([
                ident(SERVICE_COLUMNS[1]),
                ident(SERVICE_COLUMNS[2]),
                ident("salt"),
                ident("day"),
            ])
            .map(|c| format!("min({c}) AS {c}")),
    );

    format!(
        "WITH tagged AS (
    SELECT {key_list}, {comments}, {service_q},
           {salt}::BIGINT AS \"salt\",
           {day} AS \"day\"
    FROM {scan}
),
marked AS (
    SELECT {key_list}, {marked}, {service_q}, \"salt\", \"day\",
           {group_expr} AS filldown_group
    FROM tagged
),
filled AS (
    SELECT {key_list}, {filled}, {service_q}, \"salt\", \"day\", filldown_group
    FROM marked
    WINDOW w AS (PARTITION BY filldown_group ORDER BY {t} ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)
),
latest AS (
    SELECT * FROM filled
    QUALIFY {t} = max({t}) OVER (PARTITION BY filldown_group)
)
SELECT {t}, filldown_group, count(*) AS \"count\", {folded}
FROM latest
GROUP BY {t}, filldown_group
ORDER BY {t}, filldown_group",
        comments = comments_q.join(", "),
        day = day_expr("%d.%m.%y"),
    )
}

/// Every raw row of the log with a readable `time`, oldest first.
pub fn history_sql(scan: &str, keys: &[String], salt: i64) -> String {
    let columns = list(
        keys.iter()
            .map(|k| ident(k))
            .chain(COMMENT_COLUMNS.iter().map(|c| ident(c)))
            .chain(SERVICE_COLUMNS.iter().map(|c| ident(c))),
    );
    format!(
        "SELECT {columns}, {salt}::BIGINT AS \"salt\", {time} AS \"time\"
FROM {scan}
ORDER BY {t}",
        time = day_expr("%Y-%m-%d %H:%M"),
        t = ident(TIME),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: &str = "read_parquet('/warehouse/comments/*.parquet') AS log";

    fn keys() -> Vec<String> {
        vec!["__deposit".to_string(), "__well_num".to_string()]
    }

    #[test]
    fn snapshot_groups_by_key_hash_and_salt() {
        let sql = snapshot_sql(SCAN, &keys(), 7);
        assert!(sql.contains(&format!("FROM {SCAN}")));
        assert!(sql.contains("7::BIGINT AS \"salt\""));
        assert!(sql.contains(
            "md5(concat_ws('|', CAST(\"__deposit\" AS VARCHAR), CAST(\"__well_num\" AS VARCHAR)))"
        ));
        assert!(sql.contains("last_value(\"comment_plan_event\" IGNORE NULLS) OVER w"));
        assert!(sql.contains("min(\"user\") AS \"user\""));
        assert!(sql.contains("'%d.%m.%y'"));
    }

    #[test]
    fn history_formats_time() {
        let sql = history_sql(SCAN, &keys(), 0);
        assert!(sql.contains(&format!("FROM {SCAN}")));
        assert!(sql.contains("'%Y-%m-%d %H:%M') AS \"time\""));
        assert!(sql.trim_end().ends_with("ORDER BY \"_time\""));
    }
}
