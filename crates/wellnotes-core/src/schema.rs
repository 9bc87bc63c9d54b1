/// Arrow schema definitions for the canonical comment log.
pub mod comment_log {
    use arrow::datatypes::{DataType, Field, Schema};

    pub const COMMENT: &str = "comment";
    pub const COMMENT_PLAN_EVENT: &str = "comment_plan_event";
    pub const COMMENT_COMPLETED_EVENT: &str = "comment_completed_event";

    pub const TIME: &str = "_time";
    pub const SOURCE: &str = "source";
    pub const USER: &str = "user";

    /// The three user-editable comment columns, in storage order.
    pub const COMMENT_COLUMNS: [&str; 3] = [COMMENT, COMMENT_PLAN_EVENT, COMMENT_COMPLETED_EVENT];

    /// Columns stamped on every appended row.
    pub const SERVICE_COLUMNS: [&str; 3] = [TIME, SOURCE, USER];

    /// Synthetic key used when the caller has no natural entity key.
    pub const DEFAULT_KEY: &str = "__deposit";

    /// Schema of rows appended to the log: `keys ++ comments ++ [_time, source, user]`.
    pub fn schema(keys: &[String]) -> Schema {
        let mut fields: Vec<Field> = keys
            .iter()
            .map(|k| Field::new(k, DataType::Utf8, true))
            .collect();
        fields.extend(
            COMMENT_COLUMNS
                .iter()
                .map(|c| Field::new(*c, DataType::Utf8, false)),
        );
        fields.push(Field::new(TIME, DataType::Int64, false));
        fields.push(Field::new(SOURCE, DataType::Utf8, false));
        fields.push(Field::new(USER, DataType::Utf8, false));
        Schema::new(fields)
    }

    /// All column names of the log, in schema order.
    pub fn column_names(keys: &[String]) -> Vec<String> {
        keys.iter()
            .cloned()
            .chain(COMMENT_COLUMNS.iter().map(|c| c.to_string()))
            .chain(SERVICE_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::comment_log;

    #[test]
    fn log_schema_has_keys_then_comments_then_service_columns() {
        let keys = vec!["__deposit".to_string(), "__well_num".to_string()];
        let schema = comment_log::schema(&keys);
        assert_eq!(schema.fields().len(), 8);
        assert_eq!(schema.field(0).name(), "__deposit");
        assert_eq!(schema.field(2).name(), "comment");
        assert_eq!(schema.field(5).name(), "_time");
        assert!(schema.field_with_name("user").is_ok());
    }

    #[test]
    fn column_names_follow_schema_order() {
        let keys = vec!["well".to_string()];
        let names = comment_log::column_names(&keys);
        let schema = comment_log::schema(&keys);
        let from_schema: Vec<&String> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names.iter().collect::<Vec<_>>(), from_schema);
    }
}
