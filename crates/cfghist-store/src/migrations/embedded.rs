//! Embedded SQL migrations

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Get all embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_history_schema",
            sql: include_str!("../../migrations/001_history_schema.sql"),
        },
        Migration {
            id: "002_rules_schema",
            sql: include_str!("../../migrations/002_rules_schema.sql"),
        },
    ]
}
