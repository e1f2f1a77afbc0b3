pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conditions (
    position INTEGER NOT NULL,
    application_identifier TEXT NOT NULL UNIQUE,
    input_source_id TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    display_name TEXT NOT NULL DEFAULT '',
    display_icon BLOB NOT NULL DEFAULT x''
);

CREATE INDEX IF NOT EXISTS idx_conditions_position ON conditions(position);
"#;
