//! SQLite schema for the durable key-value store
//!
//! One flat table. Values are JSON text; nothing about their shape is
//! enforced here.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,                   -- JSON-encoded value
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);
"#;
