//! SQL migration definitions for the local ContentFlow database.
//!
//! Migrations are applied in order on open. Each one records its version in
//! `schema_migrations` so reopening an existing file is a no-op.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: prd, content_version",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS prd (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Append-only: rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS content_version (
    id         TEXT PRIMARY KEY,
    prd_id     TEXT NOT NULL REFERENCES prd(id) ON DELETE CASCADE,
    stage      TEXT NOT NULL CHECK (stage IN ('research', 'draft', 'fact_checked')),
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Index content_version by prd, stage and time",
            sql: r#"
CREATE INDEX IF NOT EXISTS idx_content_version_lookup
    ON content_version(prd_id, stage, created_at);

CREATE INDEX IF NOT EXISTS idx_prd_created_at ON prd(created_at);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
