//! Canonical SQLite schema for the relationship store.
//!
//! - `relationships` holds one row per hub endpoint; hubs are not stored
//!   separately, they are the set of rows sharing a `hub` value
//! - `store_meta` records the schema version next to `PRAGMA user_version`

/// Migration v1: relationship rows plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS relationships (
    relationship_id INTEGER PRIMARY KEY AUTOINCREMENT,
    hub TEXT NOT NULL CHECK (length(trim(hub)) > 0),
    entity TEXT NOT NULL CHECK (length(trim(entity)) > 0),
    language TEXT,
    template TEXT,
    range_json TEXT,
    filename TEXT,
    created_at_us INTEGER NOT NULL,
    CHECK (range_json IS NULL OR filename IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
"#;

/// Migration v2: lookup indexes for hub scans, per-entity reads and
/// relation-type counts.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_relationships_hub
    ON relationships(hub, relationship_id);

CREATE INDEX IF NOT EXISTS idx_relationships_entity_language
    ON relationships(entity, language);

CREATE INDEX IF NOT EXISTS idx_relationships_template
    ON relationships(template);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
"#;

/// Indexes expected by hub/entity/template query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_relationships_hub",
    "idx_relationships_entity_language",
    "idx_relationships_template",
];
