//! Versioned migrations for the relationship store.
//!
//! The applied version lives in `PRAGMA user_version` and is mirrored into
//! `store_meta.schema_version`. Each step commits on its own, so a store
//! interrupted mid-upgrade resumes from the last committed step.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::info;

use super::schema;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "relationships table",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        name: "hub, entity and template indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Schema version written by this build.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// # Errors
///
/// Returns an error if SQLite cannot be queried or reports a version that
/// does not fit in a `u32`.
pub fn current_schema_version(conn: &Connection) -> Result<u32> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("read store schema version")?;
    u32::try_from(version).with_context(|| format!("invalid store schema version {version}"))
}

/// Bring the store up to [`LATEST_SCHEMA_VERSION`] and return the version it
/// ends at.
///
/// # Errors
///
/// Returns an error if the store was written by a newer build or a step
/// fails to apply.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let mut version = current_schema_version(conn)?;
    if version > LATEST_SCHEMA_VERSION {
        bail!(
            "relationship store is at schema version {version}, newer than the supported {LATEST_SCHEMA_VERSION}"
        );
    }

    let start = version;
    for step in MIGRATIONS.iter().filter(|step| step.version > start) {
        let tx = conn
            .transaction()
            .with_context(|| format!("begin migration {}", step.version))?;
        tx.execute_batch(step.sql)
            .with_context(|| format!("apply migration {} ({})", step.version, step.name))?;
        tx.pragma_update(None, "user_version", i64::from(step.version))?;
        tx.execute(
            "UPDATE store_meta SET schema_version = ?1 WHERE id = 1",
            [i64::from(step.version)],
        )?;
        tx.commit()
            .with_context(|| format!("commit migration {}", step.version))?;

        info!(version = step.version, name = step.name, "relationship store migrated");
        version = step.version;
    }

    Ok(version)
}
