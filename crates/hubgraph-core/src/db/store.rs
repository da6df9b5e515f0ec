//! Relationship persistence.
//!
//! [`RelationshipStore`] is the storage seam of the engine: plain row CRUD
//! plus the two hub aggregations the cascading delete needs. Rows come back
//! in insertion order (`relationship_id ASC`), which is what makes hub
//! grouping deterministic for a given store state.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter, types::Type};
use std::collections::BTreeMap;

use super::query::{Pagination, RelationshipQuery};
use crate::config::StoreConfig;
use crate::model::{Relationship, TextRange};

pub trait RelationshipStore {
    /// Rows matching `query`, in insertion order.
    fn get(&self, query: &RelationshipQuery, pagination: Pagination) -> Result<Vec<Relationship>>;

    fn get_by_id(&self, id: i64) -> Result<Option<Relationship>>;

    /// Insert a row without an id, or overwrite the stored row with the same
    /// id. Returns the stored row.
    fn save(&self, row: &Relationship) -> Result<Relationship>;

    /// Delete rows matching `query` and return them.
    fn delete(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>>;

    fn count(&self, query: &RelationshipQuery) -> Result<u64>;

    /// Row count per hub. Hubs without rows are absent from the map.
    fn count_rows_per_hub(&self, hubs: &[String]) -> Result<BTreeMap<String, usize>>;

    /// Distinct entities with a row in any of `hubs`, in first-seen order.
    fn distinct_entities_for_hubs(&self, hubs: &[String]) -> Result<Vec<String>>;
}

const SELECT_COLUMNS: &str = "SELECT relationship_id, hub, entity, language, template, \
                              range_json, filename FROM relationships";

/// [`RelationshipStore`] backed by a single SQLite connection.
#[derive(Debug)]
pub struct SqliteRelationshipStore {
    conn: Connection,
}

impl SqliteRelationshipStore {
    /// Wrap an already-migrated connection (see [`crate::db::open_store`]).
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open the on-disk store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, configured or migrated.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(super::open_store(&config.path, config.busy_timeout())?))
    }

    /// Private in-memory store, mostly for tests and tooling.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or migrated.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(super::open_in_memory()?))
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    fn select(&self, query: &RelationshipQuery, pagination: Pagination) -> Result<Vec<Relationship>> {
        let (where_clause, param_values) = query.where_clause();
        let limit_clause = pagination.sql_clause();
        let sql = format!("{SELECT_COLUMNS}{where_clause} ORDER BY relationship_id ASC{limit_clause}");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare relationship query: {sql}"))?;

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(AsRef::as_ref).collect();

        let rows = stmt
            .query_map(params_from_iter(params_ref), row_to_relationship)
            .context("execute relationship query")?;

        let mut relationships = Vec::new();
        for row in rows {
            relationships.push(row.context("read relationship row")?);
        }
        Ok(relationships)
    }

    fn insert(&self, row: &Relationship, hub: &str) -> Result<Relationship> {
        let range_json = encode_range(row.range.as_ref())?;
        let now_us = chrono::Utc::now().timestamp_micros();

        self.conn
            .execute(
                "INSERT INTO relationships \
                 (hub, entity, language, template, range_json, filename, created_at_us) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    hub,
                    row.entity,
                    row.language,
                    row.template,
                    range_json,
                    row.filename,
                    now_us
                ],
            )
            .with_context(|| format!("insert relationship for entity '{}'", row.entity))?;

        let id = self.conn.last_insert_rowid();
        self.get_by_id(id)?
            .with_context(|| format!("read back inserted relationship {id}"))
    }

    fn update(&self, id: i64, row: &Relationship, hub: &str) -> Result<Relationship> {
        let range_json = encode_range(row.range.as_ref())?;

        let changed = self
            .conn
            .execute(
                "UPDATE relationships SET hub = ?1, entity = ?2, language = ?3, template = ?4, \
                 range_json = ?5, filename = ?6 WHERE relationship_id = ?7",
                params![
                    hub,
                    row.entity,
                    row.language,
                    row.template,
                    range_json,
                    row.filename,
                    id
                ],
            )
            .with_context(|| format!("update relationship {id}"))?;

        if changed == 0 {
            bail!("relationship {id} does not exist");
        }

        self.get_by_id(id)?
            .with_context(|| format!("read back updated relationship {id}"))
    }
}

impl RelationshipStore for SqliteRelationshipStore {
    fn get(&self, query: &RelationshipQuery, pagination: Pagination) -> Result<Vec<Relationship>> {
        self.select(query, pagination)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Relationship>> {
        let sql = format!("{SELECT_COLUMNS} WHERE relationship_id = ?1");
        self.conn
            .query_row(&sql, params![id], row_to_relationship)
            .optional()
            .with_context(|| format!("get relationship {id}"))
    }

    fn save(&self, row: &Relationship) -> Result<Relationship> {
        let Some(hub) = row.hub.as_deref().filter(|hub| !hub.trim().is_empty()) else {
            bail!("relationship for entity '{}' has no hub", row.entity);
        };

        match row.id {
            Some(id) => self.update(id, row, hub),
            None => self.insert(row, hub),
        }
    }

    fn delete(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin relationship delete")?;

        let doomed = self.select(query, Pagination::default())?;

        let (where_clause, param_values) = query.where_clause();
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(AsRef::as_ref).collect();
        tx.execute(
            &format!("DELETE FROM relationships{where_clause}"),
            params_from_iter(params_ref),
        )
        .context("delete relationships")?;

        tx.commit().context("commit relationship delete")?;
        Ok(doomed)
    }

    fn count(&self, query: &RelationshipQuery) -> Result<u64> {
        let (where_clause, param_values) = query.where_clause();
        let sql = format!("SELECT COUNT(*) FROM relationships{where_clause}");
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(AsRef::as_ref).collect();

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params_ref), |row| row.get(0))
            .context("count relationships")?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn count_rows_per_hub(&self, hubs: &[String]) -> Result<BTreeMap<String, usize>> {
        if hubs.is_empty() {
            return Ok(BTreeMap::new());
        }

        let (where_clause, param_values) = RelationshipQuery::by_hubs(hubs.iter().cloned()).where_clause();
        let sql = format!("SELECT hub, COUNT(*) FROM relationships{where_clause} GROUP BY hub");
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(AsRef::as_ref).collect();

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare hub size query")?;
        let rows = stmt
            .query_map(params_from_iter(params_ref), |row| {
                let hub: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((hub, usize::try_from(count).unwrap_or(usize::MAX)))
            })
            .context("execute hub size query")?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (hub, count) = row.context("read hub size")?;
            counts.insert(hub, count);
        }
        Ok(counts)
    }

    fn distinct_entities_for_hubs(&self, hubs: &[String]) -> Result<Vec<String>> {
        if hubs.is_empty() {
            return Ok(Vec::new());
        }

        let (where_clause, param_values) = RelationshipQuery::by_hubs(hubs.iter().cloned()).where_clause();
        let sql = format!(
            "SELECT entity FROM relationships{where_clause} \
             GROUP BY entity ORDER BY MIN(relationship_id) ASC"
        );
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(AsRef::as_ref).collect();

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare hub entities query")?;
        let rows = stmt
            .query_map(params_from_iter(params_ref), |row| row.get::<_, String>(0))
            .context("execute hub entities query")?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row.context("read hub entity")?);
        }
        Ok(entities)
    }
}

fn encode_range(range: Option<&TextRange>) -> Result<Option<String>> {
    range
        .map(|range| serde_json::to_string(range).context("encode text range"))
        .transpose()
}

fn row_to_relationship(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let range_json: Option<String> = row.get(5)?;
    let range = range_json
        .map(|json| serde_json::from_str::<TextRange>(&json))
        .transpose()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    Ok(Relationship {
        id: Some(row.get(0)?),
        hub: Some(row.get(1)?),
        entity: row.get(2)?,
        language: row.get(3)?,
        template: row.get(4)?,
        range,
        filename: row.get(6)?,
        entity_data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteRelationshipStore {
        SqliteRelationshipStore::in_memory().expect("open in-memory store")
    }

    fn insert(store: &SqliteRelationshipStore, hub: &str, entity: &str) -> Relationship {
        store
            .save(&Relationship::to_entity(entity).in_hub(hub).with_language("en"))
            .expect("insert relationship")
    }

    #[test]
    fn insert_assigns_ids_and_reads_back() {
        let store = store();
        let a = insert(&store, "h1", "ent-a");
        let b = insert(&store, "h1", "ent-b");

        assert!(a.id.is_some());
        assert_ne!(a.id, b.id);
        assert_eq!(a.hub.as_deref(), Some("h1"));
        assert_eq!(a.language.as_deref(), Some("en"));
        assert!(a.template.is_none());

        let fetched = store
            .get_by_id(a.id.expect("id"))
            .expect("get_by_id")
            .expect("row exists");
        assert_eq!(fetched, a);
    }

    #[test]
    fn save_without_hub_is_rejected() {
        let store = store();
        let err = store
            .save(&Relationship::to_entity("ent-a"))
            .expect_err("hub is required");
        assert!(err.to_string().contains("has no hub"));
    }

    #[test]
    fn update_overwrites_template() {
        let store = store();
        let mut row = insert(&store, "h1", "ent-a");
        row.template = Some("rt-cites".to_string());

        let updated = store.save(&row).expect("update");
        assert_eq!(updated.template.as_deref(), Some("rt-cites"));
        assert_eq!(store.count(&RelationshipQuery::default()).expect("count"), 1);
    }

    #[test]
    fn update_of_missing_row_fails() {
        let store = store();
        let mut row = Relationship::to_entity("ent-a").in_hub("h1");
        row.id = Some(404);
        assert!(store.save(&row).is_err());
    }

    #[test]
    fn text_range_round_trips_with_filename() {
        let store = store();
        let mut row = Relationship::to_entity("ent-a").in_hub("h1").anchored(TextRange {
            start: 10,
            end: 42,
            page: Some("3".to_string()),
            text: Some("quoted passage".to_string()),
        });
        row.filename = Some("ent-a.pdf".to_string());

        let saved = store.save(&row).expect("insert anchored row");
        assert_eq!(saved.range, row.range);
        assert_eq!(saved.filename.as_deref(), Some("ent-a.pdf"));

        let anchored = store
            .get(&RelationshipQuery::by_entity("ent-a").with_range(), Pagination::default())
            .expect("query anchored");
        assert_eq!(anchored.len(), 1);
    }

    #[test]
    fn delete_returns_removed_rows_only() {
        let store = store();
        insert(&store, "h1", "ent-a");
        let b = insert(&store, "h1", "ent-b");
        insert(&store, "h2", "ent-b");

        let deleted = store
            .delete(&RelationshipQuery::by_id(b.id.expect("id")))
            .expect("delete");
        assert_eq!(deleted, vec![b]);
        assert_eq!(store.count(&RelationshipQuery::default()).expect("count"), 2);
    }

    #[test]
    fn get_respects_pagination_and_order() {
        let store = store();
        for entity in ["e1", "e2", "e3", "e4"] {
            insert(&store, "h1", entity);
        }

        let page = store
            .get(
                &RelationshipQuery::by_hub("h1"),
                Pagination {
                    limit: Some(2),
                    offset: Some(1),
                },
            )
            .expect("paged get");
        let entities: Vec<&str> = page.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["e2", "e3"]);
    }

    #[test]
    fn count_rows_per_hub_omits_empty_hubs() {
        let store = store();
        insert(&store, "h1", "ent-a");
        insert(&store, "h1", "ent-b");
        insert(&store, "h2", "ent-c");

        let counts = store
            .count_rows_per_hub(&["h1".to_string(), "h2".to_string(), "h3".to_string()])
            .expect("hub sizes");
        assert_eq!(counts.get("h1"), Some(&2));
        assert_eq!(counts.get("h2"), Some(&1));
        assert!(!counts.contains_key("h3"));
    }

    #[test]
    fn distinct_entities_are_first_seen_ordered() {
        let store = store();
        insert(&store, "h1", "ent-b");
        insert(&store, "h1", "ent-a");
        insert(&store, "h2", "ent-b");
        insert(&store, "h3", "ent-z");

        let entities = store
            .distinct_entities_for_hubs(&["h1".to_string(), "h2".to_string()])
            .expect("entities");
        assert_eq!(entities, vec!["ent-b".to_string(), "ent-a".to_string()]);
        assert!(store.distinct_entities_for_hubs(&[]).expect("empty").is_empty());
    }

    #[test]
    fn open_from_config_persists_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = StoreConfig {
            path: dir.path().join("graph/relationships.db"),
            ..StoreConfig::default()
        };

        {
            let store = SqliteRelationshipStore::open(&config).expect("open store");
            insert(&store, "h1", "ent-a");
        }

        let reopened = SqliteRelationshipStore::open(&config).expect("reopen store");
        assert_eq!(reopened.count(&RelationshipQuery::by_hub("h1")).expect("count"), 1);
    }
}
