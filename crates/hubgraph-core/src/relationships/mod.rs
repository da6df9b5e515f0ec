//! Relationship engine.
//!
//! [`Relationships`] ties the store to the external collaborators and owns
//! every operation that changes or reads the hub graph:
//!
//! - [`save`](Relationships::save): write a hub's rows and propagate metadata
//! - [`delete`](Relationships::delete): cascading delete with hub cleanup
//! - [`synchronize`](Relationships::synchronize): mirror relationship-typed
//!   metadata properties into hubs
//! - [`search`](Relationships::search): hub-aware search over an entity's
//!   neighborhood
//!
//! Operations run synchronously. Batched steps execute in order and stop at
//! the first error; nothing already written is rolled back.

mod delete;
mod save;
mod search;
mod sync;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::SearchConfig;
use crate::db::{Pagination, RelationshipQuery, RelationshipStore};
use crate::error::{GraphError, GraphResult};
use crate::hub::partition_by_hub;
use crate::model::{Relationship, RelationshipBatch};
use crate::services::{EntitiesService, SearchService, SettingsService, TemplatesService};

/// Whether a write recomputes the metadata of the entities it touches.
///
/// Internal writes issued while reconciling metadata use
/// [`MetadataPropagation::Skip`] so they do not start another reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataPropagation {
    #[default]
    Propagate,
    Skip,
}

impl MetadataPropagation {
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Propagate)
    }
}

/// Saves and deletes applied together by [`Relationships::bulk`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub save: Vec<RelationshipBatch>,
    #[serde(default)]
    pub delete: Vec<RelationshipQuery>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    pub saved: usize,
    pub deleted: usize,
}

pub struct Relationships<'a> {
    store: &'a dyn RelationshipStore,
    entities: &'a dyn EntitiesService,
    templates: &'a dyn TemplatesService,
    settings: &'a dyn SettingsService,
    search: &'a dyn SearchService,
    search_config: SearchConfig,
}

impl<'a> Relationships<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn RelationshipStore,
        entities: &'a dyn EntitiesService,
        templates: &'a dyn TemplatesService,
        settings: &'a dyn SettingsService,
        search: &'a dyn SearchService,
    ) -> Self {
        Self {
            store,
            entities,
            templates,
            settings,
            search,
            search_config: SearchConfig::default(),
        }
    }

    #[must_use]
    pub fn with_search_config(mut self, search_config: SearchConfig) -> Self {
        self.search_config = search_config;
        self
    }

    /// Rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store fails.
    pub fn get(
        &self,
        query: &RelationshipQuery,
        pagination: Pagination,
    ) -> GraphResult<Vec<Relationship>> {
        Ok(self.store.get(query, pagination)?)
    }

    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store fails.
    pub fn get_by_id(&self, id: i64) -> GraphResult<Option<Relationship>> {
        Ok(self.store.get_by_id(id)?)
    }

    /// Every row of `hub`, across languages.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store fails.
    pub fn get_hub(&self, hub: &str) -> GraphResult<Vec<Relationship>> {
        self.get(&RelationshipQuery::by_hub(hub), Pagination::default())
    }

    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store fails.
    pub fn count(&self, query: &RelationshipQuery) -> GraphResult<u64> {
        Ok(self.store.count(query)?)
    }

    /// Number of rows typed with relation type `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store fails.
    pub fn count_by_relation_type(&self, type_id: &str) -> GraphResult<u64> {
        self.count(&RelationshipQuery::default().template(type_id))
    }

    /// Rows of every hub `shared_id` takes part in, in `language`, grouped
    /// by hub. Hubs with a single row are left out.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store fails.
    pub fn get_document_hubs(
        &self,
        shared_id: &str,
        language: &str,
    ) -> GraphResult<Vec<Vec<Relationship>>> {
        let own = self.get(
            &RelationshipQuery::by_entity(shared_id).language(language),
            Pagination::default(),
        )?;

        let mut hub_ids: Vec<String> = Vec::new();
        for row in &own {
            if !hub_ids.iter().any(|hub| hub == row.hub_id()) {
                hub_ids.push(row.hub_id().to_string());
            }
        }
        if hub_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.get(
            &RelationshipQuery::by_hubs(hub_ids).language(language),
            Pagination::default(),
        )?;

        Ok(partition_by_hub(&rows)
            .into_iter()
            .filter(|hub| hub.len() > 1)
            .collect())
    }

    /// Flattened [`get_document_hubs`](Self::get_document_hubs), optionally
    /// joined with each row's entity in one batched lookup.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store or the entities service fails.
    #[instrument(skip(self), level = "debug")]
    pub fn get_by_document(
        &self,
        shared_id: &str,
        language: &str,
        with_entity_data: bool,
    ) -> GraphResult<Vec<Relationship>> {
        let mut rows: Vec<Relationship> = self
            .get_document_hubs(shared_id, language)?
            .into_iter()
            .flatten()
            .collect();

        if !with_entity_data || rows.is_empty() {
            return Ok(rows);
        }

        let mut ids: Vec<String> = Vec::new();
        for row in &rows {
            if !ids.contains(&row.entity) {
                ids.push(row.entity.clone());
            }
        }

        let connected = self.entities.get_many(&ids, language)?;
        for row in &mut rows {
            row.entity_data = connected
                .iter()
                .find(|entity| entity.shared_id == row.entity)
                .cloned();
            if row.entity_data.is_none() {
                warn!(entity = %row.entity, hub = %row.hub_id(), "connected entity not found");
            }
        }

        Ok(rows)
    }

    /// Recompute metadata of every entity in `hub`, in `language`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store or the entities service fails.
    pub fn update_entities_metadata_by_hub(&self, hub: &str, language: &str) -> GraphResult<()> {
        let mut ids: Vec<String> = Vec::new();
        for row in self.get_hub(hub)? {
            if !ids.contains(&row.entity) {
                ids.push(row.entity);
            }
        }
        self.update_entities_metadata(&ids, language)
    }

    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the entities service fails.
    pub fn update_entities_metadata(&self, entity_ids: &[String], language: &str) -> GraphResult<()> {
        debug!(entities = entity_ids.len(), language, "recomputing connected metadata");
        Ok(self
            .entities
            .update_metadata_from_relationships(entity_ids, language)?)
    }

    /// Apply every save batch, then every delete query, all with metadata
    /// propagation. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`save`](Self::save) or
    /// [`delete`](Self::delete).
    pub fn bulk(&self, request: BulkRequest, language: &str) -> GraphResult<BulkReport> {
        let mut report = BulkReport::default();

        for batch in request.save {
            report.saved += self
                .save(batch.into_vec(), language, MetadataPropagation::Propagate)?
                .len();
        }

        for query in &request.delete {
            report.deleted += self
                .delete(query, language, MetadataPropagation::Propagate)?
                .len();
        }

        Ok(report)
    }

    fn language_keys(&self) -> GraphResult<Vec<String>> {
        Ok(self
            .settings
            .get()?
            .language_keys()
            .map(str::to_string)
            .collect())
    }
}

fn require_language(language: &str) -> GraphResult<()> {
    if language.trim().is_empty() {
        return Err(GraphError::missing_language());
    }
    Ok(())
}
