use tracing::{debug, info, instrument};

use super::{MetadataPropagation, Relationships};
use crate::db::{Pagination, RelationshipQuery};
use crate::error::{ErrorCode, GraphError, GraphResult};
use crate::model::Relationship;

impl Relationships<'_> {
    /// Delete the rows matching `query` and clean up what they leave behind.
    ///
    /// Every hub that loses a row and ends up with fewer than two rows is
    /// removed entirely. With [`MetadataPropagation::Propagate`], metadata of
    /// every entity that belonged to an affected hub before the delete is
    /// recomputed once per configured language.
    ///
    /// Returns only the rows `query` itself matched, not the sibling rows
    /// removed by hub cleanup.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidArgument`] when `query` has no condition
    /// - [`GraphError::Backend`] if the store or a collaborator fails
    #[instrument(skip_all, fields(language = %language))]
    pub fn delete(
        &self,
        query: &RelationshipQuery,
        language: &str,
        propagation: MetadataPropagation,
    ) -> GraphResult<Vec<Relationship>> {
        if query.is_empty() {
            return Err(GraphError::invalid(
                ErrorCode::MissingCondition,
                "refusing to delete every relationship",
            ));
        }

        let matched = self.store.get(query, Pagination::default())?;
        let mut hubs: Vec<String> = Vec::new();
        for row in &matched {
            if !hubs.iter().any(|hub| hub == row.hub_id()) {
                hubs.push(row.hub_id().to_string());
            }
        }

        let languages = if propagation.is_enabled() {
            self.language_keys()?
        } else {
            Vec::new()
        };
        let affected_entities = self.store.distinct_entities_for_hubs(&hubs)?;

        let deleted = self.store.delete(query)?;
        debug!(deleted = deleted.len(), hubs = hubs.len(), "relationships deleted");

        let degenerate: Vec<String> = self
            .store
            .count_rows_per_hub(&hubs)?
            .into_iter()
            .filter(|(_, rows)| *rows < 2)
            .map(|(hub, _)| hub)
            .collect();
        if !degenerate.is_empty() {
            let removed = self.store.delete(&RelationshipQuery::by_hubs(degenerate))?;
            info!(removed = removed.len(), "removed rows of degenerate hubs");
        }

        for key in &languages {
            self.update_entities_metadata(&affected_entities, key)?;
        }

        Ok(deleted)
    }

    /// Delete the text-anchored rows of `shared_id` in `language` without
    /// recomputing metadata.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store fails.
    pub fn delete_text_references(
        &self,
        shared_id: &str,
        language: &str,
    ) -> GraphResult<Vec<Relationship>> {
        self.delete(
            &RelationshipQuery::by_entity(shared_id)
                .language(language)
                .with_range(),
            language,
            MetadataPropagation::Skip,
        )
    }

    /// Delete every row of `shared_id`, in all languages, as part of
    /// deleting the entity itself.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the store or a collaborator fails.
    pub fn delete_entity_relationships(
        &self,
        shared_id: &str,
        language: &str,
    ) -> GraphResult<Vec<Relationship>> {
        self.delete(
            &RelationshipQuery::by_entity(shared_id),
            language,
            MetadataPropagation::Propagate,
        )
    }
}
