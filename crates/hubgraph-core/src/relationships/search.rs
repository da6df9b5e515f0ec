use std::collections::HashSet;

use tracing::{debug, instrument};

use super::{Relationships, require_language};
use crate::error::{ErrorCode, GraphError, GraphResult};
use crate::hub::limit_hubs;
use crate::model::{ConnectionQuery, Relationship, SearchResults, SearchRow, User};

impl Relationships<'_> {
    /// Search the entities connected to `shared_id`, attaching to each hit
    /// the connections that led to it.
    ///
    /// Connections are narrowed to the composite keys in `query.filter` (no
    /// keys means no narrowing). When anything matched, the origin entity is
    /// appended with its own rows in the hubs the hits came through, then
    /// results are paginated by hub with `query.limit`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidArgument`] for a blank language
    /// - [`GraphError::NotFound`] when `shared_id` does not exist in `language`
    /// - [`GraphError::Backend`] if the store or a collaborator fails
    #[instrument(skip_all, fields(entity = %shared_id, language = %language))]
    pub fn search(
        &self,
        shared_id: &str,
        query: &ConnectionQuery,
        language: &str,
        user: Option<&User>,
    ) -> GraphResult<SearchResults> {
        require_language(language)?;

        let mut relationships = self.get_by_document(shared_id, language, true)?;
        let origin = self.entities.get_by_id(shared_id, language)?.ok_or_else(|| {
            GraphError::not_found(
                ErrorCode::EntityNotFound,
                format!("entity {shared_id} does not exist in {language}"),
            )
        })?;

        relationships.sort_by_cached_key(Relationship::entity_hub_key);

        let allowed = query.allowed_keys();
        let filtered: Vec<&Relationship> = relationships
            .iter()
            .filter(|row| allowed.is_empty() || allowed.contains(&row.composite_key().as_str()))
            .collect();

        let mut ids: Vec<String> = Vec::new();
        for row in &filtered {
            if row.entity != shared_id && !ids.contains(&row.entity) {
                ids.push(row.entity.clone());
            }
        }
        if ids.is_empty() {
            ids.push(self.search_config.empty_result_sentinel.clone());
        }

        let mut delegated = query.search.clone();
        delegated.ids = Some(ids);
        delegated.include_unpublished = true;
        delegated.limit = Some(self.search_config.page_size);

        let mut results = self.search.search(&delegated, language, user)?;
        debug!(hits = results.rows.len(), connections = filtered.len(), "connected entities found");

        for row in &mut results.rows {
            row.connections = filtered
                .iter()
                .filter(|connection| connection.entity == row.entity.shared_id)
                .map(|connection| (*connection).clone())
                .collect();
        }

        if !results.rows.is_empty() {
            let reached: HashSet<String> = results
                .rows
                .iter()
                .flat_map(|row| row.connections.iter().map(|c| c.hub_id().to_string()))
                .collect();
            let connections = relationships
                .iter()
                .filter(|row| row.entity == shared_id && reached.contains(row.hub_id()))
                .cloned()
                .collect();
            results.rows.push(SearchRow {
                entity: origin,
                connections,
            });
        }

        limit_hubs(&mut results, shared_id, query.limit);
        Ok(results)
    }
}
