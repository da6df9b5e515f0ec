//! Contracts of the collaborators the relationship engine consumes.
//!
//! Implementations live outside this crate (entity storage, template
//! management, instance settings and the document search index). Failures are
//! reported as `anyhow::Error` and surface from the engine as
//! [`crate::GraphError::Backend`].

use anyhow::Result;

use crate::model::{Entity, SearchQuery, SearchResults, Settings, Template, User};

pub trait EntitiesService {
    /// Fetch one entity in `language`.
    fn get_by_id(&self, shared_id: &str, language: &str) -> Result<Option<Entity>>;

    /// Fetch every entity in `shared_ids` that exists in `language`.
    fn get_many(&self, shared_ids: &[String], language: &str) -> Result<Vec<Entity>>;

    /// Recompute metadata that is denormalized from connected entities.
    fn update_metadata_from_relationships(&self, entity_ids: &[String], language: &str)
    -> Result<()>;
}

pub trait TemplatesService {
    fn get_by_id(&self, template_id: &str) -> Result<Option<Template>>;
}

pub trait SettingsService {
    fn get(&self) -> Result<Settings>;
}

pub trait SearchService {
    fn search(
        &self,
        query: &SearchQuery,
        language: &str,
        user: Option<&User>,
    ) -> Result<SearchResults>;
}
