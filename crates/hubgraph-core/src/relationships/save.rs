use tracing::{debug, info, instrument};

use super::{MetadataPropagation, Relationships, require_language};
use crate::error::{ErrorCode, GraphError, GraphResult};
use crate::ids::generate_id;
use crate::model::Relationship;

impl Relationships<'_> {
    /// Save the rows of one hub.
    ///
    /// The first row's hub (or a freshly generated id) is assigned to every
    /// row. Rows with an id are updated in place, the rest are created. Each
    /// returned row carries its joined entity. With
    /// [`MetadataPropagation::Propagate`], metadata of every entity in the hub
    /// is recomputed once per configured language after all rows are written.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidArgument`] for an empty batch, a blank language,
    ///   a single row without a hub, or an updated row left with a text anchor
    ///   but no filename
    /// - [`GraphError::NotFound`] when an updated row or an anchored row's
    ///   entity does not exist
    /// - [`GraphError::Backend`] if the store or a collaborator fails
    #[instrument(skip_all, fields(rows = rows.len(), language = %language))]
    pub fn save(
        &self,
        rows: Vec<Relationship>,
        language: &str,
        propagation: MetadataPropagation,
    ) -> GraphResult<Vec<Relationship>> {
        require_language(language)?;

        let Some(first) = rows.first() else {
            return Err(GraphError::invalid(
                ErrorCode::InvalidRelationship,
                "nothing to save",
            ));
        };

        let given_hub = first.hub.clone().filter(|hub| !hub.trim().is_empty());
        if rows.len() == 1 && given_hub.is_none() {
            return Err(GraphError::invalid(
                ErrorCode::MissingHub,
                "a single relationship must name an existing hub",
            ));
        }
        let hub = given_hub.unwrap_or_else(generate_id);

        let mut saved = Vec::with_capacity(rows.len());
        for mut row in rows {
            row.hub = Some(hub.clone());
            let mut stored = if row.id.is_some() {
                self.update_relationship(row)?
            } else {
                self.create_relationship(row, language)?
            };
            stored.entity_data = self.entities.get_by_id(&stored.entity, language)?;
            saved.push(stored);
        }

        debug!(hub = %hub, saved = saved.len(), "hub rows written");

        if propagation.is_enabled() {
            for key in self.language_keys()? {
                self.update_entities_metadata_by_hub(&hub, &key)?;
            }
            info!(hub = %hub, "hub metadata propagated");
        }

        Ok(saved)
    }

    fn create_relationship(&self, mut row: Relationship, language: &str) -> GraphResult<Relationship> {
        if row.language.is_none() {
            row.language = Some(language.to_string());
        }

        row.filename = match row.range {
            Some(_) => Some(self.anchor_filename(&row.entity, language)?),
            None => None,
        };

        Ok(self.store.save(&row)?)
    }

    fn update_relationship(&self, mut row: Relationship) -> GraphResult<Relationship> {
        let id = row.id.unwrap_or_default();
        let existing = self.store.get_by_id(id)?.ok_or_else(|| {
            GraphError::not_found(
                ErrorCode::RelationshipNotFound,
                format!("relationship {id} does not exist"),
            )
        })?;

        if row.template.as_deref().is_some_and(str::is_empty) {
            row.template = None;
        }
        if row.language.is_none() {
            row.language = existing.language;
        }
        if row.range.is_none() {
            row.range = existing.range;
        }
        if row.filename.is_none() {
            row.filename = existing.filename;
        }
        if row.range.is_some() && row.filename.is_none() {
            return Err(GraphError::invalid(
                ErrorCode::InvalidRelationship,
                format!("relationship {id} gains a text anchor without a filename"),
            ));
        }

        Ok(self.store.save(&row)?)
    }

    /// Filename of the primary file of the entity a text anchor points into.
    fn anchor_filename(&self, shared_id: &str, language: &str) -> GraphResult<String> {
        let entity = self.entities.get_by_id(shared_id, language)?.ok_or_else(|| {
            GraphError::not_found(
                ErrorCode::EntityNotFound,
                format!("entity {shared_id} does not exist in {language}"),
            )
        })?;

        entity.file.map(|file| file.filename).ok_or_else(|| {
            GraphError::invalid(
                ErrorCode::InvalidRelationship,
                format!("entity {shared_id} has no file to anchor a text reference in"),
            )
        })
    }
}
