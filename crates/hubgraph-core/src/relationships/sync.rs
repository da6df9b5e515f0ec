use tracing::{debug, instrument, warn};

use super::{MetadataPropagation, Relationships, require_language};
use crate::db::RelationshipQuery;
use crate::error::{ErrorCode, GraphError, GraphResult};
use crate::hub::partition_by_hub;
use crate::ids::generate_id;
use crate::model::{Entity, Property, Relationship};

impl Relationships<'_> {
    /// Reconcile stored hubs with the relationship-typed properties of
    /// `entity`'s template.
    ///
    /// For each such property, rows for newly referenced entities are added
    /// to the entity's home hub for that relation type, and rows of that type
    /// that the property no longer references are deleted. Writes never
    /// propagate metadata; the caller is recomputing it already.
    ///
    /// Running it twice with the same entity is a no-op the second time.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidArgument`] for a blank language
    /// - [`GraphError::NotFound`] when the entity's template does not exist
    /// - [`GraphError::Backend`] if the store or a collaborator fails
    #[instrument(skip_all, fields(entity = %entity.shared_id, language = %language))]
    pub fn synchronize(&self, entity: &Entity, language: &str) -> GraphResult<()> {
        require_language(language)?;

        let Some(template_id) = entity.template.as_deref() else {
            return Ok(());
        };
        let template = self.templates.get_by_id(template_id)?.ok_or_else(|| {
            GraphError::not_found(
                ErrorCode::TemplateNotFound,
                format!("template {template_id} does not exist"),
            )
        })?;

        let references = self.get_by_document(&entity.shared_id, language, true)?;

        for property in template.relationship_properties() {
            self.synchronize_property(entity, property, &references, language)?;
        }

        Ok(())
    }

    fn synchronize_property(
        &self,
        entity: &Entity,
        property: &Property,
        references: &[Relationship],
        language: &str,
    ) -> GraphResult<()> {
        let Some(relation_type) = property.relation_type.as_deref() else {
            warn!(property = %property.name, "relationship property without relation type");
            return Ok(());
        };
        let values = entity.reference_values(&property.name);

        let hubs = partition_by_hub(references);
        let mut home = find_property_hub(&hubs, &entity.shared_id, relation_type)
            .cloned()
            .unwrap_or_else(|| vec![Relationship::to_entity(&entity.shared_id).in_hub(generate_id())]);
        let hub = home[0].hub_id().to_string();

        for value in &values {
            let referenced = references
                .iter()
                .chain(home.iter())
                .any(|row| row.entity == *value && row.has_template(relation_type));
            if !referenced {
                home.push(Relationship::to_entity(value).in_hub(&hub).typed(relation_type));
            }
        }

        let content = property.content.as_deref().filter(|c| !c.is_empty());
        let obsolete: Vec<i64> = references
            .iter()
            .filter(|row| {
                row.entity != entity.shared_id
                    && row.has_template(relation_type)
                    && content.is_none_or(|c| {
                        row.entity_data.is_none() || row.entity_template() == Some(c)
                    })
                    && !values.contains(&row.entity)
            })
            .filter_map(|row| row.id)
            .collect();

        let pending: Vec<Relationship> = home.iter().filter(|row| row.id.is_none()).cloned().collect();
        if home.len() > 1 && !pending.is_empty() {
            debug!(property = %property.name, hub = %hub, added = pending.len(), "adding referenced entities");
            self.save(pending, language, MetadataPropagation::Skip)?;
        }

        if !obsolete.is_empty() {
            debug!(property = %property.name, removed = obsolete.len(), "dropping unreferenced entities");
            let query = RelationshipQuery {
                ids: Some(obsolete),
                ..RelationshipQuery::default()
            };
            self.delete(&query, language, MetadataPropagation::Skip)?;
        }

        Ok(())
    }
}

/// The last hub made only of `shared_id`'s own rows and rows typed
/// `relation_type`.
fn find_property_hub<'r>(
    hubs: &'r [Vec<Relationship>],
    shared_id: &str,
    relation_type: &str,
) -> Option<&'r Vec<Relationship>> {
    hubs.iter().rev().find(|hub| {
        hub.iter()
            .all(|row| row.entity == shared_id || row.has_template(relation_type))
    })
}
