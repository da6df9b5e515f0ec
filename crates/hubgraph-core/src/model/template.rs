//! Template schema contract and property change planning.
//!
//! Templates are owned by an external service; this module only reads the
//! parts the relationship engine depends on (relationship-typed properties)
//! and plans the metadata renames/unsets a template update implies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ErrorCode, GraphError, GraphResult};

/// Property kinds. Only [`PropertyType::Relationship`] drives the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Relationship,
    Select,
    Multiselect,
    Text,
    Date,
    Numeric,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Referenced template (or thesaurus) id. For relationship properties it
    /// restricts the template of valid targets.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "relationType")]
    pub relation_type: Option<String>,
    #[serde(default, rename = "inheritProperty")]
    pub inherit_property: Option<String>,
}

impl Property {
    #[must_use]
    pub fn relationship(
        name: impl Into<String>,
        relation_type: impl Into<String>,
        content: Option<&str>,
    ) -> Self {
        let name = name.into();
        Self {
            id: Some(name.clone()),
            label: name.clone(),
            name,
            property_type: PropertyType::Relationship,
            content: content.map(str::to_string),
            relation_type: Some(relation_type.into()),
            inherit_property: None,
        }
    }

    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.property_type == PropertyType::Relationship
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Template {
    /// Properties whose values are mirrored as relationships.
    pub fn relationship_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|prop| prop.is_relationship())
    }
}

/// Derive a metadata key from a property label.
#[must_use]
pub fn safe_name(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Metadata edits implied by replacing one template revision with another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyChanges {
    /// `old name -> new name`.
    pub renames: BTreeMap<String, String>,
    /// Metadata keys of removed properties.
    pub unsets: Vec<String>,
}

impl PropertyChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.unsets.is_empty()
    }
}

/// Plan the metadata renames and unsets for a template update.
///
/// Properties without a name get one from their label. Properties are matched
/// across revisions by id.
///
/// # Errors
///
/// Returns [`GraphError::Conflict`] when a property in `template` takes the
/// name of a different property in `current`.
pub fn plan_property_changes(
    template: &mut Template,
    current: &Template,
) -> GraphResult<PropertyChanges> {
    for property in &mut template.properties {
        if property.name.is_empty() {
            property.name = safe_name(&property.label);
        }
    }

    validate_swap_property_names(current, template)?;

    let mut changes = PropertyChanges::default();
    for property in &template.properties {
        let renamed = current
            .properties
            .iter()
            .find(|p| p.id.is_some() && p.id == property.id)
            .filter(|previous| previous.name != property.name);
        if let Some(previous) = renamed {
            changes
                .renames
                .insert(previous.name.clone(), property.name.clone());
        }
    }

    for previous in &current.properties {
        let kept = template
            .properties
            .iter()
            .any(|p| p.id.is_some() && p.id == previous.id);
        if !kept {
            changes.unsets.push(previous.name.clone());
        }
    }

    Ok(changes)
}

fn validate_swap_property_names(current: &Template, template: &Template) -> GraphResult<()> {
    for previous in &current.properties {
        let swapped = template
            .properties
            .iter()
            .any(|p| p.name == previous.name && p.id != previous.id);
        if swapped {
            return Err(GraphError::conflict(
                ErrorCode::PropertyNameConflict,
                format!("Properties can't swap names: {}", previous.name),
            ));
        }
    }
    Ok(())
}

/// Whether `property_id` of `template_id` may be removed: no other template
/// may inherit it through a relationship property.
#[must_use]
pub fn can_delete_property(templates: &[Template], template_id: &str, property_id: &str) -> bool {
    templates.iter().all(|template| {
        template.properties.iter().all(|property| {
            !(property.content.as_deref() == Some(template_id)
                && property.inherit_property.as_deref() == Some(property_id))
        })
    })
}
