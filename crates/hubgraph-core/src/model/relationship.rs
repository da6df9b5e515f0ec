use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Text anchor inside an entity's primary file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: u64,
    pub end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One endpoint of a hub: `entity` participates in `hub`, optionally typed by
/// a relation-type `template`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub: Option<String>,
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
    /// File revision a text anchor points into; stamped at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Joined target entity. Never persisted.
    #[serde(default, rename = "entityData", skip_serializing_if = "Option::is_none")]
    pub entity_data: Option<Entity>,
}

impl Relationship {
    /// A new, unsaved row pointing at `entity`.
    #[must_use]
    pub fn to_entity(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_hub(mut self, hub: impl Into<String>) -> Self {
        self.hub = Some(hub.into());
        self
    }

    #[must_use]
    pub fn typed(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn anchored(mut self, range: TextRange) -> Self {
        self.range = Some(range);
        self
    }

    #[must_use]
    pub fn hub_id(&self) -> &str {
        self.hub.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn has_template(&self, template: &str) -> bool {
        self.template.as_deref() == Some(template)
    }

    /// Template of the joined target entity, if any.
    #[must_use]
    pub fn entity_template(&self) -> Option<&str> {
        self.entity_data
            .as_ref()
            .and_then(|entity| entity.template.as_deref())
    }

    /// `template + targetTemplate` key used by connection search filters.
    ///
    /// Missing parts render as `null`, which is how the presentation layer
    /// spells untyped connections in its filter keys.
    #[must_use]
    pub fn composite_key(&self) -> String {
        format!(
            "{}{}",
            self.template.as_deref().unwrap_or("null"),
            self.entity_template().unwrap_or("null")
        )
    }

    /// Sort key giving reproducible pagination across calls.
    pub(crate) fn entity_hub_key(&self) -> String {
        format!("{}{}", self.entity, self.hub_id())
    }
}

/// One batch in a [`crate::BulkRequest`]: either a lone row or a whole hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipBatch {
    One(Relationship),
    Many(Vec<Relationship>),
}

impl RelationshipBatch {
    #[must_use]
    pub fn into_vec(self) -> Vec<Relationship> {
        match self {
            Self::One(row) => vec![row],
            Self::Many(rows) => rows,
        }
    }
}

impl From<Relationship> for RelationshipBatch {
    fn from(row: Relationship) -> Self {
        Self::One(row)
    }
}

impl From<Vec<Relationship>> for RelationshipBatch {
    fn from(rows: Vec<Relationship>) -> Self {
        Self::Many(rows)
    }
}
