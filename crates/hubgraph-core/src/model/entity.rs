use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Primary file attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A content entity as exposed by the entities service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "sharedId")]
    pub shared_id: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<EntityFile>,
    #[serde(default)]
    pub published: bool,
}

impl Entity {
    #[must_use]
    pub fn new(shared_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            shared_id: shared_id.into(),
            language: language.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, filename: impl Into<String>) -> Self {
        self.file = Some(EntityFile {
            filename: filename.into(),
            language: None,
        });
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, name: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(name.into(), value);
        self
    }

    /// Values of a reference-typed metadata property.
    ///
    /// A bare string is a singleton list; non-string array members and any
    /// other shape are ignored.
    #[must_use]
    pub fn reference_values(&self, property: &str) -> Vec<String> {
        match self.metadata.get(property) {
            Some(Value::String(value)) => vec![value.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}
