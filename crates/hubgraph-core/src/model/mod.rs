//! Domain types shared by the store, the hub grouping engine and the
//! relationship engine.

pub mod entity;
pub mod relationship;
pub mod search;
pub mod template;

pub use entity::{Entity, EntityFile};
pub use relationship::{Relationship, RelationshipBatch, TextRange};
pub use search::{ConnectionQuery, SearchQuery, SearchResults, SearchRow, User};
pub use template::{Property, PropertyChanges, PropertyType, Template};

use serde::{Deserialize, Serialize};

/// A configured system language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSetting {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub default: bool,
}

/// Instance settings relevant to the relationship engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub languages: Vec<LanguageSetting>,
}

impl Settings {
    pub fn language_keys(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|language| language.key.as_str())
    }
}
