use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::entity::Entity;
use super::relationship::Relationship;

/// Caller identity forwarded untouched to the search service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub role: String,
}

/// Query understood by the external search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, rename = "searchTerm", skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    /// Restrict results to these shared ids. `None` means unrestricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, rename = "includeUnpublished")]
    pub include_unpublished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Search-service options this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query for [`crate::Relationships::search`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionQuery {
    /// Filter group -> allowed `template + targetTemplate` composite keys.
    /// Groups are flattened; no keys at all means no restriction.
    #[serde(default)]
    pub filter: BTreeMap<String, Vec<String>>,
    /// Maximum number of hubs to return; `None` or `0` returns every hub.
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(flatten)]
    pub search: SearchQuery,
}

impl ConnectionQuery {
    pub(crate) fn allowed_keys(&self) -> Vec<&str> {
        self.filter
            .values()
            .flat_map(|keys| keys.iter().map(String::as_str))
            .collect()
    }
}

/// A search hit together with the connections attached to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRow {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default)]
    pub connections: Vec<Relationship>,
}

impl From<Entity> for SearchRow {
    fn from(entity: Entity) -> Self {
        Self {
            entity,
            connections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub rows: Vec<SearchRow>,
    #[serde(default, rename = "totalRows")]
    pub total_rows: usize,
    /// Number of hubs before hub pagination.
    #[serde(default, rename = "totalHubs")]
    pub total_hubs: usize,
    /// Hub cap requested by the caller; `0` when uncapped.
    #[serde(default, rename = "requestedHubs")]
    pub requested_hubs: usize,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub aggregations: Value,
}
