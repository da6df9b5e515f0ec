//! Hub grouping.
//!
//! A hub is every relationship row sharing one `hub` id. Seen from a parent
//! entity, a hub has at most one origin row (the parent's own endpoint) and
//! any number of target rows, bucketed by relation type.

pub mod grouping;
pub mod pagination;

pub use grouping::group_hubs;
pub use pagination::limit_hubs;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Entity, Relationship};

/// One logical connection as seen from a parent entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub hub: String,
    /// Position of first encounter while scanning the input rows.
    pub order: usize,
    /// The parent entity's own row in this hub.
    pub origin: Option<Relationship>,
    /// Target rows grouped by relation type, in first-seen template order.
    pub targets: Vec<TargetGroup>,
}

impl Hub {
    /// Number of target rows across all relation types.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.iter().map(|group| group.relationships.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub template: Option<String>,
    pub relationships: Vec<TargetRelationship>,
}

/// A target row together with its entity, stripped of that entity's own
/// connection list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRelationship {
    pub relationship: Relationship,
    pub entity: Entity,
}

/// Split rows into per-hub lists, in first-seen hub order, keeping row order
/// inside each hub.
#[must_use]
pub fn partition_by_hub(rows: &[Relationship]) -> Vec<Vec<Relationship>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut hubs: Vec<Vec<Relationship>> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.hub_id()).or_insert_with(|| {
            hubs.push(Vec::new());
            hubs.len() - 1
        });
        hubs[slot].push(row.clone());
    }

    hubs
}
