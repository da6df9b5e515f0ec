use std::collections::HashMap;

use super::{Hub, TargetGroup, TargetRelationship};
use crate::model::{Relationship, SearchRow};

#[derive(Debug)]
struct HubBuilder {
    order: usize,
    origin: Option<Relationship>,
    buckets: Vec<(Option<String>, Vec<TargetRelationship>)>,
}

impl HubBuilder {
    const fn new(order: usize) -> Self {
        Self {
            order,
            origin: None,
            buckets: Vec::new(),
        }
    }

    fn push_target(&mut self, target: TargetRelationship) {
        let template = target.relationship.template.clone();
        match self.buckets.iter_mut().find(|(t, _)| *t == template) {
            Some((_, rows)) => rows.push(target),
            None => self.buckets.push((template, vec![target])),
        }
    }

    fn finish(self, hub: String) -> Hub {
        Hub {
            hub,
            order: self.order,
            origin: self.origin,
            targets: self
                .buckets
                .into_iter()
                .map(|(template, relationships)| TargetGroup {
                    template,
                    relationships,
                })
                .collect(),
        }
    }
}

/// Group the connections of `rows` into hubs as seen from `parent`.
///
/// Rows are scanned in order; a hub's `order` is the index of its first
/// appearance. A connection on the parent's own row becomes the hub origin
/// (a later one replaces an earlier one); every other connection is a target
/// carrying its row's entity. Single-row hubs are kept: grouping reflects
/// stored rows, pruning happens on delete.
#[must_use]
pub fn group_hubs(rows: &[SearchRow], parent: &str) -> Vec<Hub> {
    let mut builders: HashMap<String, HubBuilder> = HashMap::new();

    for row in rows {
        let is_parent = row.entity.shared_id == parent;

        for connection in &row.connections {
            let next_order = builders.len();
            let builder = builders
                .entry(connection.hub_id().to_string())
                .or_insert_with(|| HubBuilder::new(next_order));

            if is_parent {
                builder.origin = Some(connection.clone());
            } else {
                builder.push_target(TargetRelationship {
                    relationship: connection.clone(),
                    entity: row.entity.clone(),
                });
            }
        }
    }

    let mut hubs: Vec<Hub> = builders
        .into_iter()
        .map(|(hub, builder)| builder.finish(hub))
        .collect();
    hubs.sort_by_key(|hub| hub.order);
    hubs
}
