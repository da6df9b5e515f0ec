use std::collections::HashSet;

use super::grouping::group_hubs;
use crate::model::SearchResults;

/// Apply hub-count pagination to search results seen from `parent`.
///
/// Always records `total_hubs` and `requested_hubs` (`0` when uncapped).
/// With a non-zero `hubs_limit`, only the first `hubs_limit` hubs survive:
/// each row keeps its connections into those hubs, in their original order,
/// and rows left without connections are dropped.
pub fn limit_hubs(results: &mut SearchResults, parent: &str, hubs_limit: Option<usize>) {
    let hubs = group_hubs(&results.rows, parent);
    let requested = hubs_limit.unwrap_or(0);

    results.total_hubs = hubs.len();
    results.requested_hubs = requested;

    if requested == 0 {
        return;
    }

    let kept: HashSet<&str> = hubs
        .iter()
        .take(requested)
        .map(|hub| hub.hub.as_str())
        .collect();

    results.rows.retain_mut(|row| {
        row.connections
            .retain(|connection| kept.contains(connection.hub_id()));
        !row.connections.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, Relationship, SearchRow};

    fn row(shared_id: &str, hubs: &[&str]) -> SearchRow {
        SearchRow {
            entity: Entity::new(shared_id, "en"),
            connections: hubs
                .iter()
                .map(|hub| Relationship::to_entity(shared_id).in_hub(*hub))
                .collect(),
        }
    }

    fn results(rows: Vec<SearchRow>) -> SearchResults {
        SearchResults {
            total_rows: rows.len(),
            rows,
            ..SearchResults::default()
        }
    }

    #[test]
    fn uncapped_results_only_get_counts() {
        let mut res = results(vec![row("b", &["h1", "h2"]), row("a", &["h1", "h2"])]);
        let before = res.rows.clone();

        limit_hubs(&mut res, "a", None);
        assert_eq!(res.total_hubs, 2);
        assert_eq!(res.requested_hubs, 0);
        assert_eq!(res.rows, before);
    }

    #[test]
    fn zero_limit_means_uncapped() {
        let mut res = results(vec![row("b", &["h1", "h2"])]);
        limit_hubs(&mut res, "a", Some(0));
        assert_eq!(res.rows[0].connections.len(), 2);
    }

    #[test]
    fn cap_keeps_first_hubs_and_drops_empty_rows() {
        let mut res = results(vec![
            row("b", &["h1"]),
            row("c", &["h2", "h3"]),
            row("d", &["h3"]),
            row("a", &["h3", "h1", "h2"]),
        ]);

        limit_hubs(&mut res, "a", Some(2));
        assert_eq!(res.total_hubs, 3);
        assert_eq!(res.requested_hubs, 2);

        let shared: Vec<&str> = res.rows.iter().map(|r| r.entity.shared_id.as_str()).collect();
        assert_eq!(shared, vec!["b", "c", "a"]);

        let origin_hubs: Vec<&str> = res.rows[2].connections.iter().map(|c| c.hub_id()).collect();
        assert_eq!(origin_hubs, vec!["h1", "h2"]);
    }
}
