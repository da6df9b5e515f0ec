//! Reference synchronization between relationship-typed metadata and hubs.

mod support;

use hubgraph_core::db::RelationshipQuery;
use hubgraph_core::model::{Entity, Property, Template};
use hubgraph_core::ErrorCode;
use serde_json::json;
use support::{Fixture, entities_of};

fn fixture_with_template(content: Option<&str>) -> Fixture {
    let fx = Fixture::new();
    fx.add_template(Template {
        id: "tpl".into(),
        name: "Person".into(),
        properties: vec![Property::relationship("friends", "T1", content)],
    });
    fx.add_entities(&["A", "B", "C", "D"], "person", &["en"]);
    fx
}

fn person(friends: &serde_json::Value) -> Entity {
    Entity::new("A", "en")
        .with_template("tpl")
        .with_metadata("friends", friends.clone())
}

#[test]
fn first_sync_creates_a_hub_for_the_references() {
    let fx = fixture_with_template(None);

    fx.engine()
        .synchronize(&person(&json!(["B", "C"])), "en")
        .expect("synchronize");

    let rows = fx.all_rows();
    assert_eq!(entities_of(&rows), vec!["A", "B", "C"]);
    assert!(rows.iter().all(|row| row.hub_id() == rows[0].hub_id()));
    assert_eq!(rows[0].template, None);
    assert!(rows[1..].iter().all(|row| row.has_template("T1")));
    assert!(rows.iter().all(|row| row.language.as_deref() == Some("en")));
    assert!(fx.entities.updates().is_empty());
}

#[test]
fn second_sync_changes_nothing() {
    let fx = fixture_with_template(None);
    let entity = person(&json!(["B", "C"]));

    fx.engine().synchronize(&entity, "en").expect("first sync");
    let before = fx.all_rows();
    fx.engine().synchronize(&entity, "en").expect("second sync");

    assert_eq!(fx.all_rows(), before);
}

#[test]
fn string_value_counts_as_single_reference() {
    let fx = fixture_with_template(None);

    fx.engine()
        .synchronize(&person(&json!("B")), "en")
        .expect("synchronize");

    assert_eq!(entities_of(&fx.all_rows()), vec!["A", "B"]);
}

#[test]
fn new_references_join_the_existing_property_hub() {
    let fx = fixture_with_template(None);
    fx.seed_hub("h1", "en", &[("A", None), ("B", Some("T1"))]);

    fx.engine()
        .synchronize(&person(&json!(["B", "D"])), "en")
        .expect("synchronize");

    assert_eq!(entities_of(&fx.hub_rows("h1")), vec!["A", "B", "D"]);
    assert_eq!(fx.all_rows().len(), 3);
}

#[test]
fn mixed_hubs_are_left_alone_and_a_new_hub_is_made() {
    let fx = fixture_with_template(None);
    fx.seed_hub("mixed", "en", &[("A", None), ("B", Some("T1")), ("C", Some("T2"))]);

    fx.engine()
        .synchronize(&person(&json!(["B", "D"])), "en")
        .expect("synchronize");

    assert_eq!(fx.hub_rows("mixed").len(), 3);
    let added = fx.rows(&RelationshipQuery::by_entity("D"));
    assert_eq!(added.len(), 1);
    let new_hub = fx.hub_rows(added[0].hub_id());
    assert_eq!(entities_of(&new_hub), vec!["A", "D"]);
}

#[test]
fn dropped_references_are_deleted() {
    let fx = fixture_with_template(None);
    fx.engine()
        .synchronize(&person(&json!(["B", "C"])), "en")
        .expect("first sync");

    fx.engine()
        .synchronize(&person(&json!(["B"])), "en")
        .expect("drop C");

    assert_eq!(entities_of(&fx.all_rows()), vec!["A", "B"]);
}

#[test]
fn clearing_the_property_removes_the_hub() {
    let fx = fixture_with_template(None);
    fx.engine()
        .synchronize(&person(&json!(["B"])), "en")
        .expect("first sync");

    fx.engine()
        .synchronize(&person(&json!([])), "en")
        .expect("clear");

    assert!(fx.all_rows().is_empty());
}

#[test]
fn restricted_property_only_drops_targets_of_its_template() {
    let fx = fixture_with_template(Some("person"));
    fx.add_entity(Entity::new("Org", "en").with_template("organization"));
    fx.seed_hub("h1", "en", &[("A", None), ("B", Some("T1")), ("Org", Some("T1"))]);

    fx.engine()
        .synchronize(&person(&json!([])), "en")
        .expect("synchronize");

    assert_eq!(entities_of(&fx.hub_rows("h1")), vec!["A", "Org"]);
}

#[test]
fn restricted_property_drops_targets_that_no_longer_exist() {
    let fx = fixture_with_template(Some("person"));
    fx.seed_hub("h1", "en", &[("A", None), ("B", Some("T1")), ("Gone", Some("T1"))]);

    fx.engine()
        .synchronize(&person(&json!(["B"])), "en")
        .expect("synchronize");

    assert_eq!(entities_of(&fx.hub_rows("h1")), vec!["A", "B"]);
}

#[test]
fn other_languages_are_untouched() {
    let fx = fixture_with_template(None);
    fx.seed_hub("h-es", "es", &[("A", None), ("C", Some("T1"))]);

    fx.engine()
        .synchronize(&person(&json!(["B"])), "en")
        .expect("synchronize");

    assert_eq!(entities_of(&fx.hub_rows("h-es")), vec!["A", "C"]);
}

#[test]
fn entity_without_template_is_ignored() {
    let fx = fixture_with_template(None);
    let entity = Entity::new("A", "en").with_metadata("friends", json!(["B"]));

    fx.engine().synchronize(&entity, "en").expect("no-op");
    assert!(fx.all_rows().is_empty());
}

#[test]
fn unknown_template_is_not_found() {
    let fx = Fixture::new();
    let entity = Entity::new("A", "en").with_template("missing");

    let err = fx.engine().synchronize(&entity, "en").expect_err("unknown template");
    assert_eq!(err.code(), ErrorCode::TemplateNotFound);
}
