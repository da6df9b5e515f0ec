//! In-memory collaborators and seeding helpers shared by the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::{Result, bail};
use hubgraph_core::Relationships;
use hubgraph_core::db::{Pagination, RelationshipQuery, RelationshipStore, SqliteRelationshipStore};
use hubgraph_core::model::{
    Entity, LanguageSetting, Relationship, SearchQuery, SearchResults, SearchRow, Settings,
    Template, User,
};
use hubgraph_core::services::{EntitiesService, SearchService, SettingsService, TemplatesService};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Route engine logs to the test harness. Filter with `HUBGRAPH_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("HUBGRAPH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("hubgraph_core=debug,warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_test_writer())
        .try_init();
}

#[derive(Default)]
pub struct FakeEntities {
    entities: Mutex<Vec<Entity>>,
    updates: Mutex<Vec<(Vec<String>, String)>>,
    fail_updates: Mutex<bool>,
}

impl FakeEntities {
    /// Every `update_metadata_from_relationships` call, in order.
    pub fn updates(&self) -> Vec<(Vec<String>, String)> {
        self.updates.lock().expect("updates lock").clone()
    }

    pub fn clear_updates(&self) {
        self.updates.lock().expect("updates lock").clear();
    }

    pub fn fail_updates(&self) {
        *self.fail_updates.lock().expect("fail lock") = true;
    }
}

impl EntitiesService for FakeEntities {
    fn get_by_id(&self, shared_id: &str, language: &str) -> Result<Option<Entity>> {
        Ok(self
            .entities
            .lock()
            .expect("entities lock")
            .iter()
            .find(|e| e.shared_id == shared_id && e.language == language)
            .cloned())
    }

    fn get_many(&self, shared_ids: &[String], language: &str) -> Result<Vec<Entity>> {
        Ok(self
            .entities
            .lock()
            .expect("entities lock")
            .iter()
            .filter(|e| e.language == language && shared_ids.contains(&e.shared_id))
            .cloned()
            .collect())
    }

    fn update_metadata_from_relationships(&self, entity_ids: &[String], language: &str) -> Result<()> {
        if *self.fail_updates.lock().expect("fail lock") {
            bail!("metadata index unavailable");
        }
        self.updates
            .lock()
            .expect("updates lock")
            .push((entity_ids.to_vec(), language.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTemplates {
    templates: Mutex<Vec<Template>>,
}

impl TemplatesService for FakeTemplates {
    fn get_by_id(&self, template_id: &str) -> Result<Option<Template>> {
        Ok(self
            .templates
            .lock()
            .expect("templates lock")
            .iter()
            .find(|t| t.id == template_id)
            .cloned())
    }
}

pub struct FakeSettings {
    languages: Vec<String>,
}

impl SettingsService for FakeSettings {
    fn get(&self) -> Result<Settings> {
        Ok(Settings {
            languages: self
                .languages
                .iter()
                .enumerate()
                .map(|(i, key)| LanguageSetting {
                    key: key.clone(),
                    label: key.to_uppercase(),
                    default: i == 0,
                })
                .collect(),
        })
    }
}

/// Search index that returns every indexed entity whose id is requested,
/// in index order.
#[derive(Default)]
pub struct FakeSearch {
    index: Mutex<Vec<Entity>>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl FakeSearch {
    pub fn last_query(&self) -> SearchQuery {
        self.queries
            .lock()
            .expect("queries lock")
            .last()
            .cloned()
            .expect("search was called")
    }
}

impl SearchService for FakeSearch {
    fn search(&self, query: &SearchQuery, language: &str, _user: Option<&User>) -> Result<SearchResults> {
        self.queries.lock().expect("queries lock").push(query.clone());

        let rows: Vec<SearchRow> = self
            .index
            .lock()
            .expect("index lock")
            .iter()
            .filter(|e| e.language == language)
            .filter(|e| e.published || query.include_unpublished)
            .filter(|e| query.ids.as_ref().is_none_or(|ids| ids.contains(&e.shared_id)))
            .cloned()
            .map(SearchRow::from)
            .collect();

        Ok(SearchResults {
            total_rows: rows.len(),
            rows,
            ..SearchResults::default()
        })
    }
}

pub struct Fixture {
    pub store: SqliteRelationshipStore,
    pub entities: FakeEntities,
    pub templates: FakeTemplates,
    pub settings: FakeSettings,
    pub search: FakeSearch,
}

impl Fixture {
    /// Fixture configured with `en` and `es`.
    pub fn new() -> Self {
        Self::with_languages(&["en", "es"])
    }

    pub fn with_languages(languages: &[&str]) -> Self {
        init_tracing();
        Self {
            store: SqliteRelationshipStore::in_memory().expect("open in-memory store"),
            entities: FakeEntities::default(),
            templates: FakeTemplates::default(),
            settings: FakeSettings {
                languages: languages.iter().map(|l| (*l).to_string()).collect(),
            },
            search: FakeSearch::default(),
        }
    }

    pub fn engine(&self) -> Relationships<'_> {
        Relationships::new(
            &self.store,
            &self.entities,
            &self.templates,
            &self.settings,
            &self.search,
        )
    }

    /// Register an entity with both the entities service and the search index.
    pub fn add_entity(&self, entity: Entity) {
        self.search.index.lock().expect("index lock").push(entity.clone());
        self.entities.entities.lock().expect("entities lock").push(entity);
    }

    /// Register `shared_id` in every listed language, typed with `template`.
    pub fn add_entities(&self, shared_ids: &[&str], template: &str, languages: &[&str]) {
        for language in languages {
            for shared_id in shared_ids {
                self.add_entity(Entity::new(*shared_id, *language).with_template(template));
            }
        }
    }

    pub fn add_template(&self, template: Template) {
        self.templates.templates.lock().expect("templates lock").push(template);
    }

    /// Insert rows straight into the store. Each member is `(entity, relation type)`.
    pub fn seed_hub(&self, hub: &str, language: &str, members: &[(&str, Option<&str>)]) -> Vec<Relationship> {
        members
            .iter()
            .map(|(entity, template)| {
                let mut row = Relationship::to_entity(*entity).in_hub(hub).with_language(language);
                row.template = template.map(str::to_string);
                self.store.save(&row).expect("seed relationship")
            })
            .collect()
    }

    pub fn rows(&self, query: &RelationshipQuery) -> Vec<Relationship> {
        self.store
            .get(query, Pagination::default())
            .expect("query relationships")
    }

    pub fn hub_rows(&self, hub: &str) -> Vec<Relationship> {
        self.rows(&RelationshipQuery::by_hub(hub))
    }

    pub fn all_rows(&self) -> Vec<Relationship> {
        self.rows(&RelationshipQuery::default())
    }
}

pub fn entities_of(rows: &[Relationship]) -> Vec<&str> {
    rows.iter().map(|row| row.entity.as_str()).collect()
}
