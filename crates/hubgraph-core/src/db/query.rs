//! Typed relationship queries and their SQL rendering.
//!
//! A [`RelationshipQuery`] is a conjunction of optional conditions. List
//! conditions match any listed value; an empty list matches nothing.

use rusqlite::types::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Relation-type condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFilter {
    /// Rows without a relation type.
    Untyped,
    /// Rows with exactly this relation type.
    Is(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hubs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateFilter>,
    /// `Some(true)` keeps only text-anchored rows, `Some(false)` only
    /// document-level rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_range: Option<bool>,
}

impl RelationshipQuery {
    #[must_use]
    pub fn by_id(id: i64) -> Self {
        Self {
            ids: Some(vec![id]),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_hub(hub: impl Into<String>) -> Self {
        Self::default().hub(hub)
    }

    #[must_use]
    pub fn by_hubs<I, S>(hubs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hubs: Some(hubs.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_entity(entity: impl Into<String>) -> Self {
        Self::default().entity(entity)
    }

    #[must_use]
    pub fn hub(mut self, hub: impl Into<String>) -> Self {
        self.hubs = Some(vec![hub.into()]);
        self
    }

    #[must_use]
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entities = Some(vec![entity.into()]);
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(TemplateFilter::Is(template.into()));
        self
    }

    #[must_use]
    pub fn untyped(mut self) -> Self {
        self.template = Some(TemplateFilter::Untyped);
        self
    }

    #[must_use]
    pub fn with_range(mut self) -> Self {
        self.has_range = Some(true);
        self
    }

    /// `true` when no condition is set, i.e. the query would match every row.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ids.is_none()
            && self.hubs.is_none()
            && self.entities.is_none()
            && self.language.is_none()
            && self.template.is_none()
            && self.has_range.is_none()
    }

    /// Render the conditions as a ` WHERE ...` clause (empty when
    /// unconditioned) plus positional parameters.
    pub(crate) fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref ids) = self.ids {
            push_in(&mut conditions, &mut param_values, "relationship_id", ids);
        }

        if let Some(ref hubs) = self.hubs {
            push_in(&mut conditions, &mut param_values, "hub", hubs);
        }

        if let Some(ref entities) = self.entities {
            push_in(&mut conditions, &mut param_values, "entity", entities);
        }

        if let Some(ref language) = self.language {
            param_values.push(Box::new(language.clone()));
            conditions.push(format!("language = ?{}", param_values.len()));
        }

        match self.template {
            Some(TemplateFilter::Untyped) => conditions.push("template IS NULL".to_string()),
            Some(TemplateFilter::Is(ref template)) => {
                param_values.push(Box::new(template.clone()));
                conditions.push(format!("template = ?{}", param_values.len()));
            }
            None => {}
        }

        match self.has_range {
            Some(true) => conditions.push("range_json IS NOT NULL".to_string()),
            Some(false) => conditions.push("range_json IS NULL".to_string()),
            None => {}
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        (clause, param_values)
    }
}

fn push_in<T>(
    conditions: &mut Vec<String>,
    param_values: &mut Vec<Box<dyn ToSql>>,
    column: &str,
    values: &[T],
) where
    T: ToSql + Clone + 'static,
{
    if values.is_empty() {
        conditions.push("0".to_string());
        return;
    }

    let mut placeholders = String::new();
    for (i, value) in values.iter().enumerate() {
        param_values.push(Box::new(value.clone()));
        if i > 0 {
            placeholders.push_str(", ");
        }
        let _ = write!(placeholders, "?{}", param_values.len());
    }
    conditions.push(format!("{column} IN ({placeholders})"));
}

/// Offset pagination for [`crate::db::RelationshipStore::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Pagination {
    pub(crate) fn sql_clause(self) -> String {
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }
}
