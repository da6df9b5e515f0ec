use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `store.path`.
pub const DB_PATH_ENV: &str = "HUBGRAPH_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size forced on the delegated search; hub pagination happens afterwards.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Id that matches no entity, used when an allow-list would be empty.
    #[serde(default = "default_empty_result_sentinel")]
    pub empty_result_sentinel: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            empty_result_sentinel: default_empty_result_sentinel(),
        }
    }
}

/// Load `.hubgraph/config.toml` under `project_root`, falling back to
/// defaults when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<GraphConfig> {
    let path = project_root.join(".hubgraph/config.toml");
    if !path.exists() {
        return Ok(GraphConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<GraphConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the project config and apply environment overrides.
///
/// A relative `store.path` is resolved against `project_root`.
///
/// # Errors
///
/// Returns an error if the project config cannot be read or parsed.
pub fn resolve_config(project_root: &Path) -> Result<GraphConfig> {
    let mut config = load_config(project_root)?;
    apply_overrides(&mut config, env::var(DB_PATH_ENV).ok());

    if config.store.path.is_relative() {
        config.store.path = project_root.join(&config.store.path);
    }

    Ok(config)
}

fn apply_overrides(config: &mut GraphConfig, env_db_path: Option<String>) {
    if let Some(path) = env_db_path.filter(|p| !p.trim().is_empty()) {
        config.store.path = PathBuf::from(path);
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".hubgraph/relationships.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_page_size() -> usize {
    9999
}

fn default_empty_result_sentinel() -> String {
    "no_results".to_string()
}
