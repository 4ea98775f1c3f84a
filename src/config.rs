use crate::model::labels::DEFAULT_LANGUAGE;
use crate::model::mutation::DEFAULT_SETTLE_DELAY;
use crate::model::pagination::DEFAULT_PAGE_SIZE;
use crate::model::schema::{EntitySchema, SchemaRegistry};
use crate::services::api::Endpoints;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Page sizes offered by the rows-per-page selector
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 20, 50, 100];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// Schema shown on startup
    pub default_resource: String,
    pub page_size: usize,
    pub language: String,
    /// Wait after a successful mutation before refetching
    pub settle_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub labels_path: String,
    pub workflow_path: String,
    pub documents_path: String,
    pub upload_path: String,
    /// Extra or overriding entity schemas
    pub schemas: Vec<EntitySchema>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            default_resource: "agreements".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            language: DEFAULT_LANGUAGE.to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            request_timeout_secs: 30,
            labels_path: "/api/app-language-translation/module".to_string(),
            workflow_path: "/api/workflow/actions".to_string(),
            documents_path: "/api/real-estate-documents".to_string(),
            upload_path: "/api/real-estate-documents/upload".to_string(),
            schemas: Vec::new(),
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".escrow-admin"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Default log file location
    pub fn log_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("escrow-admin.log"))
    }

    /// Load the user config, falling back to defaults when absent
    pub fn load() -> anyhow::Result<Config> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Config> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Save the config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            base_url: self.base_url.clone(),
            labels_path: self.labels_path.clone(),
            workflow_path: self.workflow_path.clone(),
            documents_path: self.documents_path.clone(),
            upload_path: self.upload_path.clone(),
        }
    }

    /// Built-in schemas with the configured ones merged over them
    pub fn registry(&self) -> SchemaRegistry {
        let mut registry = SchemaRegistry::builtin();
        registry.merge(self.schemas.clone());
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            base_url: "https://escrow.example.test".to_string(),
            page_size: 50,
            language: "AR".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "base_url": "http://10.0.0.5:8080", "settle_delay_ms": 0 }"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, "http://10.0.0.5:8080");
        assert_eq!(loaded.settle_delay(), Duration::ZERO);
        assert_eq!(loaded.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(loaded.default_resource, "agreements");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_registry_merges_configured_schemas() {
        let config = Config {
            schemas: vec![EntitySchema::builder("banks", "Banks", "/api/banks").build()],
            ..Config::default()
        };
        let registry = config.registry();
        assert!(registry.get("banks").is_some());
        assert!(registry.get("agreements").is_some());
    }
}
