//! Label catalog - configurable display labels per language
//!
//! Labels arrive asynchronously per module and may land after the rows they
//! describe, so every lookup carries a hardcoded fallback and a raw config
//! id is never rendered.

use crate::services::api::LabelEntry;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_LANGUAGE: &str = "EN";

#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    /// (config id, language) -> label
    labels: HashMap<(String, String), String>,
    loaded_modules: HashSet<String>,
}

impl LabelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module's labels; blank labels are skipped
    pub fn load(&mut self, module: &str, entries: Vec<LabelEntry>) -> usize {
        self.loaded_modules.insert(module.to_string());
        let mut added = 0;
        for entry in entries {
            if entry.label.trim().is_empty() {
                continue;
            }
            self.labels.insert(
                (entry.config_id, entry.language_code.to_uppercase()),
                entry.label,
            );
            added += 1;
        }
        added
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.loaded_modules.contains(module)
    }

    /// Label for `config_id` in `language`, else `fallback`
    pub fn resolve<'a>(&'a self, config_id: &str, language: &str, fallback: &'a str) -> &'a str {
        self.labels
            .get(&(config_id.to_string(), language.to_uppercase()))
            .map(String::as_str)
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, lang: &str, label: &str) -> LabelEntry {
        LabelEntry {
            config_id: id.to_string(),
            language_code: lang.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_resolve_uses_fallback_until_loaded() {
        let mut catalog = LabelCatalog::new();
        assert_eq!(catalog.resolve("CDL_PTY_NAME", "EN", "Full Name"), "Full Name");

        catalog.load("PARTY", vec![entry("CDL_PTY_NAME", "en", "Party Name")]);
        assert!(catalog.is_loaded("PARTY"));
        assert_eq!(catalog.resolve("CDL_PTY_NAME", "EN", "Full Name"), "Party Name");
    }

    #[test]
    fn test_resolve_is_per_language() {
        let mut catalog = LabelCatalog::new();
        catalog.load(
            "PARTY",
            vec![
                entry("CDL_PTY_NAME", "EN", "Party Name"),
                entry("CDL_PTY_NAME", "AR", "اسم الطرف"),
            ],
        );
        assert_eq!(catalog.resolve("CDL_PTY_NAME", "ar", "x"), "اسم الطرف");
        assert_eq!(catalog.resolve("CDL_PTY_NAME", "FR", "Full Name"), "Full Name");
    }

    #[test]
    fn test_blank_labels_never_replace_fallback() {
        let mut catalog = LabelCatalog::new();
        assert_eq!(catalog.load("X", vec![entry("CDL_A", "EN", "  ")]), 0);
        assert_eq!(catalog.resolve("CDL_A", "EN", "Alpha"), "Alpha");
    }
}
