//! Per-field search over the loaded page
//!
//! Each searchable field carries its own query. A row matches when every
//! field with a non-empty query contains that query (case-insensitive).
//! Only the rows currently in memory are searched.

use super::row::UiRow;
use super::schema::EntitySchema;
use std::collections::HashMap;

/// Field name -> query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    queries: HashMap<String, String>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query for a field; an empty query removes the filter
    pub fn set(&mut self, field: &str, query: &str) {
        if query.is_empty() {
            self.queries.remove(field);
        } else {
            self.queries.insert(field.to_string(), query.to_string());
        }
    }

    /// Raw query for a field (untrimmed, as typed)
    pub fn get(&self, field: &str) -> &str {
        self.queries.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn push_char(&mut self, field: &str, c: char) {
        self.queries.entry(field.to_string()).or_default().push(c);
    }

    pub fn pop_char(&mut self, field: &str) {
        if let Some(query) = self.queries.get_mut(field) {
            query.pop();
            if query.is_empty() {
                self.queries.remove(field);
            }
        }
    }

    pub fn clear(&mut self) {
        self.queries.clear();
    }

    /// Trimmed, lowercased queries restricted to the schema's searchable fields
    fn effective<'a>(&'a self, schema: &'a EntitySchema) -> Vec<(&'a str, String)> {
        self.queries
            .iter()
            .filter(|(field, _)| schema.is_searchable(field))
            .map(|(field, query)| (field.as_str(), query.trim().to_lowercase()))
            .filter(|(_, query)| !query.is_empty())
            .collect()
    }

    /// Whether any configured field has a non-blank query
    pub fn is_active(&self, schema: &EntitySchema) -> bool {
        !self.effective(schema).is_empty()
    }

    /// Rows of the loaded page that match; all rows when no search is active
    pub fn filter<'a>(&self, schema: &EntitySchema, rows: &'a [UiRow]) -> Vec<&'a UiRow> {
        let active = self.effective(schema);
        rows.iter().filter(|row| matches_all(&active, row)).collect()
    }

    /// Short summary for the table title, e.g. `partyFullName~john`
    pub fn summary(&self, schema: &EntitySchema) -> String {
        let mut parts: Vec<String> = self
            .effective(schema)
            .into_iter()
            .map(|(field, query)| format!("{}~{}", field, query))
            .collect();
        parts.sort();
        parts.join(" ")
    }
}

/// Whether `row` contains every (field, lowercased query) pair
fn matches_all(active: &[(&str, String)], row: &UiRow) -> bool {
    active
        .iter()
        .all(|(field, query)| row.cell(field).to_lowercase().contains(query.as_str()))
}
