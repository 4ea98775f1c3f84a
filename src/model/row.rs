//! Row projection - flattening server DTOs into display rows
//!
//! Projection is pure and total: the DTO is merged with the schema's
//! defaults once, then every column resolves to a string. Absent values
//! become [`NOT_AVAILABLE`] so search and sort never see holes.

use super::schema::EntitySchema;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Sentinel shown for absent or empty values
pub const NOT_AVAILABLE: &str = "N/A";

/// Numeric record id as issued by the backend
pub type RowId = i64;

/// A flattened, display-ready record
#[derive(Debug, Clone, PartialEq)]
pub struct UiRow {
    pub id: Option<RowId>,
    pub uuid: Option<String>,
    pub status: String,
    /// Human-readable label used in dialogs and the status bar
    pub label: String,
    /// Column key -> display string
    pub cells: BTreeMap<String, String>,
    /// The merged DTO, kept so edits can start from the full record
    pub raw: Value,
}

impl UiRow {
    /// Display value for a column key; unknown keys read as `N/A`
    pub fn cell(&self, key: &str) -> &str {
        self.cells.get(key).map(String::as_str).unwrap_or(NOT_AVAILABLE)
    }

    /// `label (#id)` as echoed in confirmation dialogs
    pub fn describe(&self) -> String {
        match self.id {
            Some(id) => format!("{} (#{})", self.label, id),
            None => self.label.clone(),
        }
    }
}

/// Resolve a dot path (`a.b.0.c`) inside a JSON value
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Stringify a JSON value for display
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(Value::Array(items)) if items.is_empty() => NOT_AVAILABLE.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_value(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        // Nested reference DTOs conventionally carry a `name`
        Some(Value::Object(map)) => display_value(map.get("name")),
    }
}

/// Deep-merge `defaults` under `dto`, filling only absent or null keys
pub fn merge_defaults(dto: &Value, defaults: &Value) -> Value {
    match (dto, defaults) {
        (Value::Null, d) => d.clone(),
        (Value::Object(values), Value::Object(fallbacks)) => {
            let mut merged: Map<String, Value> = values.clone();
            for (key, fallback) in fallbacks {
                let next = match values.get(key) {
                    Some(existing) => merge_defaults(existing, fallback),
                    None => fallback.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (v, _) => v.clone(),
    }
}

/// Project one DTO into a row for the given schema
pub fn project_row(schema: &EntitySchema, dto: &Value) -> UiRow {
    let merged = merge_defaults(dto, &schema.defaults);

    let cells = schema
        .columns
        .iter()
        .map(|column| (column.key.clone(), display_value(lookup(&merged, &column.path))))
        .collect();

    let status = match lookup(&merged, &schema.status_path).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => schema.default_status.clone(),
    };

    let id = merged.get("id").and_then(Value::as_i64);
    let uuid = merged
        .get("uuid")
        .and_then(Value::as_str)
        .map(str::to_string);

    let label = match display_value(lookup(&merged, &schema.label_path)) {
        l if l != NOT_AVAILABLE => l,
        _ => match (id, &uuid) {
            (Some(id), _) => format!("#{}", id),
            (None, Some(uuid)) => uuid.clone(),
            (None, None) => NOT_AVAILABLE.to_string(),
        },
    };

    UiRow {
        id,
        uuid,
        status,
        label,
        cells,
        raw: merged,
    }
}

/// Project a full page of DTOs
pub fn project_page(schema: &EntitySchema, content: &[Value]) -> Vec<UiRow> {
    content.iter().map(|dto| project_row(schema, dto)).collect()
}
