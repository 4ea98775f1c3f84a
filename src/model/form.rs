//! Create/edit form state and payload building
//!
//! Values are edited as strings and validated before anything is sent.
//! Payloads are built by writing each field into its dot path; an edit
//! starts from the full record so fields the form does not show survive
//! the round trip.

use super::mutation::MutationKind;
use super::row::{lookup, RowId, UiRow};
use super::schema::{EntitySchema, FieldKind, FieldSpec};
use crate::error::FormError;
use chrono::NaiveDate;
use regex::Regex;
use serde_json::{json, Map, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: RowId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub spec: FieldSpec,
    pub value: String,
    original: String,
}

impl FormField {
    fn new(spec: FieldSpec, value: String) -> Self {
        Self {
            spec,
            original: value.clone(),
            value,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.value.trim() != self.original.trim()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub mode: FormMode,
    pub fields: Vec<FormField>,
    pub focus: usize,
    /// Record being edited (merged DTO), `Null` when creating
    base: Value,
}

/// String a JSON value is edited as
fn input_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Object(map)) => input_value(map.get("name")),
        Some(Value::Array(_)) => String::new(),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "yes" | "y" | "1")
}

/// Write `new` at a dot path, creating intermediate objects
pub fn set_path(target: &mut Value, path: &str, new: Value) {
    let mut current = target;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), new);
            return;
        }
        current = map.entry(segment.to_string()).or_insert(Value::Null);
    }
}

impl FormState {
    /// Blank form for a new record; flags start from the schema defaults
    pub fn create(schema: &EntitySchema) -> Self {
        let fields = schema
            .form
            .iter()
            .map(|spec| {
                let initial = match spec.kind {
                    FieldKind::Flag => {
                        let default = lookup(&schema.defaults, &spec.path).and_then(Value::as_bool);
                        default.unwrap_or(true).to_string()
                    }
                    _ => input_value(lookup(&schema.defaults, &spec.path)),
                };
                FormField::new(spec.clone(), initial)
            })
            .collect();
        Self {
            mode: FormMode::Create,
            fields,
            focus: 0,
            base: Value::Null,
        }
    }

    /// Form pre-filled from an existing row; `None` if the row has no id
    pub fn edit(schema: &EntitySchema, row: &UiRow) -> Option<Self> {
        let id = row.id?;
        let fields = schema
            .form
            .iter()
            .map(|spec| FormField::new(spec.clone(), input_value(lookup(&row.raw, &spec.path))))
            .collect();
        Some(Self {
            mode: FormMode::Edit { id },
            fields,
            focus: 0,
            base: row.raw.clone(),
        })
    }

    pub fn kind(&self) -> MutationKind {
        match self.mode {
            FormMode::Create => MutationKind::Create,
            FormMode::Edit { id } => MutationKind::Update(id),
        }
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Type into the focused field; flags toggle instead
    pub fn push_char(&mut self, c: char) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match field.spec.kind {
            FieldKind::Flag if c == ' ' => {
                field.value = (!is_truthy(&field.value)).to_string();
            }
            FieldKind::Flag => {}
            _ => {
                if field.spec.max_len.map_or(true, |max| field.value.chars().count() < max) {
                    field.value.push(c);
                }
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if field.spec.kind != FieldKind::Flag {
                field.value.pop();
            }
        }
    }

    /// Set a field by key (used by tests and prefill)
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.spec.key == key) {
            field.value = value.to_string();
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.spec.key == key)
            .map(|f| f.value.as_str())
    }

    pub fn is_dirty(&self) -> bool {
        self.fields.iter().any(FormField::is_changed)
    }

    /// Check every field; the first problem wins
    pub fn validate(&self) -> Result<(), FormError> {
        for field in &self.fields {
            validate_field(&field.spec, field.value.trim())?;
        }
        Ok(())
    }

    /// Validate and produce the request body.
    ///
    /// Edits submitted without changes fail with `NoChanges`. New records
    /// get `enabled: true` and `deleted: false` unless the form set them.
    pub fn build_payload(&self) -> Result<Value, FormError> {
        self.validate()?;
        if matches!(self.mode, FormMode::Edit { .. }) && !self.is_dirty() {
            return Err(FormError::NoChanges);
        }

        let mut payload = match &self.base {
            Value::Object(_) => self.base.clone(),
            _ => Value::Object(Map::new()),
        };
        for field in &self.fields {
            let trimmed = field.value.trim();
            if trimmed.is_empty() && self.mode == FormMode::Create && field.spec.kind != FieldKind::Flag {
                continue;
            }
            set_path(&mut payload, &field.spec.path, typed_value(&field.spec, trimmed));
        }

        if self.mode == FormMode::Create {
            if let Value::Object(map) = &mut payload {
                map.entry("enabled").or_insert(json!(true));
                map.entry("deleted").or_insert(json!(false));
            }
        }
        Ok(payload)
    }
}

fn validate_field(spec: &FieldSpec, value: &str) -> Result<(), FormError> {
    let invalid = |reason: &str| FormError::Invalid {
        field: spec.fallback_label.clone(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        if spec.required && spec.kind != FieldKind::Flag {
            return Err(FormError::Required(spec.fallback_label.clone()));
        }
        return Ok(());
    }
    if let Some(max) = spec.max_len {
        if value.chars().count() > max {
            return Err(invalid(&format!("must be at most {} characters", max)));
        }
    }
    match spec.kind {
        FieldKind::Number if value.parse::<f64>().is_err() => {
            return Err(invalid("must be a number"));
        }
        FieldKind::Date if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() => {
            return Err(invalid("must be a date (YYYY-MM-DD)"));
        }
        _ => {}
    }
    if let Some(pattern) = &spec.pattern {
        let re = Regex::new(pattern).map_err(|_| invalid("has an unusable format rule"))?;
        if !re.is_match(value) {
            return Err(invalid("has an invalid format"));
        }
    }
    Ok(())
}

fn typed_value(spec: &FieldSpec, value: &str) -> Value {
    match spec.kind {
        _ if value.is_empty() && spec.kind != FieldKind::Flag => Value::Null,
        FieldKind::Flag => Value::Bool(is_truthy(value)),
        FieldKind::Number => value
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| value.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number))
            .unwrap_or(Value::Null),
        FieldKind::Text | FieldKind::Date => Value::String(value.to_string()),
    }
}
