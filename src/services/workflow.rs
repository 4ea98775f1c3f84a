//! Workflow action envelope used to submit records for approval

use crate::model::row::UiRow;
use crate::model::schema::EntitySchema;
use serde::{Deserialize, Serialize};

pub const APPROVE_ACTION: &str = "APPROVE";

/// Body of a workflow action `POST`.
///
/// `payload_json` is the record serialized to a JSON string, not a nested
/// object; the workflow service stores it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAction {
    pub reference_id: String,
    pub reference_type: String,
    pub module_name: String,
    pub action_key: String,
    pub payload_json: String,
}

impl WorkflowAction {
    /// Approval request for `row`, or `None` if the row has no identity
    pub fn approve(schema: &EntitySchema, row: &UiRow) -> Option<Self> {
        let reference_id = match (row.id, &row.uuid) {
            (Some(id), _) => id.to_string(),
            (None, Some(uuid)) => uuid.clone(),
            (None, None) => return None,
        };
        Some(Self {
            reference_id,
            reference_type: schema.module.clone(),
            module_name: schema.module.clone(),
            action_key: APPROVE_ACTION.to_string(),
            payload_json: row.raw.to_string(),
        })
    }
}
