//! In-memory `ResourceApi` used by tests

use super::api::{DocumentPage, LabelEntry, PageResponse, ResourceApi};
use super::documents::{DocumentEntry, DocumentUpload};
use super::query::ListQuery;
use super::workflow::WorkflowAction;
use crate::error::ApiError;
use crate::model::pagination::{page_count, PageMeta, PageRequest};
use crate::model::row::RowId;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct StubState {
    records: BTreeMap<String, Vec<Value>>,
    labels: Vec<LabelEntry>,
    workflow: Vec<WorkflowAction>,
    documents: Vec<Value>,
    next_id: i64,
    calls: Vec<String>,
    fail_next: Option<ApiError>,
}

/// Echoing stub: creates assign ids, updates replace, deletes remove
#[derive(Default)]
pub struct StubApi {
    state: Mutex<StubState>,
}

impl StubApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.state.lock().unwrap().next_id = 1000;
        api
    }

    pub fn with_records(self, resource: &str, records: Vec<Value>) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .insert(resource.to_string(), records);
        self
    }

    pub fn with_labels(self, labels: Vec<LabelEntry>) -> Self {
        self.state.lock().unwrap().labels = labels;
        self
    }

    /// Make the next call fail with `err`
    pub fn fail_next(&self, err: ApiError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, resource: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .records
            .get(resource)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn workflow_actions(&self) -> Vec<WorkflowAction> {
        self.state.lock().unwrap().workflow.clone()
    }

    fn begin(&self, call: String) -> Result<std::sync::MutexGuard<'_, StubState>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn paged(all: &[Value], request: PageRequest) -> PageResponse {
    let start = (request.page * request.size).min(all.len());
    let end = (start + request.size).min(all.len());
    PageResponse {
        content: all[start..end].to_vec(),
        page: PageMeta {
            size: request.size,
            number: request.page,
            total_elements: all.len(),
            total_pages: page_count(all.len(), request.size),
        },
    }
}

fn not_found() -> ApiError {
    ApiError::Http {
        status: 404,
        message: Some("Record not found".to_string()),
    }
}

impl ResourceApi for StubApi {
    fn list(&self, resource: &str, query: &ListQuery) -> Result<PageResponse, ApiError> {
        let state = self.begin(format!("GET {}?{}", resource, query.to_query_string()))?;
        let all = state.records.get(resource).cloned().unwrap_or_default();
        Ok(paged(&all, query.request()))
    }

    fn get(&self, resource: &str, id: RowId) -> Result<Value, ApiError> {
        let state = self.begin(format!("GET {}/{}", resource, id))?;
        state
            .records
            .get(resource)
            .and_then(|rows| rows.iter().find(|r| r["id"] == json!(id)))
            .cloned()
            .ok_or_else(not_found)
    }

    fn create(&self, resource: &str, payload: &Value) -> Result<Value, ApiError> {
        let mut state = self.begin(format!("POST {}", resource))?;
        state.next_id += 1;
        let mut record = payload.clone();
        record["id"] = json!(state.next_id);
        state
            .records
            .entry(resource.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn update(&self, resource: &str, id: RowId, payload: &Value) -> Result<Value, ApiError> {
        let mut state = self.begin(format!("PUT {}/{}", resource, id))?;
        let rows = state.records.entry(resource.to_string()).or_default();
        let slot = rows
            .iter_mut()
            .find(|r| r["id"] == json!(id))
            .ok_or_else(not_found)?;
        let mut record = payload.clone();
        record["id"] = json!(id);
        *slot = record.clone();
        Ok(record)
    }

    fn delete(&self, resource: &str, id: RowId) -> Result<(), ApiError> {
        let mut state = self.begin(format!("DELETE {}/{}", resource, id))?;
        let rows = state.records.entry(resource.to_string()).or_default();
        let before = rows.len();
        rows.retain(|r| r["id"] != json!(id));
        if rows.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    fn labels(&self, module: &str) -> Result<Vec<LabelEntry>, ApiError> {
        let state = self.begin(format!("GET labels?moduleName={}", module))?;
        Ok(state.labels.clone())
    }

    fn workflow_action(&self, action: &WorkflowAction) -> Result<Value, ApiError> {
        let mut state = self.begin(format!("POST workflow {}", action.reference_id))?;
        state.workflow.push(action.clone());
        Ok(json!({ "status": "PENDING" }))
    }

    fn list_documents(&self, module: &str, record_id: RowId, request: PageRequest) -> Result<DocumentPage, ApiError> {
        let state = self.begin(format!("GET documents {}/{}", module, record_id))?;
        let matching: Vec<Value> = state
            .documents
            .iter()
            .filter(|d| d["module"] == json!(module) && d["recordId"] == json!(record_id))
            .cloned()
            .collect();
        let page = paged(&matching, request);
        Ok(DocumentPage {
            documents: page.content.iter().map(DocumentEntry::from_value).collect(),
            page: page.page,
        })
    }

    fn upload_document(&self, upload: &DocumentUpload) -> Result<Value, ApiError> {
        let mut state = self.begin(format!("POST documents {}", upload.file_name()))?;
        state.next_id += 1;
        let doc = json!({
            "id": state.next_id,
            "fileName": upload.file_name(),
            "module": upload.module,
            "recordId": upload.record_id,
            "storageType": upload.storage_type,
        });
        state.documents.push(doc.clone());
        Ok(doc)
    }
}
