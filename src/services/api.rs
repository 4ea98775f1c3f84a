//! REST client for the back-office API
//!
//! `ResourceApi` is the seam between the console and the backend. The
//! production implementation is a blocking reqwest client, called only from
//! worker threads so the terminal never stalls on I/O.

use super::documents::{DocumentEntry, DocumentUpload};
use super::query::{encode_component, join_url, ListQuery};
use super::workflow::WorkflowAction;
use crate::error::ApiError;
use crate::model::pagination::{page_count, PageMeta, PageRequest};
use crate::model::row::RowId;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// A page of a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub page: PageMeta,
}

/// Envelope as sent; some endpoints leave out the `page` block
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    content: Vec<Value>,
    page: Option<PageMeta>,
}

impl PageResponse {
    /// Content without paging metadata is treated as the only page
    fn single_page(content: Vec<Value>, request: PageRequest) -> Self {
        let total = content.len();
        Self {
            content,
            page: PageMeta {
                size: request.size,
                number: 0,
                total_elements: total,
                total_pages: page_count(total, request.size),
            },
        }
    }

    /// Decode a collection body.
    ///
    /// Accepts the paged envelope as well as a bare array or an envelope
    /// without a `page` block, in which case the content is the only page.
    pub fn from_value(value: Value, request: PageRequest) -> Result<Self, ApiError> {
        match value {
            Value::Array(content) => Ok(Self::single_page(content, request)),
            Value::Null => Ok(Self {
                content: Vec::new(),
                page: PageMeta {
                    size: request.size,
                    number: request.page,
                    ..PageMeta::default()
                },
            }),
            other => {
                let envelope: Envelope =
                    serde_json::from_value(other).map_err(|e| ApiError::Decode(e.to_string()))?;
                Ok(match envelope.page {
                    Some(page) => Self {
                        content: envelope.content,
                        page,
                    },
                    None => Self::single_page(envelope.content, request),
                })
            }
        }
    }
}

/// One label configuration row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelEntry {
    pub config_id: String,
    pub language_code: String,
    pub label: String,
}

/// A page of documents attached to one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<DocumentEntry>,
    pub page: PageMeta,
}

/// Operations the console performs against the backend
pub trait ResourceApi: Send + Sync {
    fn list(&self, resource: &str, query: &ListQuery) -> Result<PageResponse, ApiError>;
    fn get(&self, resource: &str, id: RowId) -> Result<Value, ApiError>;
    fn create(&self, resource: &str, payload: &Value) -> Result<Value, ApiError>;
    fn update(&self, resource: &str, id: RowId, payload: &Value) -> Result<Value, ApiError>;
    /// Logical delete
    fn delete(&self, resource: &str, id: RowId) -> Result<(), ApiError>;
    fn labels(&self, module: &str) -> Result<Vec<LabelEntry>, ApiError>;
    fn workflow_action(&self, action: &WorkflowAction) -> Result<Value, ApiError>;
    fn list_documents(&self, module: &str, record_id: RowId, request: PageRequest) -> Result<DocumentPage, ApiError>;
    fn upload_document(&self, upload: &DocumentUpload) -> Result<Value, ApiError>;
}

/// Where the auxiliary services live, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
    pub labels_path: String,
    pub workflow_path: String,
    pub documents_path: String,
    pub upload_path: String,
}

/// reqwest-backed implementation
pub struct HttpApi {
    client: Client,
    endpoints: Endpoints,
}

impl HttpApi {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("escrow-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoints })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.endpoints.base_url, path)
    }

    /// Send and turn non-2xx responses into `ApiError::Http`
    fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let err = ApiError::from_response(status.as_u16(), &body);
        warn!(status = status.as_u16(), "request failed: {}", err);
        Err(err)
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(builder)?.text()?;
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl ResourceApi for HttpApi {
    fn list(&self, resource: &str, query: &ListQuery) -> Result<PageResponse, ApiError> {
        let url = query.url(&self.endpoints.base_url, resource);
        debug!(%url, "GET list");
        let value: Value = self.send_json(self.client.get(&url))?;
        PageResponse::from_value(value, query.request())
    }

    fn get(&self, resource: &str, id: RowId) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.url(resource), id);
        debug!(%url, "GET record");
        self.send_json(self.client.get(&url))
    }

    fn create(&self, resource: &str, payload: &Value) -> Result<Value, ApiError> {
        let url = self.url(resource);
        debug!(%url, "POST record");
        self.send_json(self.client.post(&url).json(payload))
    }

    fn update(&self, resource: &str, id: RowId, payload: &Value) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.url(resource), id);
        debug!(%url, "PUT record");
        self.send_json(self.client.put(&url).json(payload))
    }

    fn delete(&self, resource: &str, id: RowId) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.url(resource), id);
        debug!(%url, "DELETE record");
        self.send(self.client.delete(&url)).map(|_| ())
    }

    fn labels(&self, module: &str) -> Result<Vec<LabelEntry>, ApiError> {
        let url = format!(
            "{}?moduleName={}",
            self.url(&self.endpoints.labels_path),
            encode_component(module)
        );
        debug!(%url, "GET labels");
        let value: Value = self.send_json(self.client.get(&url))?;
        match value {
            Value::Null => Ok(Vec::new()),
            other => serde_json::from_value(other).map_err(|e| ApiError::Decode(e.to_string())),
        }
    }

    fn workflow_action(&self, action: &WorkflowAction) -> Result<Value, ApiError> {
        let url = self.url(&self.endpoints.workflow_path);
        debug!(%url, reference = %action.reference_id, "POST workflow action");
        self.send_json(self.client.post(&url).json(action))
    }

    fn list_documents(&self, module: &str, record_id: RowId, request: PageRequest) -> Result<DocumentPage, ApiError> {
        let query = ListQuery::new(request)
            .filter("module.equals", module)
            .filter("recordId.equals", record_id);
        let url = query.url(&self.endpoints.base_url, &self.endpoints.documents_path);
        debug!(%url, "GET documents");
        let value: Value = self.send_json(self.client.get(&url))?;
        let page = PageResponse::from_value(value, request)?;
        Ok(DocumentPage {
            documents: page.content.iter().map(DocumentEntry::from_value).collect(),
            page: page.page,
        })
    }

    fn upload_document(&self, upload: &DocumentUpload) -> Result<Value, ApiError> {
        let url = self.url(&self.endpoints.upload_path);
        debug!(%url, file = %upload.path.display(), "POST document");
        let form = multipart::Form::new()
            .text("module", upload.module.clone())
            .text("recordId", upload.record_id.to_string())
            .text("storageType", upload.storage_type.clone())
            .file("file", &upload.path)?;
        self.send_json(self.client.post(&url).multipart(form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pagination::Pagination;
    use serde_json::json;

    const REQ: PageRequest = PageRequest { page: 0, size: 20 };

    #[test]
    fn test_page_response_envelope() {
        let body = json!({
            "content": [{ "id": 1 }, { "id": 2 }],
            "page": { "size": 20, "number": 0, "totalElements": 2, "totalPages": 1 }
        });
        let page = PageResponse::from_value(body, REQ).unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.page.total_elements, 2);
    }

    #[test]
    fn test_page_response_bare_array() {
        let page = PageResponse::from_value(json!([{ "id": 1 }]), PageRequest { page: 0, size: 5 }).unwrap();
        assert_eq!(page.page.total_elements, 1);
        assert_eq!(page.page.total_pages, 1);
        assert_eq!(page.page.size, 5);
    }

    #[test]
    fn test_page_response_missing_page_block() {
        let page = PageResponse::from_value(json!({ "content": [] }), REQ).unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.page.total_elements, 0);
        assert_eq!(page.page.size, 20);

        let page = PageResponse::from_value(json!({ "content": [{ "id": 1 }, { "id": 2 }] }), REQ).unwrap();
        assert_eq!(page.page.total_elements, 2);
        assert_eq!(page.page.total_pages, 1);

        let mut pagination = Pagination::new(20);
        pagination.apply_server_meta(&page.page);
        let window = pagination.window();
        assert_eq!((window.start_item, window.end_item, window.total_rows), (1, 2, 2));
    }

    #[test]
    fn test_page_response_rejects_scalars() {
        assert!(matches!(
            PageResponse::from_value(json!("oops"), REQ),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_label_entry_wire_format() {
        let entries: Vec<LabelEntry> = serde_json::from_value(json!([
            { "configId": "CDL_PTY_NAME", "languageCode": "EN", "label": "Party Name" }
        ]))
        .unwrap();
        assert_eq!(entries[0].config_id, "CDL_PTY_NAME");
        assert_eq!(entries[0].language_code, "EN");
    }
}
