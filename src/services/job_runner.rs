//! Background job runner service
//!
//! Every API call runs on its own worker thread and reports back through an
//! mpsc channel that the UI drains on each tick. Nothing is cancelled: a
//! superseded list fetch still completes and its message is discarded by
//! the table's generation check.

use super::api::{DocumentPage, LabelEntry, PageResponse, ResourceApi};
use super::documents::DocumentUpload;
use super::query::ListQuery;
use super::workflow::WorkflowAction;
use crate::error::ApiError;
use crate::model::mutation::MutationKind;
use crate::model::pagination::PageRequest;
use crate::model::row::RowId;
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Work that can be handed to a worker thread
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    FetchPage {
        resource: String,
        generation: u64,
        query: ListQuery,
    },
    /// Full record behind an edit form
    FetchRecord {
        resource: String,
        id: RowId,
    },
    Create {
        resource: String,
        payload: Value,
    },
    Update {
        resource: String,
        id: RowId,
        payload: Value,
    },
    Delete {
        resource: String,
        id: RowId,
    },
    Approve {
        resource: String,
        id: RowId,
        action: WorkflowAction,
    },
    FetchLabels {
        module: String,
    },
    FetchDocuments {
        module: String,
        record_id: RowId,
        request: PageRequest,
    },
    Upload(DocumentUpload),
}

impl Job {
    fn describe(&self) -> String {
        match self {
            Job::FetchPage { resource, query, .. } => format!("list {} page {}", resource, query.page),
            Job::FetchRecord { resource, id } => format!("get {}/{}", resource, id),
            Job::Create { resource, .. } => format!("create in {}", resource),
            Job::Update { resource, id, .. } => format!("update {}/{}", resource, id),
            Job::Delete { resource, id } => format!("delete {}/{}", resource, id),
            Job::Approve { resource, id, .. } => format!("approve {}/{}", resource, id),
            Job::FetchLabels { module } => format!("labels for {}", module),
            Job::FetchDocuments { module, record_id, .. } => format!("documents for {}/{}", module, record_id),
            Job::Upload(upload) => format!("upload {}", upload.file_name()),
        }
    }
}

/// Result of a finished job
#[derive(Debug, Clone, PartialEq)]
pub enum JobMessage {
    Page {
        resource: String,
        generation: u64,
        query: ListQuery,
        result: Result<PageResponse, ApiError>,
    },
    Record {
        resource: String,
        id: RowId,
        result: Result<Value, ApiError>,
    },
    Mutation {
        resource: String,
        kind: MutationKind,
        result: Result<Value, ApiError>,
    },
    Labels {
        module: String,
        result: Result<Vec<LabelEntry>, ApiError>,
    },
    Documents {
        module: String,
        record_id: RowId,
        result: Result<DocumentPage, ApiError>,
    },
    Uploaded {
        module: String,
        record_id: RowId,
        result: Result<Value, ApiError>,
    },
}

/// Runs API jobs off the UI thread
pub struct JobRunner {
    api: Arc<dyn ResourceApi>,
    tx: Sender<JobMessage>,
    rx: Receiver<JobMessage>,
    in_flight: usize,
}

impl JobRunner {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Number of jobs spawned but not yet reported
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Spawn a job on a worker thread
    pub fn spawn(&mut self, job: Job) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.in_flight += 1;
        debug!(job = %job.describe(), "spawning job");

        thread::spawn(move || {
            let message = Self::run(api.as_ref(), job);
            // The receiver only disappears on shutdown
            let _ = tx.send(message);
        });
    }

    /// Drain finished jobs without blocking
    pub fn poll(&mut self) -> Vec<JobMessage> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    messages.push(message);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("job channel disconnected");
                    self.in_flight = 0;
                    break;
                }
            }
        }
        messages
    }

    fn run(api: &dyn ResourceApi, job: Job) -> JobMessage {
        match job {
            Job::FetchPage {
                resource,
                generation,
                query,
            } => {
                let result = api.list(&resource, &query);
                JobMessage::Page {
                    resource,
                    generation,
                    query,
                    result,
                }
            }
            Job::FetchRecord { resource, id } => {
                let result = api.get(&resource, id);
                JobMessage::Record { resource, id, result }
            }
            Job::Create { resource, payload } => {
                let result = api.create(&resource, &payload);
                JobMessage::Mutation {
                    resource,
                    kind: MutationKind::Create,
                    result,
                }
            }
            Job::Update { resource, id, payload } => {
                let result = api.update(&resource, id, &payload);
                JobMessage::Mutation {
                    resource,
                    kind: MutationKind::Update(id),
                    result,
                }
            }
            Job::Delete { resource, id } => {
                let result = api.delete(&resource, id).map(|_| Value::Null);
                JobMessage::Mutation {
                    resource,
                    kind: MutationKind::Delete(id),
                    result,
                }
            }
            Job::Approve { resource, id, action } => {
                let result = api.workflow_action(&action);
                JobMessage::Mutation {
                    resource,
                    kind: MutationKind::Approve(id),
                    result,
                }
            }
            Job::FetchLabels { module } => {
                let result = api.labels(&module);
                JobMessage::Labels { module, result }
            }
            Job::FetchDocuments {
                module,
                record_id,
                request,
            } => {
                let result = api.list_documents(&module, record_id, request);
                JobMessage::Documents {
                    module,
                    record_id,
                    result,
                }
            }
            Job::Upload(upload) => {
                let result = api.upload_document(&upload);
                JobMessage::Uploaded {
                    module: upload.module,
                    record_id: upload.record_id,
                    result,
                }
            }
        }
    }
}
