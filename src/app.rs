//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that delegates event handling and rendering to child components. It owns
//! the table controller, the app context and the job runner, and turns
//! finished jobs into state changes on each tick.

use crate::action::Action;
use crate::component::Component;
use crate::components::{
    draw_table_screen, ConfirmDialog, DocumentsDialog, EntityTableComponent, FormDialog,
    HelpDialog, ResourcePicker, SearchDialog, TableRenderContext,
};
use crate::config::{Config, PAGE_SIZE_OPTIONS};
use crate::model::context::AppContext;
use crate::model::form::{FormMode, FormState};
use crate::model::modal::{Modal, ModalStack};
use crate::model::mutation::{DeletePhase, MutationKind};
use crate::model::pagination::PageRequest;
use crate::model::row::{project_row, RowId};
use crate::model::schema::SchemaRegistry;
use crate::model::table::{FetchTicket, TableController};
use crate::services::api::ResourceApi;
use crate::services::cache::QueryCache;
use crate::services::documents::DocumentUpload;
use crate::services::job_runner::{Job, JobMessage, JobRunner};
use crate::services::query::ListQuery;
use crate::services::workflow::WorkflowAction;
use anyhow::{anyhow, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{layout::Rect, Frame};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Documents are listed in a single page of this size
const DOCUMENTS_PAGE_SIZE: usize = 50;

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    pub config: Config,

    /// Every entity the console can show
    pub registry: SchemaRegistry,

    /// Language, labels and the toast line
    pub ctx: AppContext,

    /// The list screen currently mounted
    pub table: TableController,

    /// List responses keyed by resource and query
    pub cache: QueryCache,

    /// Background API jobs
    pub runner: JobRunner,

    /// Modal overlay stack
    pub modals: ModalStack,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub entity_table: EntityTableComponent,
    pub confirm_dialog: ConfirmDialog,
    pub search_dialog: SearchDialog,
    pub form_dialog: FormDialog,
    pub resource_picker: ResourcePicker,
    pub documents_dialog: DocumentsDialog,
    pub help_dialog: HelpDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Build the app for `resource`, which must name a known schema
    pub fn new(config: Config, api: Arc<dyn ResourceApi>, resource: &str) -> Result<App> {
        let registry = config.registry();
        let schema = registry.get(resource).cloned().ok_or_else(|| {
            anyhow!(
                "Unknown resource '{}'. Available: {}",
                resource,
                registry.names().join(", ")
            )
        })?;
        let table = TableController::new(schema, config.page_size, config.settle_delay());

        Ok(App {
            ctx: AppContext::new(&config.language),
            registry,
            table,
            cache: QueryCache::new(),
            runner: JobRunner::new(api),
            modals: ModalStack::new(),
            should_quit: false,
            entity_table: EntityTableComponent::new(),
            confirm_dialog: ConfirmDialog::default(),
            search_dialog: SearchDialog,
            form_dialog: FormDialog::default(),
            resource_picker: ResourcePicker::new(),
            documents_dialog: DocumentsDialog::default(),
            help_dialog: HelpDialog::default(),
            config,
        })
    }

    /// Issue a list fetch. The request always goes out; with `show_cached`
    /// a cached copy of the same page is shown until the reply lands.
    fn fetch(&mut self, ticket: FetchTicket, show_cached: bool) {
        let resource = self.table.schema.resource.clone();
        let query = ListQuery::new(ticket.request);
        if show_cached {
            if let Some(page) = self.cache.get(&resource, &query).cloned() {
                if self.table.preview_page(ticket.generation, &page) {
                    debug!(%resource, page = query.page, "showing cached page while refetching");
                }
            }
        }
        self.runner.spawn(Job::FetchPage {
            resource,
            generation: ticket.generation,
            query,
        });
    }

    /// Fetch `request` if a table operation produced one
    fn fetch_if_moved(&mut self, request: Option<PageRequest>) {
        if let Some(request) = request {
            let ticket = self.table.begin_fetch(request);
            self.fetch(ticket, true);
        }
    }

    fn load_labels(&mut self) {
        let module = self.table.schema.module.clone();
        if !self.ctx.labels.is_loaded(&module) {
            self.runner.spawn(Job::FetchLabels { module });
        }
    }

    fn switch_resource(&mut self, name: &str) {
        self.modals.clear();
        if name == self.table.schema.name {
            return;
        }
        let Some(schema) = self.registry.get(name).cloned() else {
            self.ctx.notify_error(format!("Unknown resource '{}'", name));
            return;
        };

        info!(from = %self.table.schema.name, to = %name, "switching resource");
        let page_size = self.table.pagination.page_size();
        let generation = self.table.generation();
        self.table = TableController::new(schema, page_size, self.config.settle_delay())
            .continue_from(generation);
        self.form_dialog.close();
        self.documents_dialog.close();

        let ticket = self.table.refresh();
        self.fetch(ticket, true);
        self.load_labels();
    }

    fn cycle_rows_per_page(&mut self) {
        let current = self.table.pagination.page_size();
        let next = PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .find(|&size| size > current)
            .unwrap_or(PAGE_SIZE_OPTIONS[0]);
        let request = self.table.set_rows_per_page(next);
        let ticket = self.table.begin_fetch(request);
        // a size change always goes to the server
        self.fetch(ticket, false);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    fn open_form(&mut self, edit: bool) {
        let schema = &self.table.schema;
        let (form, title) = if edit {
            let Some(row) = self.table.focused_row() else {
                return;
            };
            match FormState::edit(schema, row) {
                Some(form) => (form, format!("Edit {}", row.describe())),
                None => {
                    self.ctx.notify_error("This record has no id and cannot be edited");
                    return;
                }
            }
        } else {
            (FormState::create(schema), format!("New {}", schema.title))
        };
        // list rows can be trimmed projections, so edits start from the full record
        if let FormMode::Edit { id } = form.mode {
            self.runner.spawn(Job::FetchRecord {
                resource: schema.resource.clone(),
                id,
            });
        }
        self.form_dialog.open(form, title);
        self.modals.push(Modal::Form);
    }

    /// Swap the edit form's prefill for the full record, unless the user
    /// has already started typing
    fn refill_form(&mut self, id: RowId, record: &Value) {
        let Some(form) = &self.form_dialog.form else {
            return;
        };
        if form.mode != (FormMode::Edit { id }) || form.is_dirty() || self.form_dialog.saving {
            debug!(id, "keeping edit form as typed");
            return;
        }
        let focus = form.focus;
        let row = project_row(&self.table.schema, record);
        if let Some(mut refilled) = FormState::edit(&self.table.schema, &row) {
            refilled.focus = focus.min(refilled.fields.len().saturating_sub(1));
            self.form_dialog.form = Some(refilled);
        }
    }

    fn submit_form(&mut self) {
        if self.form_dialog.saving {
            return;
        }
        let Some(form) = &self.form_dialog.form else {
            return;
        };
        let kind = form.kind();
        let payload = match form.build_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.form_dialog.set_error(err.to_string());
                return;
            }
        };
        if let Err(err) = self.table.mutations.begin(&kind) {
            self.form_dialog.set_error(err.to_string());
            return;
        }

        let resource = self.table.schema.resource.clone();
        info!(%resource, ?kind, "submitting form");
        let job = match kind {
            MutationKind::Update(id) => Job::Update {
                resource,
                id,
                payload,
            },
            _ => Job::Create { resource, payload },
        };
        self.runner.spawn(job);
        self.form_dialog.saving = true;
    }

    fn request_delete(&mut self) {
        if self.table.focused_row().is_none() {
            return;
        }
        if !self.table.request_delete_focused() {
            self.ctx.notify_info("A delete is already in progress");
            return;
        }
        if let DeletePhase::Confirming { label, .. } = self.table.mutations.delete_phase() {
            self.confirm_dialog = ConfirmDialog::delete(label);
            self.modals.push(Modal::DeleteConfirm);
        }
    }

    fn confirm_delete(&mut self) {
        self.modals.pop();
        if let Some(id) = self.table.mutations.confirm_delete() {
            let resource = self.table.schema.resource.clone();
            info!(%resource, id, "deleting record");
            self.runner.spawn(Job::Delete { resource, id });
        }
    }

    fn request_approve(&mut self) {
        if !self.table.schema.approvable {
            self.ctx
                .notify_info(format!("{} have no approval workflow", self.table.schema.title));
            return;
        }
        let Some(row) = self.table.focused_row() else {
            return;
        };
        let Some(id) = row.id else {
            self.ctx.notify_error("This record has no id");
            return;
        };
        let label = row.describe();
        self.confirm_dialog = ConfirmDialog::approve(&label);
        self.modals.push(Modal::ApproveConfirm { id, label });
    }

    fn confirm_approve(&mut self, id: i64) {
        self.modals.pop();
        let action = self
            .table
            .rows()
            .iter()
            .find(|row| row.id == Some(id))
            .and_then(|row| WorkflowAction::approve(&self.table.schema, row));
        let Some(action) = action else {
            self.ctx.notify_error("The record is no longer on this page");
            return;
        };

        let kind = MutationKind::Approve(id);
        if let Err(err) = self.table.mutations.begin(&kind) {
            self.ctx.notify_info(err.to_string());
            return;
        }
        let resource = self.table.schema.resource.clone();
        info!(%resource, id, "submitting for approval");
        self.runner.spawn(Job::Approve {
            resource,
            id,
            action,
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    fn open_documents(&mut self) {
        if !self.table.schema.documents {
            self.ctx
                .notify_info(format!("{} have no documents", self.table.schema.title));
            return;
        }
        let Some(row) = self.table.focused_row() else {
            return;
        };
        let Some(record_id) = row.id else {
            self.ctx.notify_error("This record has no id");
            return;
        };
        let label = row.describe();
        let module = self.table.schema.module.clone();
        self.documents_dialog.open(&module, record_id, &label);
        self.modals.push(Modal::Documents { record_id, label });
        self.fetch_documents();
    }

    fn fetch_documents(&mut self) {
        let Some(record_id) = self.documents_dialog.record_id else {
            return;
        };
        self.documents_dialog.reload();
        self.runner.spawn(Job::FetchDocuments {
            module: self.documents_dialog.module.clone(),
            record_id,
            request: PageRequest {
                page: 0,
                size: DOCUMENTS_PAGE_SIZE,
            },
        });
    }

    fn upload_document(&mut self, path: &str) {
        let Some(record_id) = self.documents_dialog.record_id else {
            return;
        };
        let path = path.trim();
        if path.is_empty() {
            self.documents_dialog
                .finish_upload(Err("Enter the path of a file to upload".to_string()));
            return;
        }
        self.documents_dialog.begin_upload();
        let upload = DocumentUpload::new(&self.documents_dialog.module, record_id, path);
        info!(module = %upload.module, record_id, file = %upload.file_name(), "uploading document");
        self.runner.spawn(Job::Upload(upload));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Job results
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_job_message(&mut self, message: JobMessage) {
        match message {
            JobMessage::Page {
                resource,
                generation,
                query,
                result,
            } => {
                if resource != self.table.schema.resource {
                    debug!(%resource, generation, "dropping page for another resource");
                    return;
                }
                match result {
                    Ok(page) => {
                        if self.table.is_current(generation) {
                            self.cache.insert(&resource, query, page.clone());
                        }
                        let (_, follow_up) = self.table.apply_page(generation, &page);
                        self.fetch_if_moved(follow_up);
                    }
                    Err(err) => {
                        if self.table.fail_fetch(generation, err.user_message()) {
                            warn!(%resource, error = %err, "list fetch failed");
                        }
                    }
                }
            }
            JobMessage::Record { resource, id, result } => {
                if resource != self.table.schema.resource {
                    return;
                }
                match result {
                    Ok(record) => self.refill_form(id, &record),
                    Err(err) => {
                        warn!(%resource, id, error = %err, "record fetch failed, editing the list copy")
                    }
                }
            }
            JobMessage::Mutation {
                resource,
                kind,
                result,
            } => {
                let succeeded = result.is_ok();
                if succeeded {
                    self.cache.invalidate(&resource);
                }
                if resource == self.table.schema.resource {
                    self.table
                        .on_mutation_finished(&kind, succeeded, Instant::now());
                }
                let is_form = matches!(kind, MutationKind::Create | MutationKind::Update(_));
                match result {
                    Ok(_) => {
                        if is_form && self.modals.pop_if(|m| *m == Modal::Form).is_some() {
                            self.form_dialog.close();
                        }
                        self.ctx.notify_success(format!("{} successfully", kind.verb()));
                    }
                    Err(err) => {
                        let message = err.user_message();
                        warn!(%resource, ?kind, error = %err, "mutation failed");
                        if is_form && self.form_dialog.is_open() {
                            self.form_dialog.set_error(message.clone());
                        }
                        self.ctx.notify_error(message);
                    }
                }
            }
            JobMessage::Labels { module, result } => match result {
                Ok(entries) => {
                    let count = self.ctx.labels.load(&module, entries);
                    info!(%module, count, "labels loaded");
                }
                Err(err) => warn!(%module, error = %err, "label fetch failed, using fallbacks"),
            },
            JobMessage::Documents {
                module,
                record_id,
                result,
            } => {
                if self.documents_dialog.is_for(&module, record_id) {
                    self.documents_dialog.set_documents(
                        result
                            .map(|page| page.documents)
                            .map_err(|err| err.user_message()),
                    );
                }
            }
            JobMessage::Uploaded {
                module,
                record_id,
                result,
            } => {
                if !self.documents_dialog.is_for(&module, record_id) {
                    return;
                }
                match result {
                    Ok(_) => {
                        self.documents_dialog.finish_upload(Ok(()));
                        self.ctx.notify_success("Document uploaded");
                        self.fetch_documents();
                    }
                    Err(err) => {
                        warn!(%module, record_id, error = %err, "upload failed");
                        self.documents_dialog.finish_upload(Err(err.user_message()));
                    }
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for App {
    fn init(&mut self) -> Result<()> {
        info!(
            resource = %self.table.schema.resource,
            base_url = %self.config.base_url,
            "starting"
        );
        let ticket = self.table.refresh();
        self.fetch(ticket, true);
        self.load_labels();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(Some(Action::ForceQuit));
        }
        match self.modals.top().cloned() {
            Some(modal) => self.handle_modal_key_event(&modal, key),
            None => self.entity_table.handle_key_event(key),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if !self.modals.is_empty() {
            return Ok(None);
        }
        let action = match mouse.kind {
            MouseEventKind::ScrollDown => Some(Action::NextItem),
            MouseEventKind::ScrollUp => Some(Action::PrevItem),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                for message in self.runner.poll() {
                    self.handle_job_message(message);
                }
                let now = Instant::now();
                if let Some(ticket) = self.table.poll_refetch(now) {
                    self.fetch(ticket, false);
                }
                self.ctx.expire_toast(now);
            }
            Action::Resize(_, _) => {}
            Action::ForceQuit => {
                info!("quitting");
                self.should_quit = true;
            }

            // ─────────────────────────────────────────────────────────────────
            // Rows
            // ─────────────────────────────────────────────────────────────────
            Action::NextItem => self.table.cursor_down(),
            Action::PrevItem => self.table.cursor_up(),
            Action::FirstItem => self.table.cursor_first(),
            Action::LastItem => self.table.cursor_last(),

            // ─────────────────────────────────────────────────────────────────
            // Paging
            // ─────────────────────────────────────────────────────────────────
            Action::NextPage => {
                let request = self.table.next_page();
                self.fetch_if_moved(request);
            }
            Action::PrevPage => {
                let request = self.table.prev_page();
                self.fetch_if_moved(request);
            }
            Action::FirstPage => {
                let request = self.table.first_page();
                self.fetch_if_moved(request);
            }
            Action::LastPage => {
                let request = self.table.last_page();
                self.fetch_if_moved(request);
            }
            Action::CycleRowsPerPage => self.cycle_rows_per_page(),

            // ─────────────────────────────────────────────────────────────────
            // Data
            // ─────────────────────────────────────────────────────────────────
            Action::Refresh => {
                if matches!(self.modals.top(), Some(Modal::Documents { .. })) {
                    self.fetch_documents();
                } else {
                    let ticket = self.table.refresh();
                    self.fetch(ticket, false);
                }
            }
            Action::SwitchResource(name) => self.switch_resource(&name),
            Action::ToggleLanguage => {
                self.ctx.language = if self.ctx.language == "AR" { "EN" } else { "AR" }.to_string();
                self.ctx.notify_info(format!("Language: {}", self.ctx.language));
            }

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => {
                self.confirm_dialog = ConfirmDialog::quit();
                self.modals.push(Modal::QuitConfirm);
            }
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.push(Modal::Help { scroll_offset: 0 });
            }
            Action::OpenResourcePicker => {
                self.resource_picker
                    .set_resources(&self.registry, &self.table.schema.name);
                self.modals.push(Modal::ResourcePicker {
                    selected_index: self.resource_picker.selected_index,
                });
            }
            Action::CloseModal => match self.modals.pop() {
                Some(Modal::DeleteConfirm) => {
                    self.table.mutations.cancel_delete();
                }
                Some(Modal::Form) => self.form_dialog.close(),
                Some(Modal::Documents { .. }) => self.documents_dialog.close(),
                _ => {}
            },
            Action::ConfirmModal => match self.modals.top().cloned() {
                Some(Modal::DeleteConfirm) => self.confirm_delete(),
                Some(Modal::ApproveConfirm { id, .. }) => self.confirm_approve(id),
                Some(Modal::QuitConfirm) => return Ok(Some(Action::ForceQuit)),
                _ => {}
            },
            Action::ModalUp | Action::ModalDown => match self.modals.top_mut() {
                Some(Modal::ResourcePicker { selected_index }) => {
                    *selected_index = self.resource_picker.selected_index;
                }
                Some(Modal::Documents { .. }) => {
                    self.documents_dialog.update(action)?;
                }
                _ => {}
            },

            // ─────────────────────────────────────────────────────────────────
            // Search
            // ─────────────────────────────────────────────────────────────────
            Action::OpenSearch => {
                if self.table.schema.searchable.is_empty() {
                    self.ctx.notify_info("Nothing to search on this screen");
                } else {
                    self.modals.push(Modal::Search);
                }
            }
            Action::SearchInput(c) => {
                let request = self.table.search_push(c);
                self.fetch_if_moved(request);
            }
            Action::SearchBackspace => {
                let request = self.table.search_pop();
                self.fetch_if_moved(request);
            }
            Action::SearchNextField => self.table.next_search_field(),
            Action::ClearSearch => {
                let request = self.table.clear_search();
                self.fetch_if_moved(request);
            }

            // ─────────────────────────────────────────────────────────────────
            // Selection
            // ─────────────────────────────────────────────────────────────────
            Action::ToggleSelection => {
                self.table.toggle_selected_focused();
            }
            Action::ToggleExpand => {
                self.table.toggle_expanded_focused();
            }
            Action::SelectAll => self.table.select_all_visible(),
            Action::ClearSelection => self.table.selection.clear_selection(),

            // ─────────────────────────────────────────────────────────────────
            // Forms
            // ─────────────────────────────────────────────────────────────────
            Action::OpenCreateForm => self.open_form(false),
            Action::OpenEditForm => self.open_form(true),
            Action::FormInput(_)
            | Action::FormBackspace
            | Action::FormNextField
            | Action::FormPrevField => {
                return self.form_dialog.update(action);
            }
            Action::SubmitForm => self.submit_form(),

            // ─────────────────────────────────────────────────────────────────
            // Records
            // ─────────────────────────────────────────────────────────────────
            Action::RequestDelete => self.request_delete(),
            Action::RequestApprove => self.request_approve(),
            Action::OpenDocuments => self.open_documents(),
            Action::UploadDocument(path) => self.upload_document(&path),
            Action::DismissToast => self.ctx.dismiss_toast(),
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let render = TableRenderContext {
            table: &self.table,
            ctx: &self.ctx,
            in_flight: self.runner.in_flight(),
        };
        draw_table_screen(frame, area, &render)?;

        // Draw modal overlay if active
        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm | Modal::DeleteConfirm | Modal::ApproveConfirm { .. } => {
                self.confirm_dialog.handle_key_event(key)
            }
            Modal::Form => self.form_dialog.handle_key_event(key),
            Modal::Search => self.search_dialog.handle_key_event(key),
            Modal::ResourcePicker { .. } => self.resource_picker.handle_key_event(key),
            Modal::Documents { .. } => self.documents_dialog.handle_key_event(key),
            Modal::Help { .. } => self.help_dialog.handle_key_event(key),
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm | Modal::DeleteConfirm | Modal::ApproveConfirm { .. } => {
                self.confirm_dialog.draw(frame, area)?;
            }
            Modal::Form => self.form_dialog.draw_with_context(frame, area, &self.ctx)?,
            Modal::Search => {
                self.search_dialog
                    .draw_with_table(frame, area, &self.table, &self.ctx)?;
            }
            Modal::ResourcePicker { .. } => self.resource_picker.draw(frame, area)?,
            Modal::Documents { .. } => self.documents_dialog.draw(frame, area)?,
            Modal::Help { .. } => self.help_dialog.draw(frame, area)?,
        }
        Ok(())
    }
}
