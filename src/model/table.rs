//! Table controller - the state behind one entity list screen
//!
//! Pipeline: fetched page -> row projection -> search filter -> pagination
//! window -> render. Every fetch replaces the rows wholesale; nothing here
//! edits a row in place.
//!
//! Remounting the view after a mutation means clearing selection, expansion
//! and the cursor.

use super::mutation::{MutationCoordinator, MutationKind};
use super::pagination::{PageRequest, PageWindow, Pagination};
use super::row::{project_page, UiRow};
use super::schema::EntitySchema;
use super::search::SearchState;
use super::selection::SelectionTracker;
use crate::services::api::PageResponse;
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Exactly one of these is shown for a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Failed(String),
    Loaded,
}

/// A list fetch tagged with the generation it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: PageRequest,
}

#[derive(Debug, Clone)]
pub struct TableController {
    pub schema: EntitySchema,
    rows: Vec<UiRow>,
    load: LoadState,
    pub search: SearchState,
    pub pagination: Pagination,
    pub selection: SelectionTracker,
    pub mutations: MutationCoordinator,
    /// Index into the visible rows
    cursor: usize,
    generation: u64,
    /// Search field currently receiving keystrokes
    search_field: usize,
    last_refreshed: Option<DateTime<Local>>,
}

impl TableController {
    pub fn new(schema: EntitySchema, page_size: usize, settle_delay: Duration) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            load: LoadState::Loading,
            search: SearchState::new(),
            pagination: Pagination::new(page_size),
            selection: SelectionTracker::new(),
            mutations: MutationCoordinator::new(settle_delay),
            cursor: 0,
            generation: 0,
            search_field: 0,
            last_refreshed: None,
        }
    }

    pub fn rows(&self) -> &[UiRow] {
        &self.rows
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.last_refreshed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fetch lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a fetch; any response for an older generation is ignored later
    pub fn begin_fetch(&mut self, request: PageRequest) -> FetchTicket {
        self.generation += 1;
        self.load = LoadState::Loading;
        debug!(
            resource = %self.schema.resource,
            generation = self.generation,
            page = request.page,
            size = request.size,
            "fetch started"
        );
        FetchTicket {
            generation: self.generation,
            request,
        }
    }

    /// Re-issue the current server request (mount, refresh, retry)
    pub fn refresh(&mut self) -> FetchTicket {
        let request = self.pagination.request();
        self.begin_fetch(request)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Keep numbering after `generation` so replies meant for a replaced
    /// controller can never look current
    pub fn continue_from(mut self, generation: u64) -> Self {
        self.generation = self.generation.max(generation);
        self
    }

    /// Install a fetched page.
    ///
    /// Returns false for stale responses. May return a follow-up request if
    /// reconciling with the search state moves the server position.
    pub fn apply_page(&mut self, generation: u64, response: &PageResponse) -> (bool, Option<PageRequest>) {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "dropping stale page");
            return (false, None);
        }
        self.install(response);
        self.last_refreshed = Some(Local::now());
        info!(
            resource = %self.schema.resource,
            rows = self.rows.len(),
            total = response.page.total_elements,
            "page loaded"
        );
        (true, self.sync_search())
    }

    /// Show a cached copy of the page for `generation` while its request is
    /// in flight. The generation stays current so the reply still lands.
    pub fn preview_page(&mut self, generation: u64, response: &PageResponse) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.install(response);
        // leaving client mode is only ever triggered by clearing the search
        let _ = self.sync_search();
        true
    }

    fn install(&mut self, response: &PageResponse) {
        self.rows = project_page(&self.schema, &response.content);
        self.pagination.apply_server_meta(&response.page);
        self.selection.clear();
        self.cursor = 0;
        self.load = LoadState::Loaded;
    }

    /// Record a failed fetch; stale failures are ignored
    pub fn fail_fetch(&mut self, generation: u64, message: String) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.rows.clear();
        self.selection.clear();
        self.load = LoadState::Failed(message);
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived views
    // ─────────────────────────────────────────────────────────────────────────

    /// Loaded rows that pass the search
    pub fn filtered_rows(&self) -> Vec<&UiRow> {
        self.search.filter(&self.schema, &self.rows)
    }

    /// Rows on the current (client or server) page
    pub fn visible_rows(&self) -> Vec<&UiRow> {
        let filtered = self.filtered_rows();
        let range = self.pagination.visible_range(filtered.len());
        filtered[range].to_vec()
    }

    pub fn window(&self) -> PageWindow {
        self.pagination.window()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn focused_row(&self) -> Option<&UiRow> {
        self.visible_rows().get(self.cursor).copied()
    }

    pub fn cursor_down(&mut self) {
        let len = self.visible_rows().len();
        if len > 0 {
            self.cursor = (self.cursor + 1).min(len - 1);
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_first(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_last(&mut self) {
        self.cursor = self.visible_rows().len().saturating_sub(1);
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────

    fn sync_search(&mut self) -> Option<PageRequest> {
        let active = self.search.is_active(&self.schema);
        let filtered = self.filtered_rows().len();
        let request = self.pagination.sync_search(active, filtered);
        self.clamp_cursor();
        request
    }

    /// Key of the search field receiving input, if the schema has any
    pub fn search_field(&self) -> Option<&str> {
        self.schema
            .searchable
            .get(self.search_field)
            .map(String::as_str)
    }

    pub fn next_search_field(&mut self) {
        let count = self.schema.searchable.len();
        if count > 0 {
            self.search_field = (self.search_field + 1) % count;
        }
    }

    pub fn search_push(&mut self, c: char) -> Option<PageRequest> {
        let field = self.search_field()?.to_string();
        self.search.push_char(&field, c);
        self.cursor = 0;
        self.sync_search()
    }

    pub fn search_pop(&mut self) -> Option<PageRequest> {
        let field = self.search_field()?.to_string();
        self.search.pop_char(&field);
        self.sync_search()
    }

    pub fn set_search(&mut self, field: &str, query: &str) -> Option<PageRequest> {
        self.search.set(field, query);
        self.cursor = 0;
        self.sync_search()
    }

    pub fn clear_search(&mut self) -> Option<PageRequest> {
        self.search.clear();
        self.sync_search()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paging
    // ─────────────────────────────────────────────────────────────────────────

    fn after_page_move(&mut self, request: Option<PageRequest>) -> Option<PageRequest> {
        self.cursor = 0;
        request
    }

    pub fn next_page(&mut self) -> Option<PageRequest> {
        let request = self.pagination.next_page();
        self.after_page_move(request)
    }

    pub fn prev_page(&mut self) -> Option<PageRequest> {
        let request = self.pagination.prev_page();
        self.after_page_move(request)
    }

    pub fn first_page(&mut self) -> Option<PageRequest> {
        let request = self.pagination.first_page();
        self.after_page_move(request)
    }

    pub fn last_page(&mut self) -> Option<PageRequest> {
        let request = self.pagination.last_page();
        self.after_page_move(request)
    }

    /// Always exactly one refetch at the new size
    pub fn set_rows_per_page(&mut self, size: usize) -> PageRequest {
        self.cursor = 0;
        self.pagination.set_rows_per_page(size)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn toggle_selected_focused(&mut self) -> bool {
        match self.focused_row().and_then(|r| r.id) {
            Some(id) => self.selection.toggle_selected(id),
            None => false,
        }
    }

    pub fn toggle_expanded_focused(&mut self) -> bool {
        match self.focused_row().and_then(|r| r.id) {
            Some(id) => self.selection.toggle_expanded(id),
            None => false,
        }
    }

    pub fn select_all_visible(&mut self) {
        let rows: Vec<UiRow> = self.visible_rows().into_iter().cloned().collect();
        self.selection.select_all(&rows);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Open the delete confirmation for the focused row
    pub fn request_delete_focused(&mut self) -> bool {
        match self.focused_row().cloned() {
            Some(row) => self.mutations.request_delete(&row),
            None => false,
        }
    }

    /// Reconcile after a mutation finished.
    ///
    /// On success the server position is recomputed (a delete that removed
    /// the last row of a page walks back one page), the view is reset and a
    /// refetch is scheduled after the settle delay.
    pub fn on_mutation_finished(&mut self, kind: &MutationKind, succeeded: bool, now: Instant) {
        let request = if succeeded {
            match kind {
                MutationKind::Delete(_) => self.pagination.after_delete(self.rows.len()),
                _ => self.pagination.request(),
            }
        } else {
            self.pagination.request()
        };
        self.mutations.complete(kind, succeeded, request, now);
        if succeeded {
            self.selection.clear();
            self.cursor = 0;
            info!(
                resource = %self.schema.resource,
                ?kind,
                "mutation succeeded"
            );
        }
    }

    /// Refetch that became due since the last tick
    pub fn poll_refetch(&mut self, now: Instant) -> Option<FetchTicket> {
        let request = self.mutations.take_due_refetch(now)?;
        Some(self.begin_fetch(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pagination::PageMeta;
    use crate::model::schema::SchemaRegistry;
    use crate::services::api::ResourceApi;
    use crate::services::query::ListQuery;
    use crate::services::stub::StubApi;
    use serde_json::{json, Value};

    fn parties_table(size: usize) -> TableController {
        let schema = SchemaRegistry::builtin().get("parties").unwrap().clone();
        TableController::new(schema, size, Duration::from_millis(400))
    }

    fn parties(n: usize) -> Vec<Value> {
        (1..=n)
            .map(|i| json!({ "id": i, "partyFullName": format!("Party {}", i), "partyCifNumber": format!("CIF{:03}", i) }))
            .collect()
    }

    fn load(table: &mut TableController, api: &StubApi, request: PageRequest) {
        let ticket = table.begin_fetch(request);
        let page = api.list(&table.schema.resource, &ListQuery::new(request)).unwrap();
        assert!(table.apply_page(ticket.generation, &page).0);
    }

    #[test]
    fn test_starts_loading_then_loaded() {
        let api = StubApi::new().with_records("/api/parties", parties(3));
        let mut table = parties_table(20);
        assert_eq!(table.load_state(), &LoadState::Loading);

        let request = table.refresh().request;
        load(&mut table, &api, request);
        assert_eq!(table.load_state(), &LoadState::Loaded);
        assert_eq!(table.visible_rows().len(), 3);
        assert!(table.last_refreshed().is_some());
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut table = parties_table(20);
        let old = table.begin_fetch(PageRequest { page: 0, size: 20 });
        let new = table.begin_fetch(PageRequest { page: 1, size: 20 });

        let page = PageResponse {
            content: vec![json!({ "id": 1 })],
            page: PageMeta::default(),
        };
        assert!(!table.apply_page(old.generation, &page).0);
        assert_eq!(table.load_state(), &LoadState::Loading);
        assert!(!table.fail_fetch(old.generation, "boom".into()));
        assert!(table.fail_fetch(new.generation, "boom".into()));
        assert_eq!(table.load_state(), &LoadState::Failed("boom".into()));
    }

    #[test]
    fn test_cached_preview_is_replaced_by_reply() {
        let api = StubApi::new().with_records("/api/parties", parties(3));
        let mut table = parties_table(20);
        let ticket = table.refresh();
        let cached = PageResponse {
            content: vec![json!({ "id": 9, "partyFullName": "Old" })],
            page: PageMeta { size: 20, number: 0, total_elements: 1, total_pages: 1 },
        };

        assert!(table.preview_page(ticket.generation, &cached));
        assert_eq!(table.load_state(), &LoadState::Loaded);
        assert_eq!(table.rows().len(), 1);
        assert!(table.last_refreshed().is_none());
        assert!(table.is_current(ticket.generation));

        let page = api.list(&table.schema.resource, &ListQuery::new(ticket.request)).unwrap();
        assert!(table.apply_page(ticket.generation, &page).0);
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.window().total_rows, 3);

        let stale = table.begin_fetch(ticket.request).generation - 1;
        assert!(!table.preview_page(stale, &cached));
        assert_eq!(table.rows().len(), 3);
    }

    #[test]
    fn test_empty_page_is_loaded_not_failed() {
        let api = StubApi::new();
        let mut table = parties_table(20);
        let request = table.refresh().request;
        load(&mut table, &api, request);
        assert_eq!(table.load_state(), &LoadState::Loaded);
        assert!(table.visible_rows().is_empty());
        assert_eq!(table.window().total_pages, 1);
        assert!(table.focused_row().is_none());
    }

    #[test]
    fn test_search_pages_locally_and_clearing_refetches() {
        let api = StubApi::new().with_records("/api/parties", parties(12));
        let mut table = parties_table(5);
        load(&mut table, &api, PageRequest { page: 1, size: 5 });
        assert_eq!(table.window().page, 2);

        // Page 2 holds parties 6..=10
        assert_eq!(table.set_search("partyFullName", "party"), None);
        assert!(table.pagination.is_client_mode());
        assert_eq!(table.window().page, 1);
        assert_eq!(table.visible_rows().len(), 5);

        assert_eq!(table.set_search("partyFullName", "party 1"), None);
        let names: Vec<&str> = table.visible_rows().iter().map(|r| r.cell("partyFullName")).collect();
        assert_eq!(names, vec!["Party 10"]);

        assert_eq!(table.clear_search(), Some(PageRequest { page: 0, size: 5 }));
        assert!(!table.pagination.is_client_mode());
    }

    #[test]
    fn test_typing_into_search_field() {
        let api = StubApi::new().with_records("/api/parties", parties(3));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 0, size: 20 });

        // First searchable column is the CIF number
        assert_eq!(table.search_field(), Some("partyCifNumber"));
        for c in "cif002".chars() {
            table.search_push(c);
        }
        assert_eq!(table.visible_rows().len(), 1);
        table.next_search_field();
        assert_eq!(table.search_field(), Some("partyFullName"));
    }

    #[test]
    fn test_rows_per_page_resets_and_requests_once() {
        let api = StubApi::new().with_records("/api/parties", parties(45));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 2, size: 20 });
        let calls_before = api.calls().len();

        let request = table.set_rows_per_page(10);
        assert_eq!(request, PageRequest { page: 0, size: 10 });
        load(&mut table, &api, request);
        assert_eq!(api.calls().len(), calls_before + 1);
        assert_eq!(table.window().page, 1);
        assert_eq!(table.window().total_pages, 5);
    }

    #[test]
    fn test_cancelled_delete_leaves_rows_and_network_alone() {
        let api = StubApi::new().with_records("/api/parties", parties(3));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 0, size: 20 });
        let calls_before = api.calls();

        assert!(table.request_delete_focused());
        assert!(table.mutations.cancel_delete());

        assert_eq!(api.calls(), calls_before);
        assert_eq!(api.count("/api/parties"), 3);
        assert_eq!(table.rows().len(), 3);
    }

    #[test]
    fn test_deleting_only_row_on_last_page_walks_back() {
        let api = StubApi::new().with_records("/api/parties", parties(41));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 2, size: 20 });
        assert_eq!(table.rows().len(), 1);

        assert!(table.request_delete_focused());
        let id = table.mutations.confirm_delete().unwrap();
        api.delete(&table.schema.resource, id).unwrap();

        let now = Instant::now();
        table.on_mutation_finished(&MutationKind::Delete(id), true, now);
        assert_eq!(table.poll_refetch(now), None);

        let ticket = table.poll_refetch(now + Duration::from_millis(400)).unwrap();
        assert_eq!(ticket.request, PageRequest { page: 1, size: 20 });
        load(&mut table, &api, ticket.request);
        assert_eq!(table.window().page, 2);
        assert_eq!(table.window().total_pages, 2);
        assert_eq!(table.rows().len(), 20);
    }

    #[test]
    fn test_successful_mutation_clears_selection() {
        let api = StubApi::new().with_records("/api/parties", parties(3));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 0, size: 20 });

        assert!(table.toggle_selected_focused());
        assert!(table.toggle_expanded_focused());
        table.mutations.begin(&MutationKind::Update(1)).unwrap();
        table.on_mutation_finished(&MutationKind::Update(1), true, Instant::now());

        assert_eq!(table.selection.selected_count(), 0);
        assert!(!table.selection.is_expanded(1));
        assert_eq!(table.cursor(), 0);
        assert!(table.mutations.has_pending_refetch());
    }

    #[test]
    fn test_failed_delete_keeps_page() {
        let api = StubApi::new().with_records("/api/parties", parties(41));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 2, size: 20 });

        table.request_delete_focused();
        let id = table.mutations.confirm_delete().unwrap();
        table.on_mutation_finished(&MutationKind::Delete(id), false, Instant::now());

        assert_eq!(table.window().page, 3);
        assert!(!table.mutations.has_pending_refetch());
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let api = StubApi::new().with_records("/api/parties", parties(2));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 0, size: 20 });
        table.cursor_down();
        table.cursor_down();
        table.cursor_down();
        assert_eq!(table.cursor(), 1);
        table.set_search("partyFullName", "party 1");
        assert_eq!(table.cursor(), 0);
        table.cursor_up();
        assert_eq!(table.cursor(), 0);
    }

    #[test]
    fn test_cursor_first_and_last() {
        let api = StubApi::new().with_records("/api/parties", parties(4));
        let mut table = parties_table(20);
        load(&mut table, &api, PageRequest { page: 0, size: 20 });
        table.cursor_last();
        assert_eq!(table.focused_row().and_then(|r| r.id), Some(4));
        table.cursor_first();
        assert_eq!(table.cursor(), 0);
    }

    #[test]
    fn test_continued_generation_rejects_old_replies() {
        let mut old = parties_table(20);
        let stale = old.begin_fetch(PageRequest { page: 0, size: 20 });

        let mut table = parties_table(20).continue_from(old.generation());
        assert!(!table.is_current(stale.generation));
        let ticket = table.refresh();
        assert!(ticket.generation > stale.generation);
    }
}
