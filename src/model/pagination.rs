//! Pagination reconciler
//!
//! The table is paged by the server while no search is active. Once a
//! search is typed, only the loaded page is filtered, so paging switches to
//! slicing the filtered rows in memory. The two accounting modes are a
//! tagged union so exactly one of them is ever effective.
//!
//! Numbering: server pages are 0-based (that is what the REST API takes),
//! client pages and everything shown to the user are 1-based.

use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// `page` block of a collection response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub size: usize,
    #[serde(default)]
    pub number: usize,
    #[serde(default)]
    pub total_elements: usize,
    #[serde(default)]
    pub total_pages: usize,
}

/// Server-side accounting (0-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerPage {
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

/// Client-side accounting over filtered rows (1-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientPage {
    pub page: usize,
    pub rows_per_page: usize,
    pub total_rows: usize,
    pub total_pages: usize,
}

/// Which accounting is effective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    Server(ServerPage),
    /// Search active; the server position is parked until the search clears
    Client {
        client: ClientPage,
        suspended: ServerPage,
    },
}

/// Parameters for a collection fetch (0-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

/// What the pagination footer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub start_item: usize,
    pub end_item: usize,
}

/// Number of pages needed for `total` rows, never less than one
pub fn page_count(total: usize, size: usize) -> usize {
    if size == 0 {
        return 1;
    }
    total.div_ceil(size).max(1)
}

impl ServerPage {
    fn new(size: usize) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            total_elements: 0,
            total_pages: 1,
        }
    }

    fn effective_total_pages(&self) -> usize {
        if self.total_pages == 0 {
            page_count(self.total_elements, self.size)
        } else {
            self.total_pages.max(1)
        }
    }

    fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            size: self.size,
        }
    }

    fn window(&self) -> PageWindow {
        let total = self.total_elements;
        let (start_item, end_item) = if total == 0 {
            (0, 0)
        } else {
            let end = ((self.page + 1) * self.size).min(total);
            ((self.page * self.size + 1).min(end), end)
        };
        PageWindow {
            page: self.page + 1,
            total_pages: self.effective_total_pages(),
            total_rows: total,
            start_item,
            end_item,
        }
    }
}

impl ClientPage {
    fn recount(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
        self.total_pages = page_count(total_rows, self.rows_per_page);
        self.page = self.page.clamp(1, self.total_pages);
    }

    fn window(&self) -> PageWindow {
        let (start_item, end_item) = if self.total_rows == 0 {
            (0, 0)
        } else {
            (
                (self.page - 1) * self.rows_per_page + 1,
                (self.page * self.rows_per_page).min(self.total_rows),
            )
        };
        PageWindow {
            page: self.page,
            total_pages: self.total_pages,
            total_rows: self.total_rows,
            start_item,
            end_item,
        }
    }
}

/// Pagination state for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    mode: PaginationMode,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(size: usize) -> Self {
        Self {
            mode: PaginationMode::Server(ServerPage::new(size)),
        }
    }

    pub fn mode(&self) -> &PaginationMode {
        &self.mode
    }

    pub fn is_client_mode(&self) -> bool {
        matches!(self.mode, PaginationMode::Client { .. })
    }

    fn server(&self) -> &ServerPage {
        match &self.mode {
            PaginationMode::Server(server) => server,
            PaginationMode::Client { suspended, .. } => suspended,
        }
    }

    fn server_mut(&mut self) -> &mut ServerPage {
        match &mut self.mode {
            PaginationMode::Server(server) => server,
            PaginationMode::Client { suspended, .. } => suspended,
        }
    }

    /// Rows per page in whichever mode is effective
    pub fn page_size(&self) -> usize {
        match &self.mode {
            PaginationMode::Server(server) => server.size,
            PaginationMode::Client { client, .. } => client.rows_per_page,
        }
    }

    /// The server request matching the current (or parked) server position
    pub fn request(&self) -> PageRequest {
        self.server().request()
    }

    /// Record metadata from a collection response
    pub fn apply_server_meta(&mut self, meta: &PageMeta) {
        let server = self.server_mut();
        if meta.size > 0 {
            server.size = meta.size;
        }
        server.page = meta.number;
        server.total_elements = meta.total_elements;
        server.total_pages = meta.total_pages;
    }

    /// Reconcile with the search state.
    ///
    /// `filtered_len` is the number of loaded rows that pass the search.
    /// Returns a request when leaving client mode, since the server
    /// position restarts at the first page.
    pub fn sync_search(&mut self, active: bool, filtered_len: usize) -> Option<PageRequest> {
        match (self.mode, active) {
            (PaginationMode::Server(suspended), true) => {
                let mut client = ClientPage {
                    page: 1,
                    rows_per_page: suspended.size,
                    total_rows: 0,
                    total_pages: 1,
                };
                client.recount(filtered_len);
                self.mode = PaginationMode::Client { client, suspended };
                None
            }
            (PaginationMode::Client { mut client, suspended }, true) => {
                client.recount(filtered_len);
                self.mode = PaginationMode::Client { client, suspended };
                None
            }
            (PaginationMode::Client { suspended, .. }, false) => {
                let server = ServerPage { page: 0, ..suspended };
                self.mode = PaginationMode::Server(server);
                Some(server.request())
            }
            (PaginationMode::Server(_), false) => None,
        }
    }

    /// Jump to a 1-based page, clamped to the valid range.
    ///
    /// Returns the server request to issue in server mode; client mode pages
    /// locally and never needs one.
    pub fn go_to(&mut self, page: usize) -> Option<PageRequest> {
        match &mut self.mode {
            PaginationMode::Server(server) => {
                let target = page.clamp(1, server.effective_total_pages()) - 1;
                if target == server.page {
                    return None;
                }
                server.page = target;
                Some(server.request())
            }
            PaginationMode::Client { client, .. } => {
                client.page = page.clamp(1, client.total_pages);
                None
            }
        }
    }

    pub fn next_page(&mut self) -> Option<PageRequest> {
        let window = self.window();
        self.go_to(window.page + 1)
    }

    pub fn prev_page(&mut self) -> Option<PageRequest> {
        let window = self.window();
        self.go_to(window.page.saturating_sub(1))
    }

    pub fn first_page(&mut self) -> Option<PageRequest> {
        self.go_to(1)
    }

    pub fn last_page(&mut self) -> Option<PageRequest> {
        let window = self.window();
        self.go_to(window.total_pages)
    }

    /// Change the page size; always restarts at the first page and always
    /// asks the server for data at the new size.
    pub fn set_rows_per_page(&mut self, size: usize) -> PageRequest {
        let size = size.max(1);
        match &mut self.mode {
            PaginationMode::Server(server) => {
                server.page = 0;
                server.size = size;
            }
            PaginationMode::Client { client, suspended } => {
                client.rows_per_page = size;
                client.page = 1;
                client.recount(client.total_rows);
                suspended.page = 0;
                suspended.size = size;
            }
        }
        self.request()
    }

    /// Footer numbers for the effective mode
    pub fn window(&self) -> PageWindow {
        match &self.mode {
            PaginationMode::Server(server) => server.window(),
            PaginationMode::Client { client, .. } => client.window(),
        }
    }

    /// Slice of the (filtered) loaded rows to render
    pub fn visible_range(&self, len: usize) -> Range<usize> {
        match &self.mode {
            PaginationMode::Server(_) => 0..len,
            PaginationMode::Client { client, .. } => {
                let start = ((client.page - 1) * client.rows_per_page).min(len);
                let end = (start + client.rows_per_page).min(len);
                start..end
            }
        }
    }

    /// Recompute the server position after a successful delete.
    ///
    /// `rows_on_page` is how many rows the server page held before the
    /// delete. Removing the last row of a page walks back one page.
    pub fn after_delete(&mut self, rows_on_page: usize) -> PageRequest {
        let server = self.server_mut();
        server.total_elements = server.total_elements.saturating_sub(1);
        server.total_pages = page_count(server.total_elements, server.size);
        if rows_on_page <= 1 {
            server.page = server.page.saturating_sub(1);
        }
        server.page = server.page.min(server.total_pages - 1);
        server.request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(number: usize, size: usize, total: usize) -> PageMeta {
        PageMeta {
            size,
            number,
            total_elements: total,
            total_pages: page_count(total, size),
        }
    }

    #[test]
    fn test_server_window_last_partial_page() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&meta(2, 20, 45));

        let w = p.window();
        assert_eq!(w.start_item, 41);
        assert_eq!(w.end_item, 45);
        assert_eq!(w.total_pages, 3);
        assert_eq!(w.page, 3);
    }

    #[test]
    fn test_zero_total_has_one_page() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&PageMeta {
            size: 20,
            number: 0,
            total_elements: 0,
            total_pages: 0,
        });

        let w = p.window();
        assert_eq!(w.total_pages, 1);
        assert_eq!(w.start_item, 0);
        assert_eq!(w.end_item, 0);
        assert_eq!(p.visible_range(0), 0..0);

        p.sync_search(true, 0);
        let w = p.window();
        assert_eq!(w.total_pages, 1);
        assert_eq!((w.start_item, w.end_item), (0, 0));
    }

    #[test]
    fn test_end_item_never_exceeds_total() {
        for total in 0..70 {
            for page in 0..5 {
                let mut p = Pagination::new(20);
                p.apply_server_meta(&meta(page, 20, total));
                let w = p.window();
                assert!(w.end_item <= total);
                assert!(w.start_item <= w.end_item);
                assert!(w.total_pages >= 1);
            }
        }
    }

    #[test]
    fn test_server_navigation_converts_to_zero_based() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&meta(0, 20, 45));

        assert_eq!(p.go_to(2), Some(PageRequest { page: 1, size: 20 }));
        assert_eq!(p.next_page(), Some(PageRequest { page: 2, size: 20 }));
        // Already on the last page
        assert_eq!(p.next_page(), None);
        assert_eq!(p.first_page(), Some(PageRequest { page: 0, size: 20 }));
        assert_eq!(p.prev_page(), None);
        assert_eq!(p.go_to(99), Some(PageRequest { page: 2, size: 20 }));
    }

    #[test]
    fn test_search_switches_to_client_mode_at_page_one() {
        let mut p = Pagination::new(5);
        p.apply_server_meta(&meta(3, 5, 100));

        assert_eq!(p.sync_search(true, 12), None);
        assert!(p.is_client_mode());
        let w = p.window();
        assert_eq!(w.page, 1);
        assert_eq!(w.total_rows, 12);
        assert_eq!(w.total_pages, 3);
        assert_eq!((w.start_item, w.end_item), (1, 5));

        // Client paging never hits the server
        assert_eq!(p.go_to(3), None);
        let w = p.window();
        assert_eq!((w.start_item, w.end_item), (11, 12));
        assert_eq!(p.visible_range(12), 10..12);
    }

    #[test]
    fn test_filter_shrinking_clamps_client_page() {
        let mut p = Pagination::new(5);
        p.sync_search(true, 12);
        p.go_to(3);
        p.sync_search(true, 4);
        assert_eq!(p.window().page, 1);
        assert_eq!(p.visible_range(4), 0..4);
    }

    #[test]
    fn test_clearing_search_returns_to_first_server_page() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&meta(2, 20, 45));
        p.sync_search(true, 3);

        let request = p.sync_search(false, 20);
        assert_eq!(request, Some(PageRequest { page: 0, size: 20 }));
        assert!(!p.is_client_mode());
        assert_eq!(p.window().page, 1);
    }

    #[test]
    fn test_rows_per_page_resets_in_both_modes() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&meta(2, 20, 45));
        assert_eq!(p.set_rows_per_page(50), PageRequest { page: 0, size: 50 });
        assert_eq!(p.window().page, 1);

        p.sync_search(true, 30);
        p.go_to(2);
        assert_eq!(p.set_rows_per_page(10), PageRequest { page: 0, size: 10 });
        let w = p.window();
        assert_eq!(w.page, 1);
        assert_eq!(w.total_pages, 3);

        // Clearing the search later resumes at the new size
        assert_eq!(p.sync_search(false, 10), Some(PageRequest { page: 0, size: 10 }));
    }

    #[test]
    fn test_delete_only_row_on_last_page_walks_back() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&meta(2, 20, 41));

        let request = p.after_delete(1);
        assert_eq!(request, PageRequest { page: 1, size: 20 });
        assert_eq!(p.window().page, 2);
        assert_eq!(p.window().total_pages, 2);
    }

    #[test]
    fn test_delete_with_rows_remaining_keeps_page() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&meta(1, 20, 45));
        assert_eq!(p.after_delete(20), PageRequest { page: 1, size: 20 });
    }

    #[test]
    fn test_delete_on_first_page_stays_at_zero() {
        let mut p = Pagination::new(20);
        p.apply_server_meta(&meta(0, 20, 1));
        assert_eq!(p.after_delete(1), PageRequest { page: 0, size: 20 });
        assert_eq!(p.window().total_pages, 1);
    }

    #[test]
    fn test_page_meta_deserializes_camel_case() {
        let meta: PageMeta =
            serde_json::from_str(r#"{"size":20,"number":1,"totalElements":45,"totalPages":3}"#).unwrap();
        assert_eq!(meta.total_elements, 45);
        assert_eq!(meta.total_pages, 3);
    }
}
