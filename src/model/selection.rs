//! Selection and expansion tracking for the rendered page

use super::row::{RowId, UiRow};
use std::collections::HashSet;

/// Selected and expanded row ids, scoped to the loaded page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: HashSet<RowId>,
    expanded: HashSet<RowId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle selection, returning the new membership
    pub fn toggle_selected(&mut self, id: RowId) -> bool {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
            return true;
        }
        false
    }

    /// Toggle expansion, returning the new membership
    pub fn toggle_expanded(&mut self, id: RowId) -> bool {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
            return true;
        }
        false
    }

    pub fn is_selected(&self, id: RowId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_expanded(&self, id: RowId) -> bool {
        self.expanded.contains(&id)
    }

    /// Select every row that has an id
    pub fn select_all<'a>(&mut self, rows: impl IntoIterator<Item = &'a UiRow>) {
        self.selected.extend(rows.into_iter().filter_map(|r| r.id));
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Forget everything (refetch / remount)
    pub fn clear(&mut self) {
        self.selected.clear();
        self.expanded.clear();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}
