//! Query cache for list responses
//!
//! Holds the most recent pages of the mounted resource only. A cached page
//! is shown while the real request is in flight; it never replaces one.
//! Written only by the list-fetch path and invalidated only after a
//! successful mutation on the same resource.

use super::api::PageResponse;
use super::query::ListQuery;
use std::collections::VecDeque;
use tracing::debug;

/// Pages kept for the mounted resource
pub const CACHE_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct QueryCache {
    resource: String,
    /// Oldest first
    entries: VecDeque<(ListQuery, PageResponse)>,
    capacity: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            resource: String::new(),
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, resource: &str, query: &ListQuery) -> Option<&PageResponse> {
        if resource != self.resource {
            return None;
        }
        self.entries
            .iter()
            .find(|(cached, _)| cached == query)
            .map(|(_, response)| response)
    }

    /// Store a page; pages of any other resource are dropped first and the
    /// oldest page goes once the cache is full
    pub fn insert(&mut self, resource: &str, query: ListQuery, response: PageResponse) {
        if resource != self.resource {
            if !self.entries.is_empty() {
                debug!(from = %self.resource, to = resource, "cache moved to another resource");
            }
            self.entries.clear();
            self.resource = resource.to_string();
        }
        self.entries.retain(|(cached, _)| *cached != query);
        self.entries.push_back((query, response));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Drop every cached page of `resource`
    pub fn invalidate(&mut self, resource: &str) {
        if resource == self.resource && !self.entries.is_empty() {
            debug!(resource, pages = self.entries.len(), "invalidated cached pages");
            self.entries.clear();
        }
    }
}
