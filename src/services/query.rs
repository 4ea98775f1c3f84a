//! Collection query parameters and URL building

use crate::model::pagination::PageRequest;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

// Everything except RFC 3986 unreserved characters
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single query component
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

/// Join a base URL and a resource path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// A list request: 0-based page, size and server-side filters.
///
/// Filters are ordered so equal queries produce equal URLs and hash the
/// same in the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: usize,
    pub size: usize,
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new(request: PageRequest) -> Self {
        Self {
            page: request.page,
            size: request.size,
            filters: BTreeMap::new(),
        }
    }

    /// Add a filter such as `module.equals=ESCROW_AGREEMENT`
    pub fn filter(mut self, key: &str, value: impl ToString) -> Self {
        self.filters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            size: self.size,
        }
    }

    /// `page=..&size=..&<filter>=<value>...`
    pub fn to_query_string(&self) -> String {
        let mut parts = vec![format!("page={}", self.page), format!("size={}", self.size)];
        parts.extend(
            self.filters
                .iter()
                .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v))),
        );
        parts.join("&")
    }

    /// Full URL for `resource` under `base`
    pub fn url(&self, base: &str, resource: &str) -> String {
        format!("{}?{}", join_url(base, resource), self.to_query_string())
    }
}
