//! Request document types.

use serde::{Deserialize, Serialize};

/// A compiled search request. Keys keep their insertion order.
pub type SearchRequest = serde_json::Map<String, serde_json::Value>;

/// A window into the result list, sent as the `from` / `size` request keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub from: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(from: u64, size: u64) -> Self {
        Self { from, size }
    }

    /// Seed document carrying only the paging keys.
    pub fn to_request(&self) -> SearchRequest {
        let mut request = SearchRequest::new();
        request.insert("from".to_string(), self.from.into());
        request.insert("size".to_string(), self.size.into());
        request
    }
}
