use serde::{Deserialize, Serialize};


/// One hit of a search, tagged with the id the index gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl SearchResult {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

/// A facet as a selectable option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub count: u64,
    pub selected: bool,
    /// No result carries this value.
    pub muted: bool,
    /// Every result carries this value and nothing is selected on the filter.
    pub match_all: bool,
}
