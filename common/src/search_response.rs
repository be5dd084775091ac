//! Typed view over a search response document.

use serde::{Deserialize, Serialize};

use crate::facet::Scalar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: SearchResponseHits,
    /// Raw facet sections keyed by fieldname. Each filter decodes its own entry.
    #[serde(default)]
    pub facets: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub took: Option<u64>,
}

impl SearchResponse {
    pub fn facet(&self, fieldname: &str) -> Option<&serde_json::Value> {
        self.facets.get(fieldname)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponseHits {
    pub total: u64,
    #[serde(default)]
    pub hits: Vec<SearchResponseHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponseHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub fields: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
}

/// Body of a `terms` facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsFacetResult {
    pub terms: Vec<TermFacetEntry>,
    /// Results whose term fell outside the returned list.
    #[serde(default)]
    pub other: u64,
    #[serde(default)]
    pub missing: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermFacetEntry {
    pub term: Scalar,
    pub count: u64,
}

/// Body of a `range` facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFacetResult {
    pub ranges: Vec<RangeFacetEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFacetEntry {
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
    pub count: u64,
}
