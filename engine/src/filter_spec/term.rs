//! Terms facets: one bucket per distinct value, filtered with a phrase match.

use common::{
    facet::{Facet, FacetKey, FilterValue},
    search_const::DEFAULT_TERM_FACET_SIZE,
    search_response::TermsFacetResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{FacetLabel, FilterKind, keyed};
use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermOrder {
    Count,
    Term,
    ReverseCount,
    ReverseTerm,
}

/// Options of a terms facet. Unset options are left out of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermFilter {
    /// Aggregate over a script field instead of the fieldname.
    pub script_field: Option<String>,
    /// Aggregate over several fields instead of the fieldname.
    pub fields: Option<Vec<String>>,
    pub size: Option<u32>,
    /// Also list terms that match no result.
    pub all_terms: Option<bool>,
    pub order: Option<TermOrder>,
    pub script: Option<String>,
}

impl Default for TermFilter {
    fn default() -> Self {
        Self {
            script_field: None,
            fields: None,
            size: Some(DEFAULT_TERM_FACET_SIZE),
            all_terms: Some(false),
            order: Some(TermOrder::Term),
            script: None,
        }
    }
}

impl TermFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// No size, ordering or `all_terms`: the index defaults apply.
    pub fn bare() -> Self {
        Self { size: None, all_terms: None, order: None, ..Self::default() }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn order(mut self, order: TermOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn all_terms(mut self, all_terms: bool) -> Self {
        self.all_terms = Some(all_terms);
        self
    }

    pub fn script_field(mut self, script_field: impl Into<String>) -> Self {
        self.script_field = Some(script_field.into());
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub(super) fn phrase_fragment(fieldname: &str, value: &FilterValue) -> Option<Value> {
        let FilterValue::Scalar(term) = value else {
            return None;
        };
        let matcher = keyed(fieldname, json!({ "query": term, "type": "phrase" }));
        Some(json!({ "query": { "match": matcher } }))
    }

    pub(super) fn terms_query(&self, fieldname: &str) -> Value {
        let mut terms = serde_json::Map::new();
        if let Some(script_field) = &self.script_field {
            terms.insert("script_field".to_string(), json!(script_field));
        } else if let Some(fields) = &self.fields {
            terms.insert("fields".to_string(), json!(fields));
        } else {
            terms.insert("field".to_string(), json!(fieldname));
        }
        if let Some(size) = self.size {
            terms.insert("size".to_string(), json!(size));
        }
        if let Some(all_terms) = self.all_terms {
            terms.insert("all_terms".to_string(), json!(all_terms));
        }
        if let Some(script) = &self.script {
            terms.insert("script".to_string(), json!(script));
        }
        if let Some(order) = self.order {
            terms.insert("order".to_string(), json!(order));
        }
        keyed("terms", Value::Object(terms))
    }

    pub(super) fn read_terms(fieldname: &str, raw: &Value) -> QueryResult<(Vec<Facet>, u64)> {
        let result: TermsFacetResult = serde_json::from_value(raw.clone())
            .map_err(|e| QueryError::MalformedResponse(format!("terms facet {:?}: {}", fieldname, e)))?;
        let total = result.terms.len() as u64 + result.other;
        let facets = result.terms.into_iter().map(|entry| Facet::term(entry.term, entry.count)).collect();
        Ok((facets, total))
    }

    pub(super) fn term_label(facet: &Facet, label: &FacetLabel<'_>) -> String {
        let term = match &facet.key {
            FacetKey::Term(term) => term.to_string(),
            FacetKey::Range(bounds) => FilterValue::Range(*bounds).to_string(),
        };
        format!("{}{}{} ({})", label.prefix, term, label.suffix, facet.count)
    }
}

impl FilterKind for TermFilter {
    fn kind_name(&self) -> &'static str {
        "term"
    }

    fn filter_fragment(&self, fieldname: &str, value: &FilterValue) -> Option<Value> {
        Self::phrase_fragment(fieldname, value)
    }

    fn facet_query(&self, fieldname: &str) -> Value {
        self.terms_query(fieldname)
    }

    fn read_facets(&self, fieldname: &str, raw: &Value) -> QueryResult<(Vec<Facet>, u64)> {
        Self::read_terms(fieldname, raw)
    }

    fn humanize(&self, facet: &Facet, label: &FacetLabel<'_>) -> String {
        Self::term_label(facet, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_facet_query_uses_the_fieldname() {
        assert_eq!(
            TermFilter::default().facet_query("foo"),
            json!({ "terms": { "field": "foo", "size": 5, "all_terms": false, "order": "term" } })
        );
        assert_eq!(
            TermFilter::bare().size(5).facet_query("foo"),
            json!({ "terms": { "field": "foo", "size": 5 } })
        );
    }

    #[test]
    fn script_field_wins_over_field_list() {
        let filter = TermFilter::bare()
            .script_field("doc.tags")
            .fields(vec!["a".into(), "b".into()])
            .script("term + 1")
            .order(TermOrder::ReverseCount);
        assert_eq!(
            filter.facet_query("tags"),
            json!({ "terms": { "script_field": "doc.tags", "script": "term + 1", "order": "reverse_count" } })
        );
        assert_eq!(
            TermFilter::bare().fields(vec!["a".into(), "b".into()]).facet_query("tags"),
            json!({ "terms": { "fields": ["a", "b"] } })
        );
    }

    #[test]
    fn total_facet_count_includes_other() {
        let raw = json!({ "terms": [{ "term": "a", "count": 4 }, { "term": "b", "count": 2 }], "other": 10, "missing": 1 });
        let (facets, total) = TermFilter::default().read_facets("tags", &raw).unwrap();
        assert_eq!(facets, vec![Facet::term("a", 4), Facet::term("b", 2)]);
        assert_eq!(total, 12);
    }

    #[test]
    fn label_wraps_prefix_and_suffix() {
        let label = FacetLabel { prefix: "#", suffix: "!", ..FacetLabel::default() };
        assert_eq!(TermFilter::default().humanize(&Facet::term("rust", 3), &label), "#rust! (3)");
    }
}
