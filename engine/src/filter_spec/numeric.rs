//! Terms facets over integer values.

use common::facet::{Facet, FacetKey, FilterValue, Scalar};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FacetLabel, FilterKind, TermFilter, incompatible};
use crate::error::{QueryError, QueryResult};

/// A [`TermFilter`] whose ids are integers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericFilter {
    pub terms: TermFilter,
}

impl NumericFilter {
    pub fn new(terms: TermFilter) -> Self {
        Self { terms }
    }
}

fn parse_int(id: &str) -> Option<i64> {
    id.trim().parse::<i64>().ok()
}

impl FilterKind for NumericFilter {
    fn kind_name(&self) -> &'static str {
        "numeric"
    }

    fn id_to_key(&self, id: &str) -> QueryResult<FacetKey> {
        parse_int(id)
            .map(|value| FacetKey::Term(Scalar::Int(value)))
            .ok_or_else(|| QueryError::InvalidNumericId(id.to_string()))
    }

    fn filter_value_to_key(&self, fieldname: &str, value: &FilterValue) -> QueryResult<FacetKey> {
        let parsed = match value {
            FilterValue::Scalar(Scalar::Int(i)) => Some(*i),
            FilterValue::Scalar(Scalar::Float(x)) if x.fract() == 0.0 => Some(*x as i64),
            FilterValue::Scalar(Scalar::Text(text)) => parse_int(text),
            _ => None,
        };
        parsed
            .map(|value| FacetKey::Term(Scalar::Int(value)))
            .ok_or_else(|| incompatible(fieldname, value))
    }

    fn filter_fragment(&self, fieldname: &str, value: &FilterValue) -> Option<Value> {
        TermFilter::phrase_fragment(fieldname, value)
    }

    fn facet_query(&self, fieldname: &str) -> Value {
        self.terms.terms_query(fieldname)
    }

    fn read_facets(&self, fieldname: &str, raw: &Value) -> QueryResult<(Vec<Facet>, u64)> {
        TermFilter::read_terms(fieldname, raw)
    }

    fn humanize(&self, facet: &Facet, label: &FacetLabel<'_>) -> String {
        TermFilter::term_label(facet, label)
    }
}
