//! Facet values, facet keys and the filter values a caller selects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single term value as it appears in a terms aggregation.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

/// Half-open numeric interval `[from, to)`. Either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

impl RangeBounds {
    pub fn new(from: Option<f64>, to: Option<f64>) -> Self {
        Self { from, to }
    }

    pub fn between(from: f64, to: f64) -> Self {
        Self { from: Some(from), to: Some(to) }
    }

    pub fn at_least(from: f64) -> Self {
        Self { from: Some(from), to: None }
    }

    pub fn below(to: f64) -> Self {
        Self { from: None, to: Some(to) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// What a facet counts: a term, or a range bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKey {
    Term(Scalar),
    Range(RangeBounds),
}

/// One aggregation bucket and its result count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub key: FacetKey,
    pub count: u64,
}

impl Facet {
    pub fn term(term: impl Into<Scalar>, count: u64) -> Self {
        Self { key: FacetKey::Term(term.into()), count }
    }

    pub fn range(bounds: RangeBounds, count: u64) -> Self {
        Self { key: FacetKey::Range(bounds), count }
    }

    /// Same key, no results yet.
    pub fn placeholder(key: FacetKey) -> Self {
        Self { key, count: 0 }
    }
}

/// The value a caller selects on a filter: a term, or a `{from, to}` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(Scalar),
    Range(RangeBounds),
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<RangeBounds> for FilterValue {
    fn from(value: RangeBounds) -> Self {
        FilterValue::Range(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Scalar(value.into())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Scalar(s) => write!(f, "{}", s),
            FilterValue::Range(r) => {
                let bound = |b: Option<f64>| b.map(|x| x.to_string()).unwrap_or_default();
                write!(f, "[{}, {})", bound(r.from), bound(r.to))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_deserialize_to_the_narrowest_variant() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[5, 2.5, "foo"]"#).unwrap();
        assert_eq!(values, vec![Scalar::Int(5), Scalar::Float(2.5), Scalar::from("foo")]);
    }

    #[test]
    fn filter_values_accept_scalars_and_ranges() {
        let values: Vec<FilterValue> = serde_json::from_str(r#"["bar", {"from": 10, "to": 20}, {"to": 5}]"#).unwrap();
        assert_eq!(values[0], FilterValue::from("bar"));
        assert_eq!(values[1], FilterValue::Range(RangeBounds::between(10.0, 20.0)));
        assert_eq!(values[2], FilterValue::Range(RangeBounds::below(5.0)));
    }

    #[test]
    fn absent_range_bounds_are_not_serialized() {
        let json = serde_json::to_value(RangeBounds::at_least(3.0)).unwrap();
        assert_eq!(json, serde_json::json!({"from": 3.0}));
    }
}
