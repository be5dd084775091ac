//! Range facets: counts bucketed by configured `[from, to)` intervals.

use common::{
    facet::{Facet, FacetKey, FilterValue, RangeBounds},
    search_response::RangeFacetResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{FacetLabel, FilterKind, incompatible, keyed};
use crate::error::{QueryError, QueryResult};

static RANGE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d*\.?\d*)-(\d*\.?\d*)$").expect("range id pattern is valid"));

/// `"<from>-<to>"`, with an empty string for an absent bound.
pub fn encode_range_id(bounds: &RangeBounds) -> String {
    let bound = |b: Option<f64>| b.map(|x| x.to_string()).unwrap_or_default();
    format!("{}-{}", bound(bounds.from), bound(bounds.to))
}

pub fn decode_range_id(id: &str) -> QueryResult<RangeBounds> {
    let captures = RANGE_ID.captures(id).ok_or_else(|| QueryError::InvalidRangeId(id.to_string()))?;
    let bound = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    Ok(RangeBounds::new(bound(1), bound(2)))
}

/// Ids only carry unsigned finite bounds.
fn encodable(bound: Option<f64>) -> bool {
    bound.is_none_or(|x| x.is_finite() && x.is_sign_positive())
}

/// One configured bucket. The display overrides replace the numbers in labels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_to: Option<String>,
}

impl RangeBucket {
    pub fn new(from: Option<f64>, to: Option<f64>) -> Self {
        Self { from, to, ..Self::default() }
    }

    pub fn with_display(mut self, display_from: Option<&str>, display_to: Option<&str>) -> Self {
        self.display_from = display_from.map(str::to_string);
        self.display_to = display_to.map(str::to_string);
        self
    }

    pub fn bounds(&self) -> RangeBounds {
        RangeBounds::new(self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeFilter {
    /// Bucket on `key_field`, count `value_field`.
    pub key_field: Option<String>,
    pub value_field: Option<String>,
    /// Bucket on `key_script`, count `value_script`.
    pub key_script: Option<String>,
    pub value_script: Option<String>,
    pub ranges: Vec<RangeBucket>,
}

impl RangeFilter {
    pub fn new(ranges: Vec<RangeBucket>) -> Self {
        Self { ranges, ..Self::default() }
    }

    pub fn key_value_fields(mut self, key_field: impl Into<String>, value_field: impl Into<String>) -> Self {
        self.key_field = Some(key_field.into());
        self.value_field = Some(value_field.into());
        self
    }

    pub fn key_value_scripts(mut self, key_script: impl Into<String>, value_script: impl Into<String>) -> Self {
        self.key_script = Some(key_script.into());
        self.value_script = Some(value_script.into());
        self
    }

    fn bucket(&self, bounds: &RangeBounds) -> Option<&RangeBucket> {
        self.ranges.iter().find(|bucket| bucket.from == bounds.from && bucket.to == bounds.to)
    }
}

/// Integer part with thousands separators.
fn format_bound(value: f64) -> String {
    let integer = value.trunc() as i64;
    let digits = integer.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if integer < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

impl FilterKind for RangeFilter {
    fn kind_name(&self) -> &'static str {
        "range"
    }

    fn key_to_id(&self, key: &FacetKey) -> String {
        match key {
            FacetKey::Range(bounds) => encode_range_id(bounds),
            FacetKey::Term(term) => term.to_string(),
        }
    }

    fn id_to_key(&self, id: &str) -> QueryResult<FacetKey> {
        decode_range_id(id).map(FacetKey::Range)
    }

    fn filter_value_to_key(&self, fieldname: &str, value: &FilterValue) -> QueryResult<FacetKey> {
        match value {
            FilterValue::Range(bounds) if encodable(bounds.from) && encodable(bounds.to) => {
                Ok(FacetKey::Range(*bounds))
            }
            _ => Err(incompatible(fieldname, value)),
        }
    }

    fn filter_fragment(&self, fieldname: &str, value: &FilterValue) -> Option<Value> {
        let FilterValue::Range(bounds) = value else {
            return None;
        };
        let mut range = serde_json::Map::new();
        if let Some(from) = bounds.from {
            range.insert("from".to_string(), json!(from));
        }
        if let Some(to) = bounds.to {
            range.insert("to".to_string(), json!(to));
        }
        range.insert("include_lower".to_string(), json!(true));
        range.insert("include_upper".to_string(), json!(false));
        Some(keyed("range", keyed(fieldname, Value::Object(range))))
    }

    fn facet_query(&self, fieldname: &str) -> Value {
        let mut range = serde_json::Map::new();
        if let Some(key_field) = &self.key_field {
            range.insert("key_field".to_string(), json!(key_field));
            range.insert("value_field".to_string(), json!(self.value_field));
        } else if let Some(key_script) = &self.key_script {
            range.insert("key_script".to_string(), json!(key_script));
            range.insert("value_script".to_string(), json!(self.value_script));
        } else {
            range.insert("field".to_string(), json!(fieldname));
        }
        let ranges = self.ranges.iter().map(|bucket| json!(bucket.bounds())).collect();
        range.insert("ranges".to_string(), Value::Array(ranges));
        keyed("range", Value::Object(range))
    }

    fn read_facets(&self, fieldname: &str, raw: &Value) -> QueryResult<(Vec<Facet>, u64)> {
        let result: RangeFacetResult = serde_json::from_value(raw.clone())
            .map_err(|e| QueryError::MalformedResponse(format!("range facet {:?}: {}", fieldname, e)))?;
        let facets = result
            .ranges
            .into_iter()
            .map(|entry| Facet::range(RangeBounds::new(entry.from, entry.to), entry.count))
            .collect();
        Ok((facets, self.ranges.len() as u64))
    }

    fn humanize(&self, facet: &Facet, label: &FacetLabel<'_>) -> String {
        let FacetKey::Range(bounds) = &facet.key else {
            return format!("{}{}{} ({})", label.prefix, self.key_to_id(&facet.key), label.suffix, facet.count);
        };
        let bucket = self.bucket(bounds);
        let shown = |bound: Option<f64>, display: Option<&String>| {
            let text = display.cloned().unwrap_or_else(|| bound.map(format_bound).unwrap_or_default());
            format!("{}{}{}", label.prefix, text, label.suffix)
        };
        let from = shown(bounds.from, bucket.and_then(|b| b.display_from.as_ref()));
        let to = shown(bounds.to, bucket.and_then(|b| b.display_to.as_ref()));
        match (bounds.from, bounds.to) {
            (Some(_), Some(_)) => format!("from {} to {} ({})", from, to, facet.count),
            (Some(_), None) => format!("more than {} ({})", from, facet.count),
            (None, Some(_)) => format!("less than {} ({})", to, facet.count),
            (None, None) => format!("any ({})", facet.count),
        }
    }

    fn validate(&self) -> QueryResult<()> {
        if self.key_field.is_some() != self.value_field.is_some() {
            return Err(QueryError::Configuration("key_field and value_field go together".to_string()));
        }
        if self.key_script.is_some() != self.value_script.is_some() {
            return Err(QueryError::Configuration("key_script and value_script go together".to_string()));
        }
        Ok(())
    }
}
