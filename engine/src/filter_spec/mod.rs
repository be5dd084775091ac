//! Facetable fields: what can be selected, what is selected, and the request
//! fragments a selection turns into.
//!
//! A [`FilterSpec`] holds the state every filter shares (selection, available facets,
//! placeholder cache, counts). Everything that depends on the kind of filter goes
//! through [`FilterKind`], implemented by [`TermFilter`], [`NumericFilter`] and
//! [`RangeFilter`].

mod numeric;
mod range;
mod term;

pub use numeric::NumericFilter;
pub use range::{RangeBucket, RangeFilter, decode_range_id, encode_range_id};
pub use term::{TermFilter, TermOrder};

use std::{collections::BTreeMap, fmt, sync::Arc};

use common::{
    facet::{Facet, FacetKey, FilterValue},
    search_response::SearchResponse,
    search_result::Choice,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{QueryError, QueryResult},
    ordered::Keyed,
    toggle::Toggle,
};

/// Decoration handed to [`FilterKind::humanize`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacetLabel<'a> {
    pub prefix: &'a str,
    pub suffix: &'a str,
    pub muted: bool,
    pub match_all: bool,
}

/// The type-specific half of a filter.
///
/// Conversions default to the scalar behaviour (ids are the term rendered as text);
/// range-like kinds override them.
pub trait FilterKind: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn kind_name(&self) -> &'static str;

    fn key_to_id(&self, key: &FacetKey) -> String {
        match key {
            FacetKey::Term(term) => term.to_string(),
            FacetKey::Range(bounds) => encode_range_id(bounds),
        }
    }

    fn id_to_key(&self, id: &str) -> QueryResult<FacetKey> {
        Ok(FacetKey::Term(id.into()))
    }

    fn key_to_filter_value(&self, key: &FacetKey) -> FilterValue {
        match key {
            FacetKey::Term(term) => FilterValue::Scalar(term.clone()),
            FacetKey::Range(bounds) => FilterValue::Range(*bounds),
        }
    }

    fn filter_value_to_key(&self, fieldname: &str, value: &FilterValue) -> QueryResult<FacetKey> {
        match value {
            FilterValue::Scalar(term) => Ok(FacetKey::Term(term.clone())),
            FilterValue::Range(_) => Err(incompatible(fieldname, value)),
        }
    }

    /// Condition restricting results to `value`.
    fn filter_fragment(&self, fieldname: &str, value: &FilterValue) -> Option<Value>;

    /// Aggregation request, without any `facet_filter`.
    fn facet_query(&self, fieldname: &str) -> Value;

    /// Decodes this filter's facet section. Returns the facets and the total facet count.
    fn read_facets(&self, fieldname: &str, raw: &Value) -> QueryResult<(Vec<Facet>, u64)>;

    fn humanize(&self, facet: &Facet, label: &FacetLabel<'_>) -> String;

    fn validate(&self) -> QueryResult<()> {
        Ok(())
    }
}

pub(crate) fn incompatible(fieldname: &str, value: &FilterValue) -> QueryError {
    QueryError::IncompatibleValue { fieldname: fieldname.to_string(), value: value.to_string() }
}

/// `{ key: value }`
pub(crate) fn keyed(key: impl Into<String>, value: Value) -> Value {
    let mut object = serde_json::Map::new();
    object.insert(key.into(), value);
    Value::Object(object)
}

/// What one response says about one filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacetCounts {
    pub facets: Vec<Facet>,
    pub total_facet_count: u64,
    pub total_results_count: u64,
}

/// How several selected values of one filter combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiOperator {
    #[default]
    Or,
    And,
}

impl MultiOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            MultiOperator::Or => "or",
            MultiOperator::And => "and",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterSpec {
    fieldname: String,
    label: String,
    kind: Arc<dyn FilterKind>,
    enabled: Toggle,
    multiple: bool,
    multi_operator: MultiOperator,
    prefix: String,
    suffix: String,
    expandable: bool,
    collapsible: bool,

    available_facets: Vec<Facet>,
    selected: Vec<FilterValue>,
    /// Zero-count stand-ins for selected values no response has counted yet, by id.
    cache: BTreeMap<String, Facet>,
    total_facet_count: u64,
    total_results_count: u64,
}

impl FilterSpec {
    pub fn new(fieldname: impl Into<String>, kind: impl FilterKind + 'static) -> Self {
        let fieldname = fieldname.into();
        Self {
            label: fieldname.clone(),
            fieldname,
            kind: Arc::new(kind),
            enabled: Toggle::default(),
            multiple: true,
            multi_operator: MultiOperator::default(),
            prefix: String::new(),
            suffix: String::new(),
            expandable: true,
            collapsible: true,
            available_facets: Vec::new(),
            selected: Vec::new(),
            cache: BTreeMap::new(),
            total_facet_count: 0,
            total_results_count: 0,
        }
    }

    pub fn term(fieldname: impl Into<String>) -> Self {
        Self::new(fieldname, TermFilter::default())
    }

    pub fn numeric(fieldname: impl Into<String>) -> Self {
        Self::new(fieldname, NumericFilter::default())
    }

    pub fn range(fieldname: impl Into<String>, ranges: Vec<RangeBucket>) -> Self {
        Self::new(fieldname, RangeFilter::new(ranges))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_enabled(mut self, enabled: impl Into<Toggle>) -> Self {
        self.enabled = enabled.into();
        self
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_operator(mut self, operator: MultiOperator) -> Self {
        self.multi_operator = operator;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }

    pub fn with_collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = collapsible;
        self
    }

    /// Starts out with `facets` available, as if a response had listed them.
    pub fn with_facets(mut self, facets: Vec<Facet>) -> Self {
        self.update_facets(facets);
        self
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.fieldname.is_empty() {
            return Err(QueryError::Configuration("a fieldname is required".to_string()));
        }
        if !self.expandable && !self.collapsible {
            return Err(QueryError::Configuration(format!(
                "filter {:?} cannot be displayed: neither expandable nor collapsible",
                self.fieldname
            )));
        }
        self.kind.validate()
    }

    // accessors

    pub fn fieldname(&self) -> &str {
        &self.fieldname
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &dyn FilterKind {
        self.kind.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_expandable(&self) -> bool {
        self.expandable
    }

    pub fn is_collapsible(&self) -> bool {
        self.collapsible
    }

    pub fn multi_operator(&self) -> MultiOperator {
        self.multi_operator
    }

    pub fn available_facets(&self) -> &[Facet] {
        &self.available_facets
    }

    pub fn selected_values(&self) -> &[FilterValue] {
        &self.selected
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn total_facet_count(&self) -> u64 {
        self.total_facet_count
    }

    pub fn total_results_count(&self) -> u64 {
        self.total_results_count
    }

    /// More facets exist than the response listed.
    pub fn has_more(&self) -> bool {
        self.total_facet_count > self.available_facets.len() as u64
    }

    // conversions

    pub fn facet_to_id(&self, facet: &Facet) -> String {
        self.kind.key_to_id(&facet.key)
    }

    pub fn facets_to_ids(&self, facets: &[Facet]) -> Vec<String> {
        facets.iter().map(|facet| self.facet_to_id(facet)).collect()
    }

    /// Looks `id` up in the available facets, then in the selection cache, and
    /// otherwise synthesizes a zero-count facet from the id itself.
    pub fn id_to_facet(&self, id: &str) -> QueryResult<Facet> {
        let key = self.kind.id_to_key(id)?;
        if let Some(facet) = self
            .available_facets
            .iter()
            .find(|facet| facet.key == key || self.kind.key_to_id(&facet.key) == id)
        {
            return Ok(facet.clone());
        }
        if let Some(facet) = self.cache.get(id).or_else(|| self.cache.get(&self.kind.key_to_id(&key))) {
            return Ok(facet.clone());
        }
        Ok(Facet::placeholder(key))
    }

    pub fn ids_to_facets<S: AsRef<str>>(&self, ids: &[S]) -> QueryResult<Vec<Facet>> {
        ids.iter().map(|id| self.id_to_facet(id.as_ref())).collect()
    }

    pub fn facet_to_filter_value(&self, facet: &Facet) -> FilterValue {
        self.kind.key_to_filter_value(&facet.key)
    }

    pub fn facets_to_filter_values(&self, facets: &[Facet]) -> Vec<FilterValue> {
        facets.iter().map(|facet| self.facet_to_filter_value(facet)).collect()
    }

    pub fn id_to_filter_value(&self, id: &str) -> QueryResult<FilterValue> {
        Ok(self.facet_to_filter_value(&self.id_to_facet(id)?))
    }

    pub fn ids_to_filter_values<S: AsRef<str>>(&self, ids: &[S]) -> QueryResult<Vec<FilterValue>> {
        ids.iter().map(|id| self.id_to_filter_value(id.as_ref())).collect()
    }

    pub fn filter_value_to_id(&self, value: &FilterValue) -> QueryResult<String> {
        let key = self.kind.filter_value_to_key(&self.fieldname, value)?;
        Ok(self.kind.key_to_id(&key))
    }

    pub fn filter_values_to_ids(&self, values: &[FilterValue]) -> QueryResult<Vec<String>> {
        values.iter().map(|value| self.filter_value_to_id(value)).collect()
    }

    pub fn humanize(&self, facet: &Facet) -> String {
        let label = FacetLabel {
            prefix: &self.prefix,
            suffix: &self.suffix,
            muted: facet.count == 0,
            match_all: self.matches_all_results(facet),
        };
        self.kind.humanize(facet, &label)
    }

    pub fn humanize_all(&self, facets: &[Facet]) -> Vec<String> {
        facets.iter().map(|facet| self.humanize(facet)).collect()
    }

    /// The facet covers every result and this filter has nothing selected.
    pub fn matches_all_results(&self, facet: &Facet) -> bool {
        facet.count == self.total_results_count && self.selected.is_empty()
    }

    // choices

    pub fn choices(&self) -> Vec<Choice> {
        self.available_facets.iter().map(|facet| self.choice(facet)).collect()
    }

    pub fn selected_choices(&self) -> QueryResult<Vec<Choice>> {
        Ok(self.selected_facets()?.iter().map(|facet| self.choice(facet)).collect())
    }

    fn choice(&self, facet: &Facet) -> Choice {
        let id = self.facet_to_id(facet);
        Choice {
            text: self.humanize(facet),
            count: facet.count,
            selected: self.is_id_selected(&id),
            muted: facet.count == 0,
            match_all: self.matches_all_results(facet),
            id,
        }
    }

    pub fn selected_ids(&self) -> QueryResult<Vec<String>> {
        self.filter_values_to_ids(&self.selected)
    }

    pub fn selected_facets(&self) -> QueryResult<Vec<Facet>> {
        self.ids_to_facets(&self.selected_ids()?)
    }

    pub fn is_id_selected(&self, id: &str) -> bool {
        self.selected
            .iter()
            .filter_map(|value| self.filter_value_to_id(value).ok())
            .any(|selected| selected == id)
    }

    // selection

    /// Replaces the selection and returns the previous one.
    ///
    /// Values are stored in the form the filter's ids decode to, so a selection
    /// survives `id -> value -> id` unchanged. Every selected key also gets a
    /// zero-count placeholder, which stands in whenever no available facet backs it.
    /// Nothing changes on error.
    pub fn select_all(&mut self, values: Vec<FilterValue>) -> QueryResult<Vec<FilterValue>> {
        let mut cache = BTreeMap::new();
        let mut selected = Vec::with_capacity(values.len());
        for value in &values {
            let key = self.kind.filter_value_to_key(&self.fieldname, value)?;
            selected.push(self.kind.key_to_filter_value(&key));
            cache.insert(self.kind.key_to_id(&key), Facet::placeholder(key));
        }
        self.cache = cache;
        Ok(std::mem::replace(&mut self.selected, selected))
    }

    pub fn unselect_all(&mut self) -> Vec<FilterValue> {
        self.cache.clear();
        std::mem::take(&mut self.selected)
    }

    // request fragments

    /// Condition for the current selection, `None` when disabled or nothing is selected.
    pub fn compute_filter_query(&self) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        match self.selected.as_slice() {
            [] => None,
            [single] => self.kind.filter_fragment(&self.fieldname, single),
            many => {
                let fragments = many
                    .iter()
                    .filter_map(|value| self.kind.filter_fragment(&self.fieldname, value))
                    .collect::<Vec<_>>();
                if fragments.is_empty() {
                    return None;
                }
                Some(keyed(self.multi_operator.as_str(), Value::Array(fragments)))
            }
        }
    }

    /// Same condition as [`Self::compute_filter_query`]; used to scope sibling facets.
    pub fn compute_facet_filter(&self) -> Option<Value> {
        self.compute_filter_query()
    }

    /// Aggregation request for this filter, scoped by `exclude` when given.
    pub fn compute_facet_query(&self, exclude: Option<Value>) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        let mut query = self.kind.facet_query(&self.fieldname);
        if let (Some(filter), Value::Object(object)) = (exclude, &mut query) {
            object.insert("facet_filter".to_string(), filter);
        }
        Some(query)
    }

    // responses

    /// Decodes this filter's share of `response` without touching any state.
    /// A disabled filter reads as zero counts and no facets.
    pub fn read_response(&self, response: &SearchResponse) -> QueryResult<FacetCounts> {
        if !self.is_enabled() {
            return Ok(FacetCounts::default());
        }
        let Some(raw) = response.facet(&self.fieldname) else {
            tracing::warn!(fieldname = %self.fieldname, "response carries no facet section for filter");
            return Ok(FacetCounts { total_results_count: response.hits.total, ..FacetCounts::default() });
        };
        let (facets, total_facet_count) = self.kind.read_facets(&self.fieldname, raw)?;
        tracing::debug!(
            fieldname = %self.fieldname,
            kind = self.kind.kind_name(),
            facets = facets.len(),
            total_facet_count,
            "parsed facets"
        );
        Ok(FacetCounts { facets, total_facet_count, total_results_count: response.hits.total })
    }

    /// Reads this filter's facets out of `response` and updates the counts.
    /// The counts stay as they were when the facet section cannot be decoded.
    pub fn parse_response(&mut self, response: &SearchResponse) -> QueryResult<Vec<Facet>> {
        let counts = self.read_response(response)?;
        self.total_results_count = counts.total_results_count;
        self.total_facet_count = counts.total_facet_count;
        Ok(counts.facets)
    }

    pub fn update_facets(&mut self, facets: Vec<Facet>) {
        self.available_facets = facets;
    }

    /// Counts and facets in one step, from an already decoded [`FacetCounts`].
    pub fn apply_counts(&mut self, counts: FacetCounts) {
        self.total_results_count = counts.total_results_count;
        self.total_facet_count = counts.total_facet_count;
        self.update_facets(counts.facets);
    }

    /// [`Self::read_response`] followed by [`Self::apply_counts`].
    pub fn refresh(&mut self, response: &SearchResponse) -> QueryResult<()> {
        let counts = self.read_response(response)?;
        self.apply_counts(counts);
        Ok(())
    }
}

impl Keyed for FilterSpec {
    fn fieldname(&self) -> &str {
        &self.fieldname
    }
}
