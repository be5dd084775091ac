//! Declarative setup of a [`QueryContext`] from a JSON document.
//!
//! ```json
//! {
//!   "page_length": 20,
//!   "fields": [{ "fieldname": "title", "order_by": "asc" }],
//!   "filters": [
//!     { "fieldname": "tags", "type": "term", "size": 10 },
//!     { "fieldname": "price", "type": "range", "ranges": [{ "to": 100 }, { "from": 100 }] }
//!   ]
//! }
//! ```

use common::search_const::DEFAULT_PAGE_LENGTH;
use serde::{Deserialize, Serialize};

use crate::{
    compiler::CompilerOptions,
    context::QueryContext,
    error::{QueryError, QueryResult},
    field_spec::{FieldSpec, SortDirection},
    filter_spec::{FilterSpec, MultiOperator, NumericFilter, RangeFilter, TermFilter},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub page_length: u64,
    pub compiler: CompilerOptions,
    pub fields: Vec<FieldDefinition>,
    pub filters: Vec<FilterDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_length: DEFAULT_PAGE_LENGTH,
            compiler: CompilerOptions::default(),
            fields: Vec::new(),
            filters: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// The document must be a JSON object; every key is optional.
    pub fn from_json_str(json: &str) -> QueryResult<Self> {
        let invalid = |e: serde_json::Error| QueryError::Configuration(format!("invalid engine config: {e}"));
        let document: serde_json::Value = serde_json::from_str(json).map_err(invalid)?;
        if !document.is_object() {
            return Err(QueryError::Configuration("engine config must be a JSON object".to_string()));
        }
        serde_json::from_value(document).map_err(invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub fieldname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<SortDirection>,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "enabled")]
    pub display: bool,
}

fn enabled() -> bool {
    true
}

impl FieldDefinition {
    pub fn build(&self) -> FieldSpec {
        let mut field = FieldSpec::new(&self.fieldname).with_enabled(self.enabled).with_displayed(self.display);
        if let Some(title) = &self.title {
            field = field.with_title(title);
        }
        if let Some(script) = &self.script_field {
            field = field.with_script(script);
        }
        if let Some(direction) = self.order_by {
            field = field.with_sort(direction);
        }
        field
    }
}

/// Facet options by filter type; the `type` key picks the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKindConfig {
    Term(TermFilter),
    Numeric(TermFilter),
    Range(RangeFilter),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub fieldname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "enabled")]
    pub multiple: bool,
    #[serde(default)]
    pub operator: MultiOperator,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default = "enabled")]
    pub expandable: bool,
    #[serde(default = "enabled")]
    pub collapsible: bool,
    #[serde(flatten)]
    pub kind: FilterKindConfig,
}

impl FilterDefinition {
    pub fn build(&self) -> FilterSpec {
        let spec = match &self.kind {
            FilterKindConfig::Term(terms) => FilterSpec::new(&self.fieldname, terms.clone()),
            FilterKindConfig::Numeric(terms) => FilterSpec::new(&self.fieldname, NumericFilter::new(terms.clone())),
            FilterKindConfig::Range(ranges) => FilterSpec::new(&self.fieldname, ranges.clone()),
        };
        let spec = spec
            .with_enabled(self.enabled)
            .with_multiple(self.multiple)
            .with_operator(self.operator)
            .with_prefix(&self.prefix)
            .with_suffix(&self.suffix)
            .with_expandable(self.expandable)
            .with_collapsible(self.collapsible);
        match &self.label {
            Some(label) => spec.with_label(label),
            None => spec,
        }
    }
}

impl QueryContext {
    /// Builds a context with every field and filter of `config` defined.
    pub fn from_config(config: &EngineConfig) -> QueryResult<Self> {
        let mut context = QueryContext::new()
            .with_page_length(config.page_length)?
            .with_compiler_options(config.compiler);
        context.define_fields(config.fields.iter().map(FieldDefinition::build).collect())?;
        context.define_filters(config.filters.iter().map(FilterDefinition::build).collect())?;
        tracing::info!(
            fields = context.fields().len(),
            filters = context.filters().len(),
            page_length = context.page_length(),
            "query context configured"
        );
        Ok(context)
    }
}
