//! Compiles a [`QueryContext`] into a search request document.
//!
//! Four passes run in order over a copy of the caller's defaults: query term, fields,
//! facets, filters. Each facet is counted under every other filter's selection but
//! never its own, so selecting a value does not hide its siblings.

use common::{search_const::ALL_FIELDS, search_query::SearchRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    context::QueryContext,
    error::{QueryError, QueryResult},
    filter_spec::{FilterSpec, keyed},
    ordered::FieldnameMap,
    query_term::QueryTerm,
};

/// Which passes run. The query pass always does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub include_fields: bool,
    pub include_facets: bool,
    pub include_filters: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self { include_fields: true, include_facets: true, include_filters: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryCompiler {
    options: CompilerOptions,
}

impl QueryCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    pub fn build_search(&self, context: &QueryContext, defaults: Option<&SearchRequest>) -> QueryResult<SearchRequest> {
        let mut request = defaults.cloned().unwrap_or_default();
        self.apply_query(context, &mut request)?;
        self.apply_fields(context, &mut request)?;
        self.apply_facets(context, &mut request)?;
        self.apply_filters(context, &mut request)?;
        let compiled = Value::Object(request.clone());
        tracing::debug!(request = %compiled, "compiled search request");
        Ok(request)
    }

    /// Request refreshing the counts of `fieldname`, followed by every other facet.
    pub fn build_facet_search(
        &self,
        fieldname: &str,
        context: &QueryContext,
        defaults: Option<&SearchRequest>,
    ) -> QueryResult<SearchRequest> {
        let filters = context.filters();
        let facet = filters.get(fieldname).ok_or_else(|| QueryError::UnknownFilter(fieldname.to_string()))?;
        let mut request = defaults.cloned().unwrap_or_default();
        insert_facet(facet, exclusion_filter(filters, Some(fieldname)), &mut request)?;
        self.apply_facets(context, &mut request)?;
        let compiled = Value::Object(request.clone());
        tracing::debug!(fieldname, request = %compiled, "compiled facet request");
        Ok(request)
    }

    pub fn apply_query(&self, context: &QueryContext, request: &mut SearchRequest) -> QueryResult<()> {
        let section = object_section(request, "query")?;
        let term = context.query();
        if term.is_empty() {
            section.insert("match_all".to_string(), json!({}));
            return Ok(());
        }
        match term {
            QueryTerm::Text(text) => {
                section.insert("match".to_string(), keyed(ALL_FIELDS, json!(text)));
            }
            QueryTerm::Terms(terms) => {
                section.insert("terms".to_string(), keyed(ALL_FIELDS, json!(terms)));
            }
            QueryTerm::Structured(object) => {
                section.extend(object.clone());
            }
            QueryTerm::Empty => {}
        }
        Ok(())
    }

    pub fn apply_fields(&self, context: &QueryContext, request: &mut SearchRequest) -> QueryResult<()> {
        if !self.options.include_fields {
            return Ok(());
        }
        for field in context.fields() {
            if field.is_script_field() {
                if let Some(script) = field.compute_script_field_request() {
                    object_section(request, "script_fields")?.insert(field.fieldname().to_string(), script);
                }
            } else if let Some(name) = field.compute_field_request() {
                array_section(request, "fields")?.push(name);
            }
            if let Some(sort) = field.compute_sort_request() {
                array_section(request, "sort")?.push(sort);
            }
        }
        Ok(())
    }

    pub fn apply_facets(&self, context: &QueryContext, request: &mut SearchRequest) -> QueryResult<()> {
        if !self.options.include_facets {
            return Ok(());
        }
        let filters = context.filters();
        for facet in filters {
            insert_facet(facet, exclusion_filter(filters, Some(facet.fieldname())), request)?;
        }
        Ok(())
    }

    pub fn apply_filters(&self, context: &QueryContext, request: &mut SearchRequest) -> QueryResult<()> {
        if !self.options.include_filters {
            return Ok(());
        }
        let mut fragments = selection_fragments(context.filters(), None);
        match fragments.len() {
            0 => {}
            1 => match fragments.remove(0) {
                Value::Object(object) => object_section(request, "filter")?.extend(object),
                other => {
                    request.insert("filter".to_string(), other);
                }
            },
            _ => {
                let filter = object_section(request, "filter")?;
                let and = filter.entry("and").or_insert_with(|| Value::Array(Vec::new()));
                let Value::Array(and) = and else {
                    return Err(QueryError::Configuration("request key filter.and must be an array".to_string()));
                };
                for fragment in fragments {
                    if !and.contains(&fragment) {
                        and.push(fragment);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Facet filters of every filter except `exclude`, in collection order.
fn selection_fragments(filters: &FieldnameMap<FilterSpec>, exclude: Option<&str>) -> Vec<Value> {
    filters
        .iter()
        .filter(|filter| Some(filter.fieldname()) != exclude)
        .filter_map(|filter| filter.compute_facet_filter())
        .collect()
}

/// None, the single fragment, or `{and: [...]}`.
pub fn combine_and(mut fragments: Vec<Value>) -> Option<Value> {
    match fragments.len() {
        0 => None,
        1 => fragments.pop(),
        _ => Some(keyed("and", Value::Array(fragments))),
    }
}

fn exclusion_filter(filters: &FieldnameMap<FilterSpec>, exclude: Option<&str>) -> Option<Value> {
    combine_and(selection_fragments(filters, exclude))
}

fn insert_facet(facet: &FilterSpec, exclusion: Option<Value>, request: &mut SearchRequest) -> QueryResult<()> {
    if let Some(query) = facet.compute_facet_query(exclusion) {
        object_section(request, "facets")?.insert(facet.fieldname().to_string(), query);
    }
    Ok(())
}

fn object_section<'a>(
    request: &'a mut SearchRequest,
    key: &str,
) -> QueryResult<&'a mut serde_json::Map<String, Value>> {
    match request.entry(key).or_insert_with(|| json!({})) {
        Value::Object(object) => Ok(object),
        _ => Err(QueryError::Configuration(format!("request key {:?} must be an object", key))),
    }
}

fn array_section<'a>(request: &'a mut SearchRequest, key: &str) -> QueryResult<&'a mut Vec<Value>> {
    match request.entry(key).or_insert_with(|| json!([])) {
        Value::Array(array) => Ok(array),
        _ => Err(QueryError::Configuration(format!("request key {:?} must be an array", key))),
    }
}
