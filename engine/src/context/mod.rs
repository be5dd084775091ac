//! The stateful side of a search: fields, filters, query, results and paging.

mod events;
mod fetch;

pub use events::{ChangeScope, ListenerId, QueryEvent};
pub use fetch::{FetchMode, SearchTransport};

use common::{
    facet::{Facet, FilterValue},
    search_const::DEFAULT_PAGE_LENGTH,
    search_query::{PageRequest, SearchRequest},
    search_response::SearchResponse,
    search_result::SearchResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    compiler::{CompilerOptions, QueryCompiler},
    error::{QueryError, QueryResult},
    field_spec::{FieldSpec, SortDirection},
    filter_spec::{FacetCounts, FilterSpec},
    ordered::FieldnameMap,
    query_term::QueryTerm,
};
use events::Listeners;

/// The currently sorted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub fieldname: String,
    pub order: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectOptions {
    /// Change the selection without notifying listeners.
    pub silent: bool,
}

impl SelectOptions {
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

#[derive(Debug)]
pub struct QueryContext {
    query: QueryTerm,
    fields: FieldnameMap<FieldSpec>,
    filters: FieldnameMap<FilterSpec>,
    results: Vec<SearchResult>,
    page_length: u64,
    total_results: u64,
    loading: bool,
    compiler: QueryCompiler,
    listeners: Listeners,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryContext {
    pub fn new() -> Self {
        Self {
            query: QueryTerm::Empty,
            fields: FieldnameMap::new(),
            filters: FieldnameMap::new(),
            results: Vec::new(),
            page_length: DEFAULT_PAGE_LENGTH,
            total_results: 0,
            loading: false,
            compiler: QueryCompiler::default(),
            listeners: Listeners::default(),
        }
    }

    pub fn with_page_length(mut self, page_length: u64) -> QueryResult<Self> {
        self.set_page_length(page_length)?;
        Ok(self)
    }

    pub fn with_compiler_options(mut self, options: CompilerOptions) -> Self {
        self.compiler = QueryCompiler::new(options);
        self
    }

    pub fn set_page_length(&mut self, page_length: u64) -> QueryResult<()> {
        if page_length == 0 {
            return Err(QueryError::Configuration("page length must be positive".to_string()));
        }
        self.page_length = page_length;
        Ok(())
    }

    pub fn page_length(&self) -> u64 {
        self.page_length
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&QueryEvent) + Send + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // query

    pub fn query(&self) -> &QueryTerm {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<QueryTerm>) {
        let query = query.into();
        if query == self.query {
            return;
        }
        let previous = std::mem::replace(&mut self.query, query.clone());
        self.listeners.emit(QueryEvent::QueryChanged { previous, query }, ChangeScope::Query);
    }

    /// Sets the query from loosely typed JSON, rejecting anything but null, text,
    /// a list of text or an object.
    pub fn set_query_json(&mut self, query: Value) -> QueryResult<()> {
        let query = QueryTerm::try_from(query)?;
        self.set_query(query);
        Ok(())
    }

    // fields

    pub fn fields(&self) -> &FieldnameMap<FieldSpec> {
        &self.fields
    }

    pub fn field(&self, fieldname: &str) -> Option<&FieldSpec> {
        self.fields.get(fieldname)
    }

    /// Replaces every field. Only the first sorted field keeps its direction.
    pub fn define_fields(&mut self, mut fields: Vec<FieldSpec>) -> QueryResult<()> {
        for field in &fields {
            field.validate()?;
        }
        let mut sorted_seen = false;
        for field in fields.iter_mut() {
            if field.is_sorted() {
                if sorted_seen {
                    field.set_sort(None);
                }
                sorted_seen = true;
            }
        }
        self.fields.reset(fields)?;
        let fieldnames = self.fields.fieldnames();
        self.listeners.emit(QueryEvent::FieldsReset { fieldnames }, ChangeScope::Fields);
        Ok(())
    }

    /// Appends a field. A field that arrives sorted clears every other field's sort.
    pub fn add_field(&mut self, field: FieldSpec) -> QueryResult<()> {
        field.validate()?;
        let fieldname = field.fieldname().to_string();
        let sorted = field.is_sorted();
        let index = self.fields.push(field)?;
        if sorted {
            self.clear_sort_except(&fieldname);
        }
        self.listeners.emit(QueryEvent::FieldAdded { fieldname, index }, ChangeScope::Fields);
        Ok(())
    }

    pub fn remove_field(&mut self, fieldname: &str) -> QueryResult<FieldSpec> {
        let (index, field) =
            self.fields.remove(fieldname).ok_or_else(|| QueryError::UnknownField(fieldname.to_string()))?;
        self.listeners.emit(
            QueryEvent::FieldRemoved { fieldname: fieldname.to_string(), index },
            ChangeScope::Fields,
        );
        Ok(field)
    }

    // sorting

    pub fn set_sort(&mut self, fieldname: &str, direction: SortDirection) -> QueryResult<()> {
        let field = self.fields.get_mut(fieldname).ok_or_else(|| QueryError::UnknownField(fieldname.to_string()))?;
        let previous = field.sort_direction();
        field.set_sort(Some(direction));
        self.finish_sort(fieldname, previous, direction);
        Ok(())
    }

    /// Sorts ascending on `fieldname`.
    pub fn sort_by(&mut self, fieldname: &str) -> QueryResult<()> {
        self.set_sort(fieldname, SortDirection::Asc)
    }

    /// Flips the sort of `fieldname`, or of the sorted field, or of the first field.
    /// Returns the new direction, or `None` when there is no field at all.
    pub fn toggle_sort(&mut self, fieldname: Option<&str>) -> QueryResult<Option<SortDirection>> {
        let target = match (fieldname, self.order_by(), self.fields.first()) {
            (Some(fieldname), _, _) => fieldname.to_string(),
            (None, Some(order_by), _) => order_by.fieldname,
            (None, None, Some(first)) => first.fieldname().to_string(),
            (None, None, None) => return Ok(None),
        };
        let field = self.fields.get_mut(&target).ok_or_else(|| QueryError::UnknownField(target.clone()))?;
        let previous = field.sort_direction();
        let direction = field.toggle_sort();
        self.finish_sort(&target, previous, direction);
        Ok(Some(direction))
    }

    pub fn order_by(&self) -> Option<OrderBy> {
        self.fields.iter().find_map(|field| {
            field.sort_direction().map(|order| OrderBy { fieldname: field.fieldname().to_string(), order })
        })
    }

    pub fn sort_direction(&self, fieldname: &str) -> QueryResult<Option<SortDirection>> {
        self.field(fieldname)
            .map(|field| field.sort_direction())
            .ok_or_else(|| QueryError::UnknownField(fieldname.to_string()))
    }

    fn clear_sort_except(&mut self, fieldname: &str) {
        for field in self.fields.iter_mut().filter(|field| field.fieldname() != fieldname) {
            field.set_sort(None);
        }
    }

    /// Siblings are cleared before anyone hears about the new direction.
    fn finish_sort(&mut self, fieldname: &str, previous: Option<SortDirection>, direction: SortDirection) {
        self.clear_sort_except(fieldname);
        if previous == Some(direction) {
            return;
        }
        self.listeners.emit(
            QueryEvent::SortChanged { fieldname: fieldname.to_string(), previous, direction },
            ChangeScope::Sort(fieldname.to_string()),
        );
    }

    // filters

    pub fn filters(&self) -> &FieldnameMap<FilterSpec> {
        &self.filters
    }

    pub fn filter(&self, fieldname: &str) -> Option<&FilterSpec> {
        self.filters.get(fieldname)
    }

    fn filter_mut(&mut self, fieldname: &str) -> QueryResult<&mut FilterSpec> {
        self.filters.get_mut(fieldname).ok_or_else(|| QueryError::UnknownFilter(fieldname.to_string()))
    }

    pub fn define_filters(&mut self, filters: Vec<FilterSpec>) -> QueryResult<()> {
        for filter in &filters {
            filter.validate()?;
        }
        self.filters.reset(filters)?;
        let fieldnames = self.filters.fieldnames();
        self.listeners.emit(QueryEvent::FiltersReset { fieldnames }, ChangeScope::Filters);
        Ok(())
    }

    pub fn add_filter(&mut self, filter: FilterSpec) -> QueryResult<()> {
        filter.validate()?;
        let fieldname = filter.fieldname().to_string();
        let index = self.filters.push(filter)?;
        self.listeners.emit(QueryEvent::FilterAdded { fieldname, index }, ChangeScope::Filters);
        Ok(())
    }

    pub fn remove_filter(&mut self, fieldname: &str) -> QueryResult<FilterSpec> {
        let (index, filter) =
            self.filters.remove(fieldname).ok_or_else(|| QueryError::UnknownFilter(fieldname.to_string()))?;
        self.listeners.emit(
            QueryEvent::FilterRemoved { fieldname: fieldname.to_string(), index },
            ChangeScope::Filters,
        );
        Ok(filter)
    }

    /// Replaces the selection of `fieldname`. Listeners hear about it only when the
    /// selection actually changed.
    pub fn set_filter(&mut self, fieldname: &str, values: Vec<FilterValue>, options: SelectOptions) -> QueryResult<()> {
        let filter = self.filter_mut(fieldname)?;
        let previous = filter.select_all(values)?;
        let selected = filter.selected_values().to_vec();
        self.notify_selection(fieldname, previous, selected, options);
        Ok(())
    }

    pub fn set_filter_value(
        &mut self,
        fieldname: &str,
        value: impl Into<FilterValue>,
        options: SelectOptions,
    ) -> QueryResult<()> {
        self.set_filter(fieldname, vec![value.into()], options)
    }

    pub fn set_filter_by_id<S: AsRef<str>>(&mut self, fieldname: &str, ids: &[S], options: SelectOptions) -> QueryResult<()> {
        let values = self
            .filter(fieldname)
            .ok_or_else(|| QueryError::UnknownFilter(fieldname.to_string()))?
            .ids_to_filter_values(ids)?;
        self.set_filter(fieldname, values, options)
    }

    pub fn clear_filter(&mut self, fieldname: &str, options: SelectOptions) -> QueryResult<()> {
        let filter = self.filter_mut(fieldname)?;
        let previous = filter.unselect_all();
        self.notify_selection(fieldname, previous, Vec::new(), options);
        Ok(())
    }

    fn notify_selection(
        &mut self,
        fieldname: &str,
        previous: Vec<FilterValue>,
        selected: Vec<FilterValue>,
        options: SelectOptions,
    ) {
        if options.silent || previous == selected {
            return;
        }
        self.listeners.emit(
            QueryEvent::SelectionChanged { fieldname: fieldname.to_string(), previous, selected },
            ChangeScope::Selection(fieldname.to_string()),
        );
    }

    pub fn selected_values(&self, fieldname: &str) -> QueryResult<&[FilterValue]> {
        self.filter(fieldname)
            .map(|filter| filter.selected_values())
            .ok_or_else(|| QueryError::UnknownFilter(fieldname.to_string()))
    }

    pub fn selected_ids(&self, fieldname: &str) -> QueryResult<Vec<String>> {
        self.filter(fieldname).ok_or_else(|| QueryError::UnknownFilter(fieldname.to_string()))?.selected_ids()
    }

    pub fn selected_facets(&self, fieldname: &str) -> QueryResult<Vec<Facet>> {
        self.filter(fieldname).ok_or_else(|| QueryError::UnknownFilter(fieldname.to_string()))?.selected_facets()
    }

    // results

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn result(&self, id: &str) -> Option<&SearchResult> {
        self.results.iter().find(|result| result.id == id)
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn reset_results(&mut self, results: Vec<SearchResult>) {
        let count = results.len();
        self.results = results;
        self.listeners.emit(QueryEvent::ResultsReset { count }, ChangeScope::Results);
    }

    pub fn append_results(&mut self, results: Vec<SearchResult>) {
        let index = self.results.len();
        let count = results.len();
        self.results.extend(results);
        self.listeners.emit(QueryEvent::ResultsAdded { index, count }, ChangeScope::Results);
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        if self.loading == loading {
            return;
        }
        self.loading = loading;
        self.listeners.emit(QueryEvent::LoadingChanged { loading }, ChangeScope::Loading);
    }

    // paging

    /// Pages already fetched, counting a partial page as one.
    pub fn current_page(&self) -> u64 {
        (self.results.len() as u64).div_ceil(self.page_length)
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page() < self.total_results.div_ceil(self.page_length)
    }

    pub fn first_page_request(&self) -> PageRequest {
        PageRequest::new(0, self.page_length)
    }

    pub fn next_page_request(&self) -> PageRequest {
        PageRequest::new(self.results.len() as u64, self.page_length)
    }

    // compiling

    /// Compiles the current state. Without a page, only `size` is seeded.
    pub fn build_search(&self, page: Option<PageRequest>) -> QueryResult<SearchRequest> {
        let defaults = match page {
            Some(page) => page.to_request(),
            None => {
                let mut defaults = SearchRequest::new();
                defaults.insert("size".to_string(), self.page_length.into());
                defaults
            }
        };
        self.compiler.build_search(self, Some(&defaults))
    }

    pub fn build_facet_search(&self, fieldname: &str) -> QueryResult<SearchRequest> {
        self.compiler.build_facet_search(fieldname, self, None)
    }

    // responses

    /// Reads the hit total and the hits. Each hit carries its projected fields when the
    /// response has them, its source otherwise.
    pub fn parse(&mut self, response: &SearchResponse) -> Vec<SearchResult> {
        self.total_results = response.hits.total;
        if response.hits.total == 0 {
            return Vec::new();
        }
        response
            .hits
            .hits
            .iter()
            .map(|hit| SearchResult {
                id: hit.id.clone(),
                data: hit.fields.clone().or_else(|| hit.source.clone()).unwrap_or_default(),
            })
            .collect()
    }

    /// Feeds a raw response into results and every filter.
    ///
    /// Every facet section is decoded before anything is written, so a malformed
    /// response leaves totals, facets and results exactly as they were.
    pub fn apply_response(&mut self, response: Value, mode: FetchMode) -> QueryResult<()> {
        let response: SearchResponse =
            serde_json::from_value(response).map_err(|e| QueryError::MalformedResponse(e.to_string()))?;
        let counts = self
            .filters
            .iter()
            .map(|filter| filter.read_response(&response))
            .collect::<QueryResult<Vec<FacetCounts>>>()?;

        let results = self.parse(&response);
        tracing::debug!(total = response.hits.total, hits = results.len(), ?mode, "parsed search response");
        self.apply_filter_counts(counts);
        match mode {
            FetchMode::Replace => self.reset_results(results),
            FetchMode::Append => self.append_results(results),
        }
        Ok(())
    }

    /// `counts` lines up with the filters, in collection order.
    fn apply_filter_counts(&mut self, counts: Vec<FacetCounts>) {
        let mut refreshed = Vec::with_capacity(counts.len());
        for (filter, counts) in self.filters.iter_mut().zip(counts) {
            refreshed.push((filter.fieldname().to_string(), counts.facets.len()));
            filter.apply_counts(counts);
        }
        for (fieldname, count) in refreshed {
            self.listeners.emit(QueryEvent::FacetsRefreshed { fieldname, count }, ChangeScope::Filters);
        }
    }
}
