use facet_engine::{
    CompilerOptions, FieldSpec, FilterSpec, MultiOperator, QueryCompiler, QueryContext, QueryError, RangeBounds,
    RangeBucket, SearchRequest, SelectOptions, SortDirection, TermFilter,
};
use serde_json::{Value, json};

fn facet(fieldname: &str) -> FilterSpec {
    FilterSpec::new(fieldname, TermFilter::bare().size(5))
}

/// Fields `foo`, `bar` and a five-term facet on each.
fn provisioned() -> QueryContext {
    let mut context = QueryContext::new();
    context.define_fields(vec![FieldSpec::new("foo"), FieldSpec::new("bar")]).unwrap();
    context.define_filters(vec![facet("foo"), facet("bar")]).unwrap();
    context
}

fn select(context: &mut QueryContext, fieldname: &str, value: &str) {
    context.set_filter_value(fieldname, value, SelectOptions::default()).unwrap();
}

fn phrase(fieldname: &str, value: &str) -> Value {
    json!({ "query": { "match": { fieldname: { "query": value, "type": "phrase" } } } })
}

fn compile(context: &QueryContext) -> SearchRequest {
    QueryCompiler::default().build_search(context, None).unwrap()
}

fn query_section(context: &QueryContext) -> Value {
    let mut request = SearchRequest::new();
    QueryCompiler::default().apply_query(context, &mut request).unwrap();
    Value::Object(request)
}

#[test]
fn empty_queries_match_everything() {
    let mut context = QueryContext::new();
    for query in [Value::Null, json!(""), json!([])] {
        context.set_query_json(query).unwrap();
        assert_eq!(query_section(&context), json!({ "query": { "match_all": {} } }));
    }
}

#[test]
fn text_and_term_list_queries_search_all_fields() {
    let mut context = QueryContext::new();
    context.set_query("foo bar baz");
    assert_eq!(query_section(&context), json!({ "query": { "match": { "_all": "foo bar baz" } } }));

    context.set_query(vec!["foo", "bar"]);
    assert_eq!(query_section(&context), json!({ "query": { "terms": { "_all": ["foo", "bar"] } } }));
}

#[test]
fn structured_queries_are_passed_through() {
    let mut context = QueryContext::new();
    context.set_query_json(json!({ "terms": { "_all": ["foo", "bar"] } })).unwrap();
    assert_eq!(query_section(&context), json!({ "query": { "terms": { "_all": ["foo", "bar"] } } }));

    assert!(matches!(context.set_query_json(json!(42)), Err(QueryError::UnparseableQuery(_))));
}

#[test]
fn a_lone_facet_is_not_scoped_by_its_own_selection() {
    let mut context = QueryContext::new();
    context.add_filter(facet("foo")).unwrap();
    let unfiltered = Value::Object(compile(&context))["facets"].clone();

    select(&mut context, "foo", "bar");
    let request = compile(&context);
    assert_eq!(request["facets"], unfiltered);
    assert_eq!(request["facets"], json!({ "foo": { "terms": { "field": "foo", "size": 5 } } }));
    assert_eq!(request["filter"], phrase("foo", "bar"));
}

#[test]
fn each_facet_is_scoped_by_the_others() {
    let mut context = provisioned();
    select(&mut context, "foo", "bar");
    select(&mut context, "bar", "baz");

    assert_eq!(
        compile(&context)["facets"],
        json!({
            "foo": { "terms": { "field": "foo", "size": 5 }, "facet_filter": phrase("bar", "baz") },
            "bar": { "terms": { "field": "bar", "size": 5 }, "facet_filter": phrase("foo", "bar") },
        })
    );
}

#[test]
fn a_third_facet_sees_both_selections() {
    let mut context = provisioned();
    context.add_filter(facet("baz")).unwrap();
    select(&mut context, "foo", "bar");
    select(&mut context, "bar", "baz");

    let request = compile(&context);
    assert_eq!(
        request["facets"]["baz"],
        json!({
            "terms": { "field": "baz", "size": 5 },
            "facet_filter": { "and": [phrase("foo", "bar"), phrase("bar", "baz")] },
        })
    );
    assert_eq!(request["facets"]["foo"]["facet_filter"], phrase("bar", "baz"));
}

#[test]
fn filter_arity() {
    let mut context = provisioned();
    assert!(compile(&context).get("filter").is_none());

    select(&mut context, "foo", "bar");
    assert_eq!(compile(&context)["filter"], phrase("foo", "bar"));

    select(&mut context, "bar", "baz");
    assert_eq!(compile(&context)["filter"], json!({ "and": [phrase("foo", "bar"), phrase("bar", "baz")] }));
}

#[test]
fn multiple_values_of_one_filter_use_its_operator() {
    let mut context = QueryContext::new();
    context.add_filter(facet("tags").with_operator(MultiOperator::And)).unwrap();
    context.set_filter("tags", vec!["a".into(), "b".into()], SelectOptions::default()).unwrap();
    assert_eq!(compile(&context)["filter"], json!({ "and": [phrase("tags", "a"), phrase("tags", "b")] }));

    let mut context = QueryContext::new();
    context.add_filter(facet("tags")).unwrap();
    context.set_filter("tags", vec!["a".into(), "b".into()], SelectOptions::default()).unwrap();
    assert_eq!(compile(&context)["filter"], json!({ "or": [phrase("tags", "a"), phrase("tags", "b")] }));
}

#[test]
fn range_selections_become_half_open_ranges() {
    let mut context = QueryContext::new();
    let buckets = vec![RangeBucket::new(None, Some(10.0)), RangeBucket::new(Some(10.0), None)];
    context.add_filter(FilterSpec::range("price", buckets)).unwrap();
    context.set_filter_value("price", RangeBounds::at_least(10.0), SelectOptions::default()).unwrap();

    let request = compile(&context);
    assert_eq!(
        request["filter"],
        json!({ "range": { "price": { "from": 10.0, "include_lower": true, "include_upper": false } } })
    );
    assert_eq!(
        request["facets"]["price"],
        json!({ "range": { "field": "price", "ranges": [{ "to": 10.0 }, { "from": 10.0 }] } })
    );
}

#[test]
fn fields_and_sort_follow_definition_order() {
    let mut context = provisioned();
    context.set_sort("foo", SortDirection::Asc).unwrap();

    let request = compile(&context);
    assert_eq!(request["fields"], json!(["foo", "bar"]));
    assert_eq!(request["sort"], json!([{ "foo": "asc" }]));
}

#[test]
fn disabled_fields_are_neither_returned_nor_sorted() {
    let mut context = QueryContext::new();
    context
        .define_fields(vec![FieldSpec::new("foo").with_sort(SortDirection::Asc).with_enabled(false), FieldSpec::new("bar")])
        .unwrap();

    let request = compile(&context);
    assert_eq!(request["fields"], json!(["bar"]));
    assert!(request.get("sort").is_none());
}

#[test]
fn script_fields_are_keyed_by_fieldname() {
    let mut context = QueryContext::new();
    context
        .define_fields(vec![FieldSpec::new("title"), FieldSpec::new("double").with_script("doc['n'].value * 2")])
        .unwrap();

    let request = compile(&context);
    assert_eq!(request["fields"], json!(["title"]));
    assert_eq!(request["script_fields"], json!({ "double": { "script": "doc['n'].value * 2" } }));
}

#[test]
fn defaults_seed_the_request() {
    let context = provisioned();
    let mut defaults = SearchRequest::new();
    defaults.insert("size".to_string(), json!(10));

    assert_eq!(QueryCompiler::default().build_search(&context, Some(&defaults)).unwrap()["size"], json!(10));
    assert!(compile(&context).get("size").is_none());
    assert!(defaults.get("query").is_none());

    // the context seeds its page length
    assert_eq!(context.build_search(None).unwrap()["size"], json!(50));
}

#[test]
fn a_full_request_has_every_section() {
    let mut context = provisioned();
    select(&mut context, "foo", "bar");

    let request = compile(&context);
    for key in ["query", "fields", "facets", "filter"] {
        assert!(request.contains_key(key), "missing {key}");
    }
    assert_eq!(request.keys().collect::<Vec<_>>(), vec!["query", "fields", "facets", "filter"]);
}

#[test]
fn compiling_twice_gives_the_same_request() {
    let mut context = provisioned();
    context.set_query("needle");
    select(&mut context, "foo", "bar");
    assert_eq!(compile(&context), compile(&context));
}

#[test]
fn passes_can_be_switched_off() {
    let mut context = provisioned();
    select(&mut context, "foo", "bar");

    let compiler = QueryCompiler::new(CompilerOptions { include_fields: false, include_facets: false, include_filters: false });
    let request = compiler.build_search(&context, None).unwrap();
    assert_eq!(Value::Object(request), json!({ "query": { "match_all": {} } }));
}

#[test]
fn selections_join_an_existing_and_list_without_repeats() {
    let mut context = provisioned();
    select(&mut context, "foo", "bar");
    select(&mut context, "bar", "baz");

    let mut defaults = SearchRequest::new();
    defaults.insert("filter".to_string(), json!({ "and": [{ "term": { "lang": "en" } }, phrase("foo", "bar")] }));

    let request = QueryCompiler::default().build_search(&context, Some(&defaults)).unwrap();
    assert_eq!(
        request["filter"],
        json!({ "and": [{ "term": { "lang": "en" } }, phrase("foo", "bar"), phrase("bar", "baz")] })
    );

    defaults.insert("filter".to_string(), json!({ "and": "oops" }));
    assert!(matches!(
        QueryCompiler::default().build_search(&context, Some(&defaults)),
        Err(QueryError::Configuration(_))
    ));
}

#[test]
fn a_facet_search_refreshes_one_facet_first() {
    let mut context = provisioned();
    context.add_filter(facet("baz")).unwrap();
    select(&mut context, "foo", "bar");

    let request = context.build_facet_search("bar").unwrap();
    assert_eq!(request["facets"].as_object().unwrap().keys().collect::<Vec<_>>(), vec!["bar", "foo", "baz"]);
    assert_eq!(request["facets"]["bar"]["facet_filter"], phrase("foo", "bar"));
    assert!(request.get("query").is_none());

    assert!(matches!(context.build_facet_search("nope"), Err(QueryError::UnknownFilter(_))));
}

#[test]
fn disabled_filters_neither_count_nor_filter() {
    let mut context = QueryContext::new();
    context.add_filter(facet("foo").with_enabled(false)).unwrap();
    context.add_filter(facet("bar")).unwrap();
    select(&mut context, "foo", "x");

    let request = compile(&context);
    assert!(request.get("filter").is_none());
    assert_eq!(request["facets"], json!({ "bar": { "terms": { "field": "bar", "size": 5 } } }));
}
