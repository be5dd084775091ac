use std::sync::{Arc, Mutex};

use anyhow::bail;
use facet_engine::{
    FilterSpec, QueryContext, QueryEvent, SearchRequest, SearchTransport, SelectOptions,
};
use serde_json::{Value, json};

/// Answers from a script of canned responses and remembers every request.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<Vec<anyhow::Result<Value>>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<anyhow::Result<Value>>) -> Self {
        Self { responses: Mutex::new(responses), requests: Mutex::default() }
    }

    fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl SearchTransport for ScriptedTransport {
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            bail!("no response scripted");
        }
        responses.remove(0)
    }
}

fn page(from: usize, count: usize, total: usize) -> Value {
    let hits = (from..from + count).map(|i| json!({ "_id": format!("doc-{i}"), "_source": { "n": i } })).collect::<Vec<_>>();
    json!({
        "hits": { "total": total, "hits": hits },
        "facets": { "tags": { "terms": [{ "term": "rust", "count": total }] } }
    })
}

fn loading_events(events: &Arc<Mutex<Vec<QueryEvent>>>) -> Vec<bool> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            QueryEvent::LoadingChanged { loading } => Some(*loading),
            _ => None,
        })
        .collect()
}

fn recorded(context: &mut QueryContext) -> Arc<Mutex<Vec<QueryEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    context.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

#[tokio::test]
async fn pages_are_fetched_then_appended() {
    let mut context = QueryContext::new();
    context.add_filter(FilterSpec::term("tags")).unwrap();
    let transport = ScriptedTransport::new(vec![Ok(page(0, 50, 70)), Ok(page(50, 20, 70))]);

    context.fetch_first_page(&transport).await.unwrap();
    assert_eq!(context.results().len(), 50);
    assert!(context.has_next_page());
    assert_eq!(context.filter("tags").unwrap().available_facets().len(), 1);

    context.fetch_next_page(&transport).await.unwrap();
    assert_eq!(context.results().len(), 70);
    assert_eq!(context.results()[69].id, "doc-69");
    assert!(!context.has_next_page());

    // everything is held: no third round trip
    context.fetch_next_page(&transport).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!((requests[0]["from"].clone(), requests[0]["size"].clone()), (json!(0), json!(50)));
    assert_eq!((requests[1]["from"].clone(), requests[1]["size"].clone()), (json!(50), json!(50)));
    assert!(requests[0].contains_key("facets"));
}

#[tokio::test]
async fn loading_is_cleared_when_the_transport_fails() {
    let mut context = QueryContext::new();
    let events = recorded(&mut context);
    let transport = ScriptedTransport::new(vec![Err(anyhow::anyhow!("connection refused"))]);

    let err = context.fetch_first_page(&transport).await.unwrap_err();
    assert!(format!("{err:#}").contains("connection refused"));
    assert!(!context.is_loading());
    assert_eq!(loading_events(&events), vec![true, false]);

    let failures = events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, QueryEvent::FetchFailed { .. }))
        .count();
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn a_malformed_response_keeps_the_previous_results() {
    let mut context = QueryContext::new();
    let transport = ScriptedTransport::new(vec![Ok(page(0, 3, 3)), Ok(json!({ "hits": [] }))]);

    context.fetch_first_page(&transport).await.unwrap();
    assert!(context.fetch_first_page(&transport).await.is_err());
    assert_eq!(context.results().len(), 3);
    assert!(!context.is_loading());
}

#[tokio::test]
async fn facets_can_be_refreshed_on_their_own() {
    let mut context = QueryContext::new();
    context.add_filter(FilterSpec::term("tags")).unwrap();
    context.add_filter(FilterSpec::term("lang")).unwrap();
    context.set_filter_value("lang", "en", SelectOptions::default()).unwrap();
    let events = recorded(&mut context);

    let transport = ScriptedTransport::new(vec![Ok(json!({
        "hits": { "total": 9, "hits": [] },
        "facets": { "tags": { "terms": [{ "term": "rust", "count": 9 }, { "term": "go", "count": 1 }] } }
    }))]);
    context.refresh_facets(&transport, "tags").await.unwrap();

    assert_eq!(context.filter("tags").unwrap().available_facets().len(), 2);
    assert!(context.results().is_empty());
    assert!(matches!(
        events.lock().unwrap().first(),
        Some(QueryEvent::FacetsRefreshed { count: 2, .. })
    ));

    let request = &transport.requests()[0];
    assert_eq!(
        request["facets"]["tags"]["facet_filter"],
        json!({ "query": { "match": { "lang": { "query": "en", "type": "phrase" } } } })
    );
    assert!(context.refresh_facets(&transport, "nope").await.is_err());
}
