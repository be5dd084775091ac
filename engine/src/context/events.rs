//! Change notifications emitted by a [`super::QueryContext`].
//!
//! Every mutation first dispatches its specific event, then one
//! [`QueryEvent::Changed`] naming what changed. Both run synchronously inside the
//! mutating call.

use std::fmt;

use common::facet::FilterValue;

use crate::{field_spec::SortDirection, query_term::QueryTerm};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    FieldAdded { fieldname: String, index: usize },
    FieldRemoved { fieldname: String, index: usize },
    FieldsReset { fieldnames: Vec<String> },
    FilterAdded { fieldname: String, index: usize },
    FilterRemoved { fieldname: String, index: usize },
    FiltersReset { fieldnames: Vec<String> },
    SelectionChanged { fieldname: String, previous: Vec<FilterValue>, selected: Vec<FilterValue> },
    SortChanged { fieldname: String, previous: Option<SortDirection>, direction: SortDirection },
    QueryChanged { previous: QueryTerm, query: QueryTerm },
    ResultsReset { count: usize },
    ResultsAdded { index: usize, count: usize },
    LoadingChanged { loading: bool },
    FacetsRefreshed { fieldname: String, count: usize },
    /// A fetch failed; the error itself goes back to the caller.
    FetchFailed { message: String },
    Changed(ChangeScope),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeScope {
    Fields,
    Filters,
    Selection(String),
    Sort(String),
    Query,
    Results,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&QueryEvent) + Send>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub(crate) fn subscribe(&mut self, listener: impl FnMut(&QueryEvent) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// `event`, then `Changed(scope)`.
    pub(crate) fn emit(&mut self, event: QueryEvent, scope: ChangeScope) {
        self.dispatch(&event);
        self.dispatch(&QueryEvent::Changed(scope));
    }

    fn dispatch(&mut self, event: &QueryEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("count", &self.listeners.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn specific_event_precedes_the_generic_one() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::default();
        {
            let seen = seen.clone();
            listeners.subscribe(move |event| seen.lock().unwrap().push(event.clone()));
        }
        listeners.emit(QueryEvent::LoadingChanged { loading: true }, ChangeScope::Loading);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![QueryEvent::LoadingChanged { loading: true }, QueryEvent::Changed(ChangeScope::Loading)]
        );
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let count = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::default();
        let id = {
            let count = count.clone();
            listeners.subscribe(move |_| *count.lock().unwrap() += 1)
        };
        listeners.emit(QueryEvent::ResultsReset { count: 0 }, ChangeScope::Results);
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(QueryEvent::ResultsReset { count: 0 }, ChangeScope::Results);
        assert_eq!(*count.lock().unwrap(), 2);
    }
}
