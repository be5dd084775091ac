//! The free-text or structured query a context searches for.

use serde_json::Value;

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryTerm {
    #[default]
    Empty,
    Text(String),
    Terms(Vec<String>),
    /// Merged verbatim into the request's `query` section.
    Structured(serde_json::Map<String, Value>),
}

impl QueryTerm {
    /// True for anything that compiles to `match_all`.
    pub fn is_empty(&self) -> bool {
        match self {
            QueryTerm::Empty => true,
            QueryTerm::Text(text) => text.is_empty(),
            QueryTerm::Terms(terms) => terms.is_empty(),
            QueryTerm::Structured(_) => false,
        }
    }
}

impl TryFrom<Value> for QueryTerm {
    type Error = QueryError;

    fn try_from(value: Value) -> QueryResult<Self> {
        match value {
            Value::Null => Ok(QueryTerm::Empty),
            Value::String(text) => Ok(QueryTerm::Text(text)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(term) => Ok(term),
                    other => Err(QueryError::UnparseableQuery(format!("non-text term {}", other))),
                })
                .collect::<QueryResult<Vec<_>>>()
                .map(QueryTerm::Terms),
            Value::Object(object) => Ok(QueryTerm::Structured(object)),
            other => Err(QueryError::UnparseableQuery(other.to_string())),
        }
    }
}

impl From<&str> for QueryTerm {
    fn from(value: &str) -> Self {
        QueryTerm::Text(value.to_string())
    }
}

impl From<String> for QueryTerm {
    fn from(value: String) -> Self {
        QueryTerm::Text(value)
    }
}

impl From<Vec<String>> for QueryTerm {
    fn from(value: Vec<String>) -> Self {
        QueryTerm::Terms(value)
    }
}

impl From<Vec<&str>> for QueryTerm {
    fn from(value: Vec<&str>) -> Self {
        QueryTerm::Terms(value.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_every_supported_shape() {
        assert_eq!(QueryTerm::try_from(json!(null)), Ok(QueryTerm::Empty));
        assert_eq!(QueryTerm::try_from(json!("foo")), Ok(QueryTerm::from("foo")));
        assert_eq!(QueryTerm::try_from(json!(["foo", "bar"])), Ok(QueryTerm::from(vec!["foo", "bar"])));
        assert!(matches!(QueryTerm::try_from(json!({"term": {"foo": "bar"}})), Ok(QueryTerm::Structured(_))));
    }

    #[test]
    fn rejects_scalars_and_mixed_lists() {
        assert!(matches!(QueryTerm::try_from(json!(42)), Err(QueryError::UnparseableQuery(_))));
        assert!(matches!(QueryTerm::try_from(json!(true)), Err(QueryError::UnparseableQuery(_))));
        assert!(matches!(QueryTerm::try_from(json!(["foo", 1])), Err(QueryError::UnparseableQuery(_))));
    }

    #[test]
    fn blank_text_and_empty_lists_are_empty() {
        assert!(QueryTerm::from("").is_empty());
        assert!(QueryTerm::Terms(vec![]).is_empty());
        assert!(!QueryTerm::from("foo").is_empty());
        assert!(!QueryTerm::Structured(Default::default()).is_empty());
    }
}
