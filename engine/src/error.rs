//! Errors raised while composing requests or decoding responses.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// A field, filter or engine configuration cannot be used as given.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The query value is none of: empty, text, list of text, object.
    #[error("Unable to parse given query: {0}")]
    UnparseableQuery(String),

    #[error("Invalid range id: {0:?}")]
    InvalidRangeId(String),

    #[error("Invalid numeric id: {0:?}")]
    InvalidNumericId(String),

    /// The filter cannot encode this kind of value (e.g. a range on a terms filter).
    #[error("Filter {fieldname:?} cannot use value {value}")]
    IncompatibleValue { fieldname: String, value: String },

    #[error("Unknown field: {0:?}")]
    UnknownField(String),

    #[error("Unknown filter: {0:?}")]
    UnknownFilter(String),

    #[error("Fieldname already defined: {0:?}")]
    DuplicateFieldname(String),

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
