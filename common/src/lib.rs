//! Common data model shared by the query engine and the code that renders or transports it.

extern crate serde;


pub mod facet;
pub mod search_const;
pub mod search_query;
pub mod search_response;
pub mod search_result;
