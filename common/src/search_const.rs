//! Defaults shared by request building and paging.

/// Number of results requested per page when nothing else is configured.
pub const DEFAULT_PAGE_LENGTH: u64 = 50;

/// Synthetic target matching every indexed field.
pub const ALL_FIELDS: &str = "_all";

/// Number of terms a terms facet asks for by default.
pub const DEFAULT_TERM_FACET_SIZE: u32 = 5;
