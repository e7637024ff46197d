//! Query-string → structured query translation.
//!
//! Keys use `__` as segment delimiter:
//! - `age__gte=18` → filter on `age` with operator `gte`
//! - `name__not__icontains=bob` → negated case-insensitive contains
//! - `__page`, `__page_size`, `__order`, `__populate` are control keys
//!
//! The output ([`StructuredQuery`]) is transport-agnostic; compiling it into
//! storage conditions belongs to `query-db`.

pub mod operators;
pub mod page;
pub mod params;
pub mod query;
pub mod translate;
pub mod where_clause;

pub use operators::{OperatorKind, Predicate};
pub use page::{Page, PageInfo};
pub use params::{QueryParams, QueryValue};
pub use query::{Filter, FilterValue, OrderKey, SortDir, StructuredQuery};
pub use translate::{translate, QueryTranslator, SameFieldPolicy, TranslatorConfig};

/// Segment delimiter for query keys.
pub const DELIMITER: &str = "__";

/// Page size used when `__page_size` is absent or unusable.
pub const DEFAULT_PAGE_SIZE: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("invalid where clause '{raw}': {reason}")]
    InvalidWhereClause { raw: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
