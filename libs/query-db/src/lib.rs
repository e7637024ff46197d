//! Structured query → SeaORM compiler and the repository capability built on it.
//!
//! Translation of query strings belongs to `query-core`; this crate only
//! consumes `query_core::StructuredQuery`.

pub mod compile;
pub mod repo;

pub use compile::{
    filter_to_condition, query_to_condition, Field, FieldKind, FieldMap, QueryBuildError,
    QueryBuildResult, StructuredQueryExt,
};
pub use repo::{RepoError, Repository, SeaOrmRepository};
