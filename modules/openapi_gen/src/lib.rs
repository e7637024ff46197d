//! OpenAPI generation from route descriptors.
//!
//! [`OpenApiBuilder`] turns a route table into an [`OpenApi`] document;
//! [`dump`] merges it into whatever is already stored at the target path.

pub mod builder;
pub mod error;
pub mod merge;
pub mod openapi;
pub mod route;
pub mod schema;
pub mod store;

pub use builder::{openapi_path, synthesize_paths, OpenApiBuilder};
pub use error::{DocsError, DocsResult};
pub use merge::{merge, merge_into};
pub use openapi::{Info, OpenApi, Operation, Parameter, RequestBody, Response, Server};
pub use route::{load_route_table, RouteDescriptor, RoutePath, Validation, ValidationType};
pub use schema::{project, Projection};
pub use store::{dump, load_document, DocumentFormat};
