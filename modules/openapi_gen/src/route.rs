use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocsResult;
use crate::store::{read_document, DocumentFormat};

/// One or several HTTP methods served by a route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Methods {
    One(String),
    Many(Vec<String>),
}

impl Methods {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Methods::One(m) => std::slice::from_ref(m),
            Methods::Many(ms) => ms,
        };
        slice.iter().map(String::as_str)
    }
}

impl std::fmt::Display for Methods {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

/// Route path: a `/users/:id` template or a raw regular expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutePath {
    Template(String),
    Pattern { pattern: String },
}

impl std::fmt::Display for RoutePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutePath::Template(t) => f.write_str(t),
            RoutePath::Pattern { pattern } => write!(f, "/{pattern}/"),
        }
    }
}

/// Body encoding accepted by a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    Json,
    Form,
    Multipart,
    #[serde(other)]
    Other,
}

impl ValidationType {
    pub fn mime(ty: Option<Self>) -> &'static str {
        match ty {
            Some(ValidationType::Form) => "application/x-www-form-urlencoded",
            Some(ValidationType::Json) => "application/json",
            Some(ValidationType::Multipart) => "multipart/form-data",
            Some(ValidationType::Other) | None => "text/plain",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Validation rules attached to a route.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Validation {
    #[serde(default, rename = "type")]
    pub kind: Option<ValidationType>,
    #[serde(default)]
    pub body: Option<Value>,
    /// Path parameter name → rule, in declaration order.
    #[serde(default)]
    pub params: IndexMap<String, Value>,
    /// Status code → response body rule.
    #[serde(default)]
    pub output: IndexMap<String, OutputSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub method: Methods,
    pub path: RoutePath,
    #[serde(default)]
    pub validate: Option<Validation>,
    #[serde(default)]
    pub meta: RouteMeta,
}

impl RouteDescriptor {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Methods::One(method.into()),
            path: RoutePath::Template(path.into()),
            validate: None,
            meta: RouteMeta::default(),
        }
    }

    pub fn with_validation(mut self, validate: Validation) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }
}

/// Read a route table (a list of descriptors) from a `.json`/`.yaml`/`.yml` file.
pub fn load_route_table(path: &Path) -> DocsResult<Vec<RouteDescriptor>> {
    let format = DocumentFormat::from_path(path)?;
    let value = read_document(path, format)?;
    let routes: Vec<RouteDescriptor> = serde_json::from_value(value)?;
    tracing::debug!(path = %path.display(), routes = routes.len(), "loaded route table");
    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptors_deserialize_from_both_shapes() {
        let routes: Vec<RouteDescriptor> = serde_json::from_value(json!([
            {"method": "GET", "path": "/users/:id", "validate": {"params": {"id": {"type": "integer"}}}},
            {"method": ["GET", "HEAD"], "path": {"pattern": "^/files/(.*)$"}, "meta": {"tags": ["files"]}}
        ]))
        .unwrap();

        assert_eq!(routes[0].path, RoutePath::Template("/users/:id".into()));
        assert!(routes[0].validate.as_ref().unwrap().params.contains_key("id"));
        assert_eq!(routes[1].method.iter().collect::<Vec<_>>(), ["GET", "HEAD"]);
        assert_eq!(routes[1].path.to_string(), "/^/files/(.*)$/");
        assert!(routes[1].validate.is_none());
        assert_eq!(routes[1].meta.tags, ["files"]);
    }

    #[test]
    fn mime_follows_validation_type() {
        let v: Validation = serde_json::from_value(json!({"type": "xml"})).unwrap();
        assert_eq!(v.kind, Some(ValidationType::Other));
        assert_eq!(ValidationType::mime(v.kind), "text/plain");
        assert_eq!(
            ValidationType::mime(Some(ValidationType::Form)),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ValidationType::mime(None), "text/plain");
    }
}
