use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DocsError, DocsResult};
use crate::openapi::{
    Content, Info, MediaType, OpenApi, Operation, Parameter, PathItem, RequestBody, Response,
    Server,
};
use crate::route::{RouteDescriptor, RoutePath, Validation, ValidationType};
use crate::schema::project;

const NO_CONTENT: &str = "204";

/// Assembles an [`OpenApi`] document from route descriptors.
///
/// Every builder owns its document; nothing is shared between builders.
#[derive(Clone, Debug)]
pub struct OpenApiBuilder {
    doc: OpenApi,
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new("3.0.3")
    }
}

impl OpenApiBuilder {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            doc: OpenApi::new(version),
        }
    }

    pub fn with_info(mut self, info: Info) -> Self {
        self.doc.info = Some(info);
        self
    }

    /// Fill `info` from the `[package]` table of a Cargo manifest.
    pub fn with_info_from_manifest(self, manifest: &Path) -> DocsResult<Self> {
        let info = info_from_manifest(manifest)?;
        Ok(self.with_info(info))
    }

    pub fn add_server(mut self, server: Server) -> Self {
        self.doc.servers.push(server);
        self
    }

    /// Document `routes`. Operations on a path already present are added to it.
    pub fn add_routes(mut self, routes: &[RouteDescriptor]) -> Self {
        for (path, item) in synthesize_paths(routes) {
            self.doc.paths.entry(path).or_default().extend(item);
        }
        self
    }

    pub fn build(self) -> OpenApi {
        tracing::info!(paths = self.doc.paths.len(), "built OpenAPI document");
        self.doc
    }
}

/// Build a fresh path map for `routes`.
///
/// Routes without validation rules, or whose body/output rules cannot be
/// projected, are skipped with a warning.
pub fn synthesize_paths(routes: &[RouteDescriptor]) -> BTreeMap<String, PathItem> {
    let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();

    for route in routes {
        let Some(validation) = &route.validate else {
            tracing::warn!(method = %route.method, path = %route.path, "route has no validation rules; skipped");
            continue;
        };

        let operation = match build_operation(route, validation) {
            Ok(op) => op,
            Err(e) => {
                tracing::warn!(method = %route.method, path = %route.path, error = %e, "route skipped");
                continue;
            }
        };

        let methods: Vec<String> = route
            .method
            .iter()
            .filter(|m| !m.eq_ignore_ascii_case("HEAD"))
            .map(str::to_ascii_lowercase)
            .collect();
        if methods.is_empty() {
            tracing::debug!(path = %route.path, "route only declares HEAD; no path item emitted");
            continue;
        }

        let item = paths.entry(openapi_path(&route.path)).or_default();
        for method in methods {
            item.insert(method, operation.clone());
        }
    }

    paths
}

/// `/users/:id` → `/users/{id}`; patterns degrade to their textual form.
pub fn openapi_path(path: &RoutePath) -> String {
    static PARAM: OnceLock<Regex> = OnceLock::new();

    match path {
        RoutePath::Template(template) => PARAM
            .get_or_init(|| Regex::new(r":(\w+)").expect("static regex"))
            .replace_all(template, "{$1}")
            .into_owned(),
        RoutePath::Pattern { .. } => {
            let text = path.to_string();
            tracing::warn!(path = %text, "pattern routes cannot be expressed in OpenAPI; emitted verbatim");
            text
        }
    }
}

fn build_operation(route: &RouteDescriptor, validation: &Validation) -> DocsResult<Operation> {
    let mut op = Operation {
        description: route.meta.description.clone(),
        tags: route.meta.tags.clone(),
        ..Operation::default()
    };

    if let Some(body) = &validation.body {
        let (content, description) = build_content(validation.kind, body)?;
        op.request_body = Some(RequestBody {
            description: description.unwrap_or_default(),
            content,
        });
    }

    op.parameters = build_parameters(route, validation);

    for (status, output) in &validation.output {
        let response = match &output.body {
            Some(rule) => {
                let (content, description) = build_content(validation.kind, rule)?;
                Response {
                    description: output.description.clone().or(description).unwrap_or_default(),
                    content: (status != NO_CONTENT).then_some(content),
                }
            }
            None => Response {
                description: output.description.clone().unwrap_or_default(),
                content: None,
            },
        };
        op.responses.insert(status.clone(), response);
    }

    Ok(op)
}

fn build_content(
    kind: Option<ValidationType>,
    rule: &Value,
) -> DocsResult<(Content, Option<String>)> {
    let projected = project(rule)?;
    let content = Content::from([(
        ValidationType::mime(kind).to_owned(),
        MediaType {
            schema: projected.schema,
        },
    )]);
    Ok((content, projected.description))
}

fn build_parameters(route: &RouteDescriptor, validation: &Validation) -> Vec<Parameter> {
    validation
        .params
        .iter()
        .filter_map(|(name, rule)| match project(rule) {
            Ok(p) => Some(Parameter {
                name: name.clone(),
                location: "path".to_owned(),
                required: true,
                description: p.description,
                schema: p.schema,
            }),
            Err(e) => {
                tracing::warn!(path = %route.path, param = %name, error = %e, "parameter omitted");
                None
            }
        })
        .collect()
}

#[derive(Deserialize)]
struct Manifest {
    package: Option<ManifestPackage>,
}

#[derive(Deserialize)]
struct ManifestPackage {
    name: String,
    #[serde(default)]
    description: Option<toml::Value>,
    #[serde(default)]
    version: Option<toml::Value>,
}

fn info_from_manifest(path: &Path) -> DocsResult<Info> {
    let invalid = |reason: String| DocsError::Manifest {
        path: path.to_string_lossy().into_owned(),
        reason,
    };

    let raw = std::fs::read_to_string(path)?;
    let manifest: Manifest = toml::from_str(&raw).map_err(|e| invalid(e.to_string()))?;
    let package = manifest
        .package
        .ok_or_else(|| invalid("no [package] table".to_owned()))?;

    // `version.workspace = true` and friends are tables; only literals are usable.
    let literal = |v: Option<toml::Value>| match v {
        Some(toml::Value::String(s)) => Some(s),
        _ => None,
    };

    Ok(Info {
        title: package.name,
        description: literal(package.description),
        version: literal(package.version).unwrap_or_else(|| "0.0.0".to_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn colon_params_become_braces() {
        assert_eq!(
            openapi_path(&RoutePath::Template("/orgs/:org/users/:id".into())),
            "/orgs/{org}/users/{id}"
        );
        assert_eq!(openapi_path(&RoutePath::Template("/health".into())), "/health");
    }

    #[test]
    fn failed_parameter_does_not_drop_the_others() {
        let validation: Validation = serde_json::from_value(json!({
            "params": {
                "org": {"type": "string"},
                "broken": {"type": "nonsense"},
                "id": {"type": "integer", "description": "user id"}
            }
        }))
        .unwrap();
        let route = RouteDescriptor::new("GET", "/orgs/:org/:broken/:id")
            .with_validation(validation.clone());

        let params = build_parameters(&route, &validation);
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["org", "id"]);
        assert_eq!(params[1].description.as_deref(), Some("user id"));
        assert_eq!(params[1].schema, json!({"type": "integer"}));
        assert!(params.iter().all(|p| p.required && p.location == "path"));
    }

    #[test]
    fn head_only_route_is_omitted() {
        let head = RouteDescriptor::new("HEAD", "/ping").with_validation(Validation::default());
        let get = RouteDescriptor::new("GET", "/users")
            .with_validation(Validation::default())
            .with_description("List users");

        let paths = synthesize_paths(&[head, get]);
        assert!(!paths.contains_key("/ping"));
        assert_eq!(
            paths["/users"]["get"].description.as_deref(),
            Some("List users")
        );
    }

    #[test]
    fn manifest_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        std::fs::write(
            &path,
            "[package]\nname = \"inventory\"\nversion = \"1.4.0\"\ndescription = \"Stock API\"\n",
        )
        .unwrap();

        let info = info_from_manifest(&path).unwrap();
        assert_eq!(info.title, "inventory");
        assert_eq!(info.version, "1.4.0");
        assert_eq!(info.description.as_deref(), Some("Stock API"));

        std::fs::write(&path, "[package]\nname = \"x\"\nversion.workspace = true\n").unwrap();
        assert_eq!(info_from_manifest(&path).unwrap().version, "0.0.0");

        std::fs::write(&path, "[workspace]\nmembers = []\n").unwrap();
        assert!(matches!(
            info_from_manifest(&path),
            Err(DocsError::Manifest { .. })
        ));
    }
}
