//! Persisting documents: load → merge → serialize → overwrite.
//!
//! The sequence is not atomic; a target path must have a single writer at a time.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::error::{DocsError, DocsResult};
use crate::merge::merge;
use crate::openapi::OpenApi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.json` → JSON, `.yml`/`.yaml` → YAML (case-insensitive); anything else is an error.
    pub fn from_path(path: &Path) -> DocsResult<Self> {
        let invalid = |reason: String| DocsError::InvalidFilePath {
            path: path.to_string_lossy().into_owned(),
            reason,
        };

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| invalid("the path must name a file with an extension".to_owned()))?;

        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yml" | "yaml" => Ok(Self::Yaml),
            other => Err(invalid(format!("unsupported extension .{other}"))),
        }
    }

    pub fn parse(self, text: &str) -> DocsResult<Value> {
        match self {
            Self::Json => Ok(serde_json::from_str(text)?),
            Self::Yaml => yaml_to_json(serde_yaml::from_str(text)?),
        }
    }

    /// JSON is pretty-printed with two-space indentation and a trailing newline.
    /// YAML nests mappings by two spaces; sequence items stay at their key's
    /// column (`servers:\n- url: ...`), which is still valid block YAML.
    pub fn render(self, doc: &Value) -> DocsResult<String> {
        match self {
            Self::Json => {
                let mut out = serde_json::to_string_pretty(doc)?;
                out.push('\n');
                Ok(out)
            }
            Self::Yaml => Ok(serde_yaml::to_string(doc)?),
        }
    }
}

/// Parse the whole file at `path`.
pub fn read_document(path: &Path, format: DocumentFormat) -> DocsResult<Value> {
    let text = std::fs::read_to_string(path)?;
    let path_text = || path.to_string_lossy().into_owned();
    format.parse(&text).map_err(|e| match e {
        DocsError::Json(_) | DocsError::Yaml(_) => DocsError::InvalidDocument {
            path: path_text(),
            reason: e.to_string(),
        },
        DocsError::InvalidDocument { reason, .. } => DocsError::InvalidDocument {
            path: path_text(),
            reason,
        },
        other => other,
    })
}

/// Existing document at `path`, or `None` when the file does not exist.
pub fn load_document(path: &Path) -> DocsResult<Option<Value>> {
    let format = DocumentFormat::from_path(path)?;
    match read_document(path, format) {
        Ok(doc) => Ok(Some(doc)),
        Err(DocsError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Merge `doc` into the document stored at `path` (if any) and write the result.
pub fn dump(path: &Path, doc: &OpenApi) -> DocsResult<()> {
    let format = DocumentFormat::from_path(path)?;
    let generated = serde_json::to_value(doc)?;

    let merged = match load_document(path)? {
        Some(existing) => {
            tracing::debug!(path = %path.display(), "merging into existing document");
            merge(existing, &generated)
        }
        None => generated,
    };

    std::fs::write(path, format.render(&merged)?)?;
    tracing::info!(path = %path.display(), format = ?format, "OpenAPI document written");
    Ok(())
}

/// YAML allows non-string keys (`204:`); JSON documents need them as strings.
/// Errors carry no path; [`read_document`] fills it in.
fn yaml_to_json(value: serde_yaml::Value) -> DocsResult<Value> {
    use serde_yaml::Value as Y;

    Ok(match value {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Y::String(s) => Value::String(s),
        Y::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<DocsResult<_>>()?,
        ),
        Y::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, value) in mapping {
                out.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(out)
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_key(key: serde_yaml::Value) -> DocsResult<String> {
    use serde_yaml::Value as Y;

    match key {
        Y::String(s) => Ok(s),
        Y::Number(n) => Ok(n.to_string()),
        Y::Bool(b) => Ok(b.to_string()),
        Y::Null => Ok("null".to_owned()),
        other => Err(DocsError::InvalidDocument {
            path: String::new(),
            reason: format!("unsupported mapping key {other:?}"),
        }),
    }
}
