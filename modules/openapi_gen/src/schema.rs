//! Validation rule tree → JSON Schema projection.
//!
//! A rule node is a map with an optional `type`, child rules under `keys`
//! (or `properties`) and `items`, a per-child `required: true` flag and
//! validator-only fields such as `patterns`. The projection renames children
//! to `properties`, hoists child `required` flags into the parent's
//! `required` list and drops `patterns` at every level, including sub-schemas
//! under composition keywords such as `not` or `additionalProperties`.
//! Remaining keywords (`format`, `enum`, `minimum`, ...) pass through untouched.

use serde_json::{Map, Value};

use crate::error::{DocsError, DocsResult};

/// Validator-internal keys that never reach the document.
const STRIPPED: &[&str] = &["patterns"];

/// Keywords holding one sub-schema.
const SUBSCHEMA: &[&str] = &[
    "additionalProperties",
    "additionalItems",
    "not",
    "if",
    "then",
    "else",
    "contains",
    "propertyNames",
];

/// Keywords holding a list of sub-schemas.
const SUBSCHEMA_LIST: &[&str] = &["anyOf", "oneOf", "allOf", "prefixItems"];

/// Keywords holding a name → sub-schema map.
const SUBSCHEMA_MAP: &[&str] = &["$defs", "definitions", "patternProperties", "dependentSchemas"];

/// Projected schema with its top-level description lifted out.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub schema: Value,
    pub description: Option<String>,
}

pub fn project(rule: &Value) -> DocsResult<Projection> {
    let mut schema = project_node(rule, "$")?;
    let description = match &mut schema {
        Value::Object(map) => match map.remove("description") {
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
            None => None,
        },
        _ => None,
    };
    Ok(Projection {
        schema,
        description,
    })
}

fn project_node(rule: &Value, at: &str) -> DocsResult<Value> {
    let Value::Object(rule) = rule else {
        return Err(DocsError::projection(format!(
            "rule at {at} must be a map, got {rule}"
        )));
    };

    let mut out = Map::new();
    let mut required: Vec<Value> = Vec::new();

    if let Some(ty) = rule.get("type") {
        let ty = ty
            .as_str()
            .ok_or_else(|| DocsError::projection(format!("type at {at} must be a string")))?;
        match ty {
            "string" | "number" | "integer" | "boolean" | "object" | "array" => {
                out.insert("type".into(), Value::String(ty.to_owned()));
            }
            "date" => {
                out.insert("type".into(), "string".into());
                out.insert("format".into(), "date-time".into());
            }
            "any" => {}
            other => {
                return Err(DocsError::projection(format!(
                    "unknown type '{other}' at {at}"
                )))
            }
        }
    }

    for (key, value) in rule {
        match key.as_str() {
            "type" => {}
            k if STRIPPED.contains(&k) => {}
            "keys" | "properties" => {
                let Value::Object(children) = value else {
                    return Err(DocsError::projection(format!("{key} at {at} must be a map")));
                };
                let mut props = Map::new();
                for (name, child) in children {
                    if is_required(child) {
                        required.push(Value::String(name.clone()));
                    }
                    props.insert(name.clone(), project_node(child, &format!("{at}.{name}"))?);
                }
                out.entry("type").or_insert_with(|| "object".into());
                out.insert("properties".into(), Value::Object(props));
            }
            "items" => {
                let items = match value {
                    Value::Array(alts) if alts.len() == 1 => {
                        project_node(&alts[0], &format!("{at}[]"))?
                    }
                    Value::Array(alts) => {
                        let any_of = alts
                            .iter()
                            .map(|alt| project_node(alt, &format!("{at}[]")))
                            .collect::<DocsResult<Vec<_>>>()?;
                        serde_json::json!({ "anyOf": any_of })
                    }
                    single => project_node(single, &format!("{at}[]"))?,
                };
                out.entry("type").or_insert_with(|| "array".into());
                out.insert("items".into(), items);
            }
            // boolean flag belongs to the parent; a list is already JSON Schema
            "required" => {
                if let Value::Array(names) = value {
                    for name in names {
                        if !required.contains(name) {
                            required.push(name.clone());
                        }
                    }
                }
            }
            k if SUBSCHEMA.contains(&k) => {
                out.insert(key.clone(), project_subschema(value, &format!("{at}.{key}"))?);
            }
            k if SUBSCHEMA_LIST.contains(&k) => {
                let projected = match value {
                    Value::Array(alts) => Value::Array(
                        alts.iter()
                            .enumerate()
                            .map(|(i, alt)| project_subschema(alt, &format!("{at}.{key}[{i}]")))
                            .collect::<DocsResult<Vec<_>>>()?,
                    ),
                    other => other.clone(),
                };
                out.insert(key.clone(), projected);
            }
            k if SUBSCHEMA_MAP.contains(&k) => {
                let projected = match value {
                    Value::Object(entries) => {
                        let mut map = Map::new();
                        for (name, sub) in entries {
                            map.insert(
                                name.clone(),
                                project_subschema(sub, &format!("{at}.{key}.{name}"))?,
                            );
                        }
                        Value::Object(map)
                    }
                    other => other.clone(),
                };
                out.insert(key.clone(), projected);
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    if !required.is_empty() {
        out.insert("required".into(), Value::Array(required));
    }
    Ok(Value::Object(out))
}

/// Boolean schemas (`additionalProperties: false`) pass through.
fn project_subschema(value: &Value, at: &str) -> DocsResult<Value> {
    match value {
        Value::Object(_) => project_node(value, at),
        other => Ok(other.clone()),
    }
}

fn is_required(rule: &Value) -> bool {
    rule.get("required").and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_rules_become_properties() {
        let p = project(&json!({
            "type": "object",
            "description": "A user",
            "keys": {
                "name": {"type": "string", "required": true, "patterns": ["^[a-z]+$"]},
                "born": {"type": "date"},
                "role": {"type": "string", "enum": ["admin", "user"]}
            }
        }))
        .unwrap();

        assert_eq!(p.description.as_deref(), Some("A user"));
        assert_eq!(
            p.schema,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "born": {"type": "string", "format": "date-time"},
                    "role": {"type": "string", "enum": ["admin", "user"]}
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn patterns_are_stripped_inside_items() {
        let p = project(&json!({
            "type": "array",
            "patterns": [],
            "items": {"type": "object", "keys": {"code": {"type": "string", "patterns": ["x"]}}}
        }))
        .unwrap();

        let text = p.schema.to_string();
        assert!(!text.contains("patterns"), "{text}");
        assert_eq!(p.schema["items"]["properties"]["code"], json!({"type": "string"}));
    }

    #[test]
    fn patterns_are_stripped_inside_composed_schemas() {
        let p = project(&json!({
            "type": "object",
            "additionalProperties": {"type": "string", "patterns": ["^x$"]},
            "keys": {
                "a": {"type": "string", "not": {"patterns": ["y"]}},
                "b": {"anyOf": [{"type": "string", "patterns": ["z"]}, {"type": "integer"}]}
            },
            "$defs": {"code": {"type": "string", "patterns": ["w"]}}
        }))
        .unwrap();

        let text = p.schema.to_string();
        assert!(!text.contains("patterns"), "{text}");
        assert_eq!(p.schema["additionalProperties"], json!({"type": "string"}));
        assert_eq!(p.schema["properties"]["a"]["not"], json!({}));
        assert_eq!(p.schema["properties"]["b"]["anyOf"][0], json!({"type": "string"}));
        assert_eq!(p.schema["$defs"]["code"], json!({"type": "string"}));
    }

    #[test]
    fn boolean_and_literal_keywords_pass_through() {
        let p = project(&json!({
            "type": "object",
            "additionalProperties": false,
            "enum": [{"patterns": "literal"}]
        }))
        .unwrap();
        assert_eq!(p.schema["additionalProperties"], json!(false));
        assert_eq!(p.schema["enum"], json!([{"patterns": "literal"}]));
    }

    #[test]
    fn nested_descriptions_stay() {
        let p = project(&json!({
            "keys": {"id": {"type": "integer", "description": "row id"}}
        }))
        .unwrap();
        assert_eq!(p.description, None);
        assert_eq!(p.schema["type"], "object");
        assert_eq!(p.schema["properties"]["id"]["description"], "row id");
    }

    #[test]
    fn item_alternatives_become_any_of() {
        let p = project(&json!({"items": [{"type": "string"}, {"type": "integer"}]})).unwrap();
        assert_eq!(
            p.schema,
            json!({"type": "array", "items": {"anyOf": [{"type": "string"}, {"type": "integer"}]}})
        );
    }

    #[test]
    fn invalid_rules_are_rejected() {
        assert!(project(&json!("string")).is_err());
        let err = project(&json!({"keys": {"x": {"type": "uuidish"}}})).unwrap_err();
        assert!(err.to_string().contains("$.x"), "{err}");
    }
}
