//! JSON where-clause (`?where={"name":"bob"}`) → equality filters.

use serde_json::Value;

use crate::params::QueryValue;
use crate::query::Filter;
use crate::{Error, Result};

/// Parse a JSON object into equality filters, one per key.
///
/// Scalars are stringified, arrays of scalars become multi-valued filters.
/// Nested objects are rejected.
pub fn parse(raw: &str) -> Result<Vec<Filter>> {
    let invalid = |reason: String| Error::InvalidWhereClause {
        raw: raw.to_owned(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(invalid("expected a JSON object".into()));
    };

    map.into_iter()
        .map(|(field, v)| {
            if field.is_empty() {
                return Err(invalid("empty field name".into()));
            }
            let non_scalar = || invalid(format!("non-scalar value for '{field}'"));
            let value = match v {
                Value::Array(items) => QueryValue::Many(
                    items
                        .iter()
                        .map(|item| scalar(item).ok_or_else(non_scalar))
                        .collect::<Result<_>>()?,
                ),
                other => QueryValue::One(scalar(&other).ok_or_else(non_scalar)?),
            };
            Ok(Filter::eq(field, value))
        })
        .collect()
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OperatorKind;

    #[test]
    fn object_becomes_equality_filters() {
        let filters = parse(r#"{"name":"bob","age":42,"tags":["a","b"]}"#).unwrap();
        assert_eq!(filters.len(), 3);
        assert!(filters.iter().all(|f| f.operator == OperatorKind::Eq && !f.negated));
        let age = filters.iter().find(|f| f.field == "age").unwrap();
        assert_eq!(age.value, QueryValue::One("42".into()));
        let tags = filters.iter().find(|f| f.field == "tags").unwrap();
        assert_eq!(tags.value, QueryValue::Many(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn malformed_json_is_reported_with_raw_input() {
        match parse("{name:").unwrap_err() {
            Error::InvalidWhereClause { raw, .. } => assert_eq!(raw, "{name:"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(parse("[1,2]"), Err(Error::InvalidWhereClause { .. })));
        assert!(matches!(parse(r#"{"a":{"b":1}}"#), Err(Error::InvalidWhereClause { .. })));
    }
}
