//! Operator registry: canonical operator names → predicate builders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Filter operators accepted in the operator chain of a query key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorKind {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    IsNull,
}

/// Where a `LIKE` pattern is anchored relative to the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeAnchor {
    Contains,
    StartsWith,
    EndsWith,
}

/// Store-agnostic comparison produced by an operator.
///
/// Values stay as the raw strings received; coercion to column types happens
/// in the storage layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum Predicate {
    Eq(String),
    Gt(String),
    Gte(String),
    Lt(String),
    Lte(String),
    Like {
        value: String,
        anchor: LikeAnchor,
        case_insensitive: bool,
    },
    IsNull,
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }
}

/// Builds a predicate from a raw filter value.
pub type PredicateBuilder = fn(&str) -> Predicate;

fn like(value: &str, anchor: LikeAnchor, case_insensitive: bool) -> Predicate {
    Predicate::Like {
        value: value.to_owned(),
        anchor,
        case_insensitive,
    }
}

fn eq(v: &str) -> Predicate {
    Predicate::Eq(v.to_owned())
}
fn gt(v: &str) -> Predicate {
    Predicate::Gt(v.to_owned())
}
fn gte(v: &str) -> Predicate {
    Predicate::Gte(v.to_owned())
}
fn lt(v: &str) -> Predicate {
    Predicate::Lt(v.to_owned())
}
fn lte(v: &str) -> Predicate {
    Predicate::Lte(v.to_owned())
}
fn contains(v: &str) -> Predicate {
    like(v, LikeAnchor::Contains, false)
}
fn icontains(v: &str) -> Predicate {
    like(v, LikeAnchor::Contains, true)
}
fn startswith(v: &str) -> Predicate {
    like(v, LikeAnchor::StartsWith, false)
}
fn istartswith(v: &str) -> Predicate {
    like(v, LikeAnchor::StartsWith, true)
}
fn endswith(v: &str) -> Predicate {
    like(v, LikeAnchor::EndsWith, false)
}
fn iendswith(v: &str) -> Predicate {
    like(v, LikeAnchor::EndsWith, true)
}
fn isnull(_: &str) -> Predicate {
    Predicate::IsNull
}

const REGISTRY: &[(&str, OperatorKind, PredicateBuilder)] = &[
    ("eq", OperatorKind::Eq, eq),
    ("gt", OperatorKind::Gt, gt),
    ("gte", OperatorKind::Gte, gte),
    ("lt", OperatorKind::Lt, lt),
    ("lte", OperatorKind::Lte, lte),
    ("contains", OperatorKind::Contains, contains),
    ("icontains", OperatorKind::IContains, icontains),
    ("startswith", OperatorKind::StartsWith, startswith),
    ("istartswith", OperatorKind::IStartsWith, istartswith),
    ("endswith", OperatorKind::EndsWith, endswith),
    ("iendswith", OperatorKind::IEndsWith, iendswith),
    ("isnull", OperatorKind::IsNull, isnull),
];

/// Resolve an operator name to its predicate builder.
pub fn resolve(name: &str) -> Result<PredicateBuilder, Error> {
    REGISTRY
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, _, build)| *build)
        .ok_or_else(|| Error::InvalidOperator(name.to_owned()))
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 12] = [
        OperatorKind::Eq,
        OperatorKind::Gt,
        OperatorKind::Gte,
        OperatorKind::Lt,
        OperatorKind::Lte,
        OperatorKind::Contains,
        OperatorKind::IContains,
        OperatorKind::StartsWith,
        OperatorKind::IStartsWith,
        OperatorKind::EndsWith,
        OperatorKind::IEndsWith,
        OperatorKind::IsNull,
    ];

    pub fn as_str(&self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, kind, _)| kind == self)
            .map(|(name, _, _)| *name)
            .unwrap_or("eq")
    }

    /// Build the (non-negated) predicate for `value`.
    pub fn build(&self, value: &str) -> Predicate {
        match resolve(self.as_str()) {
            Ok(builder) => builder(value),
            Err(_) => Predicate::Eq(value.to_owned()),
        }
    }
}

impl FromStr for OperatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REGISTRY
            .iter()
            .find(|(n, _, _)| *n == s)
            .map(|(_, kind, _)| *kind)
            .ok_or_else(|| Error::InvalidOperator(s.to_owned()))
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in OperatorKind::ALL {
            assert_eq!(kind.as_str().parse::<OperatorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "bogus".parse::<OperatorKind>().unwrap_err();
        assert_eq!(err, Error::InvalidOperator("bogus".into()));
        assert!(resolve("GT").is_err(), "names are case-sensitive");
    }

    #[test]
    fn isnull_ignores_its_value() {
        assert_eq!(OperatorKind::IsNull.build("whatever"), Predicate::IsNull);
        assert_eq!(OperatorKind::IsNull.build(""), Predicate::IsNull);
    }

    #[test]
    fn case_insensitive_variants() {
        assert_eq!(
            OperatorKind::IStartsWith.build("Bo"),
            Predicate::Like {
                value: "Bo".into(),
                anchor: LikeAnchor::StartsWith,
                case_insensitive: true,
            }
        );
        assert_eq!(
            OperatorKind::EndsWith.build("x"),
            Predicate::Like {
                value: "x".into(),
                anchor: LikeAnchor::EndsWith,
                case_insensitive: false,
            }
        );
    }

    #[test]
    fn negate_wraps() {
        let p = OperatorKind::Gt.build("5").negate();
        assert_eq!(p, Predicate::Not(Box::new(Predicate::Gt("5".into()))));
    }
}
