//! Structured query (filters) → sea_orm::Condition compiler.
//!
//! Filter values arrive as raw strings and are coerced per whitelisted
//! [`FieldKind`]; unknown fields are rejected.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime, Utc};
use query_core::operators::LikeAnchor;
use query_core::{Filter, Predicate, SortDir, StructuredQuery};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, Order},
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use thiserror::Error;

const LIKE_ESCAPE: char = '\\';

/// Whitelisted field kind → used to coerce raw filter strings into `sea_orm::Value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Bool,
    Uuid,
    DateTimeUtc,
    Date,
    Time,
    Decimal,
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

/// API field names → columns, plus the relation names the store can load.
#[derive(Clone)]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
    relations: HashSet<String>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            relations: HashSet::new(),
        }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map
            .insert(api_name.into().to_lowercase(), Field { col, kind });
        self
    }

    pub fn relation(mut self, name: impl Into<String>) -> Self {
        self.relations.insert(name.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(&name.to_lowercase())
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("type mismatch on '{field}': expected {expected:?}, got '{value}'")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        value: String,
    },

    #[error("unknown relation: {0}")]
    UnknownRelation(String),
}
pub type QueryBuildResult<T> = Result<T, QueryBuildError>;

/* ---------- coercion ---------- */

fn coerce(name: &str, kind: FieldKind, raw: &str) -> QueryBuildResult<sea_orm::Value> {
    use sea_orm::Value as V;

    let mismatch = || QueryBuildError::TypeMismatch {
        field: name.to_owned(),
        expected: kind,
        value: raw.to_owned(),
    };

    Ok(match kind {
        FieldKind::String => V::String(Some(Box::new(raw.to_owned()))),
        FieldKind::I64 => V::BigInt(Some(raw.trim().parse::<i64>().map_err(|_| mismatch())?)),
        FieldKind::F64 => V::Double(Some(raw.trim().parse::<f64>().map_err(|_| mismatch())?)),
        FieldKind::Bool => V::Bool(Some(match raw.trim() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(mismatch()),
        })),
        FieldKind::Uuid => V::Uuid(Some(Box::new(
            raw.trim().parse::<uuid::Uuid>().map_err(|_| mismatch())?,
        ))),
        FieldKind::DateTimeUtc => {
            let dt = chrono::DateTime::parse_from_rfc3339(raw.trim())
                .map_err(|_| mismatch())?
                .with_timezone(&Utc);
            V::ChronoDateTimeUtc(Some(Box::new(dt)))
        }
        FieldKind::Date => V::ChronoDate(Some(Box::new(
            raw.trim().parse::<NaiveDate>().map_err(|_| mismatch())?,
        ))),
        FieldKind::Time => V::ChronoTime(Some(Box::new(
            raw.trim().parse::<NaiveTime>().map_err(|_| mismatch())?,
        ))),
        FieldKind::Decimal => V::Decimal(Some(Box::new(
            raw.trim().parse::<Decimal>().map_err(|_| mismatch())?,
        ))),
    })
}

/* ---------- LIKE helpers ---------- */

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push(LIKE_ESCAPE);
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

fn like_pattern(value: &str, anchor: LikeAnchor) -> String {
    let v = like_escape(value);
    match anchor {
        LikeAnchor::Contains => format!("%{v}%"),
        LikeAnchor::StartsWith => format!("{v}%"),
        LikeAnchor::EndsWith => format!("%{v}"),
    }
}

#[inline]
fn ensure_string_field<E: EntityTrait>(f: &Field<E>, name: &str, raw: &str) -> QueryBuildResult<()> {
    if f.kind != FieldKind::String {
        return Err(QueryBuildError::TypeMismatch {
            field: name.to_owned(),
            expected: FieldKind::String,
            value: raw.to_owned(),
        });
    }
    Ok(())
}

/* ---------- Predicate -> Condition ---------- */

fn predicate_to_condition<E: EntityTrait>(
    name: &str,
    f: &Field<E>,
    pred: &Predicate,
) -> QueryBuildResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    let col = f.col;
    let e = match pred {
        Predicate::Eq(v) => Expr::col(col).eq(coerce(name, f.kind, v)?),
        Predicate::Gt(v) => Expr::col(col).gt(coerce(name, f.kind, v)?),
        Predicate::Gte(v) => Expr::col(col).gte(coerce(name, f.kind, v)?),
        Predicate::Lt(v) => Expr::col(col).lt(coerce(name, f.kind, v)?),
        Predicate::Lte(v) => Expr::col(col).lte(coerce(name, f.kind, v)?),
        Predicate::Like {
            value,
            anchor,
            case_insensitive,
        } => {
            ensure_string_field(f, name, value)?;
            let pattern = like_pattern(value, *anchor);
            if *case_insensitive {
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.to_lowercase()).escape(LIKE_ESCAPE))
            } else {
                Expr::col(col).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
            }
        }
        Predicate::IsNull => Expr::col(col).is_null(),
        Predicate::Not(inner) => {
            let inner = predicate_to_condition::<E>(name, f, inner)?;
            return Ok(Condition::all().not().add(inner));
        }
    };
    Ok(Condition::all().add(e))
}

pub fn filter_to_condition<E: EntityTrait>(
    filter: &Filter,
    fmap: &FieldMap<E>,
) -> QueryBuildResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    let f = fmap
        .get(&filter.field)
        .ok_or_else(|| QueryBuildError::UnknownField(filter.field.clone()))?;
    predicate_to_condition::<E>(&filter.field, f, &filter.predicate())
}

/// All filters AND-ed together. An empty filter list yields an empty condition.
pub fn query_to_condition<E: EntityTrait>(
    query: &StructuredQuery,
    fmap: &FieldMap<E>,
) -> QueryBuildResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    query
        .filters
        .iter()
        .try_fold(Condition::all(), |acc, filter| {
            Ok(acc.add(filter_to_condition::<E>(filter, fmap)?))
        })
}

/// Apply a structured query to a plain SeaORM `Select<E>`.
pub trait StructuredQueryExt<E: EntityTrait>: Sized {
    /// WHERE only.
    fn apply_filters(self, query: &StructuredQuery, fmap: &FieldMap<E>) -> QueryBuildResult<Self>;

    /// WHERE + ORDER BY + OFFSET/LIMIT; relation names are checked, not joined.
    fn apply_structured_query(
        self,
        query: &StructuredQuery,
        fmap: &FieldMap<E>,
    ) -> QueryBuildResult<Self>;
}

impl<E> StructuredQueryExt<E> for sea_orm::Select<E>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    fn apply_filters(self, query: &StructuredQuery, fmap: &FieldMap<E>) -> QueryBuildResult<Self> {
        if query.filters.is_empty() {
            return Ok(self);
        }
        Ok(self.filter(query_to_condition::<E>(query, fmap)?))
    }

    fn apply_structured_query(
        self,
        query: &StructuredQuery,
        fmap: &FieldMap<E>,
    ) -> QueryBuildResult<Self> {
        // relation names are validated only; loading is left to the caller
        if let Some(relations) = &query.relations {
            if let Some(unknown) = relations.iter().find(|r| !fmap.has_relation(r)) {
                return Err(QueryBuildError::UnknownRelation(unknown.clone()));
            }
        }

        let mut select = self.apply_filters(query, fmap)?;

        for key in query.order.iter().flatten() {
            let f = fmap
                .get(&key.column)
                .ok_or_else(|| QueryBuildError::UnknownField(key.column.clone()))?;
            let ord = match key.direction {
                SortDir::Asc => Order::Asc,
                SortDir::Desc => Order::Desc,
            };
            select = select.order_by(f.col, ord);
        }

        Ok(select.offset(query.skip).limit(query.take))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(like_pattern("50%", LikeAnchor::Contains), "%50\\%%");
        assert_eq!(like_pattern("a_b", LikeAnchor::StartsWith), "a\\_b%");
        assert_eq!(like_pattern("x", LikeAnchor::EndsWith), "%x");
    }

    #[test]
    fn coerce_by_kind() {
        assert_eq!(
            coerce("age", FieldKind::I64, "42").unwrap(),
            sea_orm::Value::BigInt(Some(42))
        );
        assert_eq!(
            coerce("ok", FieldKind::Bool, "1").unwrap(),
            sea_orm::Value::Bool(Some(true))
        );
        assert!(coerce("d", FieldKind::Date, "2024-02-30").is_err());
        match coerce("age", FieldKind::I64, "old").unwrap_err() {
            QueryBuildError::TypeMismatch { field, value, .. } => {
                assert_eq!(field, "age");
                assert_eq!(value, "old");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
