//! HTTP query parameters → [`StructuredQuery`].
//!
//! Control keys never become filters. Malformed pagination degrades to
//! defaults; the only hard failure is an unknown operator.

use serde::{Deserialize, Serialize};

use crate::operators::OperatorKind;
use crate::params::{QueryParams, QueryValue};
use crate::query::{Filter, OrderKey, SortDir, StructuredQuery};
use crate::{Result, DEFAULT_PAGE_SIZE, DELIMITER};

const PAGE: &str = "page";
const PAGE_SIZE: &str = "page_size";
const ORDER: &str = "order";
const POPULATE: &str = "populate";
const NEGATION: &str = "not";

/// What happens when several keys target the same field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameFieldPolicy {
    /// Last key wins; the filter keeps the position of the first key.
    #[default]
    Overwrite,
    /// Every key contributes its own filter.
    Conjoin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    pub default_page_size: u64,
    /// Upper bound applied to `__page_size`; `None` means unbounded.
    pub max_page_size: Option<u64>,
    pub same_field: SameFieldPolicy,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: None,
            same_field: SameFieldPolicy::Overwrite,
        }
    }
}

/// Stateless translator; safe to share across threads.
#[derive(Clone, Debug, Default)]
pub struct QueryTranslator {
    config: TranslatorConfig,
}

/// Translate with the default configuration.
pub fn translate(params: &QueryParams) -> Result<StructuredQuery> {
    QueryTranslator::default().translate(params)
}

impl QueryTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn translate(&self, params: &QueryParams) -> Result<StructuredQuery> {
        let take = self.page_size(params.get(&control(PAGE_SIZE)));
        let page = page_number(params.get(&control(PAGE)));
        let skip = (page - 1).saturating_mul(take);

        let order = params
            .get(&control(ORDER))
            .map(parse_order)
            .filter(|keys| !keys.is_empty());
        let relations = params
            .get(&control(POPULATE))
            .map(|v| {
                let mut names = v.clone().into_vec();
                names.retain(|name| !name.is_empty());
                names
            })
            .filter(|names| !names.is_empty());

        let mut filters: Vec<Filter> = Vec::new();
        for (key, value) in params.iter() {
            let Some(filter) = parse_filter(key, value)? else {
                continue;
            };
            match self.config.same_field {
                SameFieldPolicy::Overwrite => {
                    match filters.iter_mut().find(|f| f.field == filter.field) {
                        Some(slot) => *slot = filter,
                        None => filters.push(filter),
                    }
                }
                SameFieldPolicy::Conjoin => filters.push(filter),
            }
        }

        tracing::trace!(
            filters = filters.len(),
            skip,
            take,
            "translated query parameters"
        );

        Ok(StructuredQuery {
            filters,
            skip,
            take,
            order,
            relations,
        })
    }

    fn page_size(&self, raw: Option<&QueryValue>) -> u64 {
        let parsed = match raw {
            Some(QueryValue::One(v)) => parse_int_prefix(v).filter(|n| *n > 0),
            _ => None,
        };
        let size = parsed.map_or(self.config.default_page_size, |n| n as u64);
        match self.config.max_page_size {
            Some(max) => size.min(max),
            None => size,
        }
    }
}

fn control(name: &str) -> String {
    format!("{DELIMITER}{name}")
}

fn page_number(raw: Option<&QueryValue>) -> u64 {
    match raw {
        Some(QueryValue::One(v)) => parse_int_prefix(v).filter(|n| *n >= 1).map_or(1, |n| n as u64),
        _ => 1,
    }
}

/// Leading-integer parse: optional sign then digits, trailing garbage ignored.
/// `"10abc"` → 10, `"abc"` → None.
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    rest[..digits_len].parse::<i64>().ok().map(|n| sign * n)
}

/// `+col` → ASC, `-col` → DESC, bare `col` → DESC. Empty tokens and bare
/// signs name no column and are dropped.
fn parse_order(raw: &QueryValue) -> Vec<OrderKey> {
    let tokens: Vec<&str> = match raw {
        QueryValue::One(v) => vec![v.as_str()],
        QueryValue::Many(vs) => vs.iter().map(String::as_str).collect(),
    };

    let mut keys: Vec<OrderKey> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let (direction, column) = match token.as_bytes().first() {
            Some(b'+') => (SortDir::Asc, &token[1..]),
            Some(b'-') => (SortDir::Desc, &token[1..]),
            _ => (SortDir::Desc, token),
        };
        if column.is_empty() {
            continue;
        }
        match keys.iter_mut().find(|k| k.column == column) {
            Some(existing) => existing.direction = direction,
            None => keys.push(OrderKey {
                column: column.to_owned(),
                direction,
            }),
        }
    }
    keys
}

/// `None` for keys without a field segment (control keys, known or not).
fn parse_filter(key: &str, value: &QueryValue) -> Result<Option<Filter>> {
    let mut segments = key.split(DELIMITER);
    let field = segments.next().unwrap_or_default();
    if field.is_empty() {
        return Ok(None);
    }
    let chain: Vec<&str> = segments.collect();

    // `name__=bob` has an empty operator segment and means equality
    let Some(first) = chain.first().filter(|op| !op.is_empty()) else {
        return Ok(Some(Filter::eq(field, value.clone())));
    };

    let negated = *first == NEGATION;
    let name = if negated {
        chain.get(1).copied().unwrap_or_default()
    } else {
        *first
    };
    let operator: OperatorKind = name.parse()?;

    Ok(Some(Filter {
        field: field.to_owned(),
        operator,
        negated,
        value: value.clone(),
    }))
}
