use serde::{Deserialize, Serialize};

use crate::operators::{OperatorKind, Predicate};
use crate::params::QueryValue;

/// Filters keep the raw query value, array form included.
pub type FilterValue = QueryValue;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: OperatorKind,
    pub negated: bool,
    pub value: FilterValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator: OperatorKind::Eq,
            negated: false,
            value,
        }
    }

    /// Predicate for this filter, wrapped in `Not` when negated.
    pub fn predicate(&self) -> Predicate {
        let p = self.operator.build(self.value.first());
        if self.negated {
            p.negate()
        } else {
            p
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub column: String,
    pub direction: SortDir,
}

/// Translator output: filters, pagination, ordering and relations to load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub filters: Vec<Filter>,
    pub skip: u64,
    pub take: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<OrderKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<String>>,
}

impl Default for StructuredQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            skip: 0,
            take: crate::DEFAULT_PAGE_SIZE,
            order: None,
            relations: None,
        }
    }
}

impl StructuredQuery {
    pub fn filter(&self, field: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.field == field)
    }

    /// 1-based page number implied by `skip`/`take`.
    pub fn page(&self) -> u64 {
        self.skip / self.take.max(1) + 1
    }

    /// Append equality filters parsed from a JSON where-clause.
    pub fn with_where_json(mut self, raw: &str) -> crate::Result<Self> {
        self.filters.extend(crate::where_clause::parse(raw)?);
        Ok(self)
    }
}
