//! Pagination utilities for service layer
//!
//! Holds the normalized list query handed to repositories and the page
//! envelope returned to callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Page used when the caller sends none.
pub const DEFAULT_PAGE: u64 = 1;
/// Page size used when the caller sends none.
pub const DEFAULT_LIMIT: u64 = 10;
/// Multiplier applied to the page size when approximating the total count
/// of a full page. Totals beyond `offset + TOTAL_OVERSAMPLE * limit` are
/// reported as `TOTAL_OVERSAMPLE * limit`.
pub const TOTAL_OVERSAMPLE: u64 = 10;

/// Sort direction accepted by list queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderDirection {
    type Err = ();

    /// Case-sensitive: callers uppercase first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            _ => Err(()),
        }
    }
}

/// Columns a repository should materialize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    /// Only the primary key; every other field is left zero-valued.
    IdOnly,
}

/// Normalized list query as seen by repositories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Substring matched against email.
    pub search: String,
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
    pub order_field: Option<String>,
    pub order_direction: Option<OrderDirection>,
    /// Return every matching row; no offset or limit is applied.
    pub no_limit: bool,
    /// Use `offset` and `limit` verbatim instead of deriving them from `page`.
    pub skip_defaults: bool,
    pub projection: Projection,
}

impl ListQuery {
    /// Fill page/limit defaults and derive the offset from the page.
    pub fn with_defaults(mut self) -> Self {
        if self.limit == 0 {
            self.limit = DEFAULT_LIMIT;
        }
        if self.page == 0 {
            self.page = DEFAULT_PAGE;
        }
        self.offset = (self.page - 1).saturating_mul(self.limit);
        self
    }

    /// `(offset, limit)` a repository applies, or `None` for an unbounded scan.
    pub fn window(&self) -> Option<(u64, u64)> {
        if self.no_limit {
            return None;
        }
        if self.skip_defaults {
            return Some((self.offset, self.limit));
        }
        let q = self.clone().with_defaults();
        Some((q.offset, q.limit))
    }

    /// Ordering applies only when both halves are present.
    pub fn ordering(&self) -> Option<(&str, OrderDirection)> {
        match (self.order_field.as_deref(), self.order_direction) {
            (Some(field), Some(direction)) if !field.is_empty() => Some((field, direction)),
            _ => None,
        }
    }
}

/// Page metadata rendered next to the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total_records: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
