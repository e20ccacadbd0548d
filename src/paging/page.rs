use serde::Deserialize;

use super::registry::{EntityKind, SortRegistry};

pub const DEFAULT_SKIP: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 6;

/// Raw, untrusted paging parameters as they arrive on the query string.
///
/// Everything is kept as text so that a malformed `skip` or `limit` falls
/// back to its default instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub skip: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc`/`descending` sorts ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("desc") || s.eq_ignore_ascii_case("descending") => {
                SortOrder::Desc
            }
            _ => SortOrder::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One validated page of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paging {
    query: Option<String>,
    sort: &'static str,
    order: SortOrder,
    skip: u32,
    limit: u32,
}

impl Paging {
    pub fn parse(params: &PageParams, registry: &SortRegistry, kind: EntityKind) -> Self {
        Self {
            query: params.q.clone().filter(|q| !q.is_empty()),
            sort: registry.resolve(kind, params.sort.as_deref()),
            order: SortOrder::parse(params.order.as_deref()),
            skip: parse_or(params.skip.as_deref(), DEFAULT_SKIP),
            limit: parse_or(params.limit.as_deref(), DEFAULT_LIMIT),
        }
    }

    /// Build a page directly. `sort` still goes through the registry.
    pub fn new(
        registry: &SortRegistry,
        kind: EntityKind,
        query: &str,
        sort: &str,
        order: SortOrder,
        skip: u32,
        limit: u32,
    ) -> Self {
        Self {
            query: Some(query.to_string()).filter(|q| !q.is_empty()),
            sort: registry.resolve(kind, Some(sort)),
            order,
            skip,
            limit,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn sort(&self) -> &'static str {
        self.sort
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn skip(&self) -> u32 {
        self.skip
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

fn parse_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(default)
}

/// Page through an already materialized sequence. Out of range bounds are
/// clamped, so this never panics.
pub fn slice<T>(seq: &[T], skip: usize, limit: usize) -> &[T] {
    let start = skip.min(seq.len());
    let end = start.saturating_add(limit).min(seq.len());
    &seq[start..end]
}
