//! Translation of raw query parameters into a typed collection query.
//!
//! Parsing is lenient: names outside a resource's allow-lists and values that
//! do not parse for their field are dropped, never rejected.

use std::collections::BTreeMap;

use tracing::debug;

use crate::application::access::ListScope;
use crate::application::pagination::{PageLimits, PageRequest, PaginationError};
use crate::domain::resources::{FieldKind, ResourceDescriptor};

pub const ORDERING_PARAM: &str = "ordering";
pub const SEARCH_PARAM: &str = "search";
pub const LIMIT_PARAM: &str = "limit";
pub const CURSOR_PARAM: &str = "cursor";

const RESERVED: &[&str] = &[ORDERING_PARAM, SEARCH_PARAM, LIMIT_PARAM, CURSOR_PARAM];

/// Raw query-string parameters, one value per name.
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl FilterValue {
    fn parse(kind: FieldKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match kind {
            FieldKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Self::Bool(true)),
                "false" | "0" => Some(Self::Bool(false)),
                _ => None,
            },
            FieldKind::Integer => raw.parse().ok().map(Self::Integer),
            FieldKind::Text => (!raw.is_empty()).then(|| Self::Text(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: &'static str,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: &'static str,
    pub descending: bool,
}

impl OrderTerm {
    fn parse(term: &'static str) -> Self {
        match term.strip_prefix('-') {
            Some(field) => Self {
                field,
                descending: true,
            },
            None => Self {
                field: term,
                descending: false,
            },
        }
    }
}

/// Fully-resolved query handed to the storage layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub filters: Vec<FieldFilter>,
    pub search: Option<String>,
    pub ordering: Vec<OrderTerm>,
    pub scope: ListScope,
    pub page: PageRequest,
}

/// Keep only filters on allow-listed fields whose values parse.
pub fn parse_filters(descriptor: &ResourceDescriptor, params: &QueryParams) -> Vec<FieldFilter> {
    params
        .iter()
        .filter(|(name, _)| !RESERVED.contains(&name.as_str()))
        .filter_map(|(name, raw)| {
            let Some(field) = descriptor.filter_field(name) else {
                debug!(
                    target: "storefront::query",
                    resource = descriptor.slug,
                    field = %name,
                    "ignoring unknown filter field"
                );
                return None;
            };
            let Some(value) = FilterValue::parse(field.kind, raw) else {
                debug!(
                    target: "storefront::query",
                    resource = descriptor.slug,
                    field = field.name,
                    value = %raw,
                    "ignoring unparseable filter value"
                );
                return None;
            };
            Some(FieldFilter {
                field: field.name,
                value,
            })
        })
        .collect()
}

/// Resolve a comma-separated ordering such as `-price_cents,name`.
///
/// Unknown or duplicate terms are dropped; when nothing usable remains the
/// resource default applies.
pub fn parse_ordering(descriptor: &ResourceDescriptor, raw: Option<&str>) -> Vec<OrderTerm> {
    let mut terms: Vec<OrderTerm> = Vec::new();
    for token in raw.unwrap_or_default().split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (name, descending) = match token.strip_prefix('-') {
            Some(name) => (name, true),
            None => (token, false),
        };
        let Some(field) = descriptor.sortable.iter().copied().find(|f| *f == name) else {
            debug!(
                target: "storefront::query",
                resource = descriptor.slug,
                field = %name,
                "ignoring unknown ordering field"
            );
            continue;
        };
        if terms.iter().all(|t| t.field != field) {
            terms.push(OrderTerm { field, descending });
        }
    }

    if terms.is_empty() {
        terms = descriptor
            .default_order
            .iter()
            .copied()
            .map(OrderTerm::parse)
            .collect();
    }
    terms
}

/// Non-empty, trimmed search text, if the resource supports search.
pub fn parse_search(descriptor: &ResourceDescriptor, params: &QueryParams) -> Option<String> {
    if descriptor.search_fields.is_empty() {
        return None;
    }
    params
        .get(SEARCH_PARAM)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl CollectionQuery {
    pub fn from_params(
        descriptor: &ResourceDescriptor,
        params: &QueryParams,
        limits: PageLimits,
        scope: ListScope,
    ) -> Result<Self, PaginationError> {
        let filters = parse_filters(descriptor, params);
        let ordering = parse_ordering(descriptor, params.get(ORDERING_PARAM).map(String::as_str));
        let search = parse_search(descriptor, params);
        let page = PageRequest::from_query(
            params.get(LIMIT_PARAM).map(String::as_str),
            params.get(CURSOR_PARAM).map(String::as_str),
            limits,
        )?;
        Ok(Self {
            filters,
            search,
            ordering,
            scope,
            page,
        })
    }
}
