//! In-memory backlog query engine.
//!
//! Callers hand over raw [`QueryParams`] (strings for dates and enums, as
//! they arrive from the CLI or a JSON document). [`AdvancedQuery::try_from`]
//! validates them once; [`AdvancedQuery::run`] then filters, sorts, and
//! paginates a loaded slice of items against a caller-supplied `now`.

pub mod filter;
pub mod sort;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dates::parse_iso;
use crate::error::ValidationError;
use crate::model::item::{BacklogItem, Priority, Status};

pub use filter::{Bounds, Filter};
pub use sort::{SortDirection, SortKey, sort_items};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Raw parameters
// ---------------------------------------------------------------------------

/// Unvalidated query parameters. Empty strings and empty lists mean "no
/// filter".
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryParams {
    pub full_text: Option<String>,
    pub title_contains: Option<String>,
    pub description_contains: Option<String>,

    pub status: Option<Vec<String>>,
    pub assignee: Option<Vec<String>>,
    /// Exact priority; takes precedence over `priority_min`/`priority_max`.
    pub priority: Option<i64>,
    pub priority_min: Option<i64>,
    pub priority_max: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub tags_all: Option<Vec<String>>,

    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub updated_after: Option<String>,
    pub updated_before: Option<String>,
    pub due_after: Option<String>,
    pub due_before: Option<String>,
    pub has_due_date: Option<bool>,

    pub sort_by: Option<String>,
    pub sort_order: Option<String>,

    pub limit: Option<i64>,
    pub offset: Option<i64>,

    pub include_archived: bool,
    pub include_stats: bool,
}

// ---------------------------------------------------------------------------
// Validated query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedQuery {
    pub filters: Vec<Filter>,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub offset: usize,
    pub limit: usize,
    pub include_archived: bool,
    pub include_stats: bool,
}

impl Default for AdvancedQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            include_archived: false,
            include_stats: false,
        }
    }
}

fn text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn list(value: Option<Vec<String>>) -> Option<Vec<String>> {
    value.filter(|v| !v.is_empty())
}

fn priority_bound(
    field: &'static str,
    raw: Option<i64>,
) -> Result<Option<Priority>, ValidationError> {
    raw.map(|value| {
        u8::try_from(value)
            .ok()
            .and_then(|v| Priority::new(v).ok())
            .ok_or_else(|| ValidationError::new(field, format!("{value} is outside 1..=5")))
    })
    .transpose()
}

fn bounds(
    after_field: &'static str,
    after: Option<String>,
    before_field: &'static str,
    before: Option<String>,
) -> Result<Bounds, ValidationError> {
    Ok(Bounds {
        after: text(after)
            .map(|raw| parse_iso(after_field, &raw))
            .transpose()?,
        before: text(before)
            .map(|raw| parse_iso(before_field, &raw))
            .transpose()?,
    })
}

impl TryFrom<QueryParams> for AdvancedQuery {
    type Error = ValidationError;

    fn try_from(params: QueryParams) -> Result<Self, Self::Error> {
        let mut filters = Vec::new();

        if let Some(needle) = text(params.full_text) {
            filters.push(Filter::full_text(&needle));
        }
        if let Some(needle) = text(params.title_contains) {
            filters.push(Filter::title_contains(&needle));
        }
        if let Some(needle) = text(params.description_contains) {
            filters.push(Filter::description_contains(&needle));
        }

        if let Some(raw) = list(params.status) {
            let statuses = raw
                .iter()
                .map(|s| s.parse::<Status>().map_err(ValidationError::from))
                .collect::<Result<Vec<_>, _>>()?;
            filters.push(Filter::Status(statuses));
        }
        if let Some(assignees) = list(params.assignee) {
            filters.push(Filter::Assignee(assignees));
        }

        let exact = priority_bound("priority", params.priority)?;
        let min = priority_bound("priority_min", params.priority_min)?;
        let max = priority_bound("priority_max", params.priority_max)?;
        let (min, max) = exact.map_or((min, max), |p| (Some(p), Some(p)));
        if min.is_some() || max.is_some() {
            filters.push(Filter::PriorityRange {
                min: min.unwrap_or(Priority::HIGHEST),
                max: max.unwrap_or(Priority::LOWEST),
            });
        }

        if let Some(tags) = list(params.tags) {
            filters.push(Filter::TagsAny(tags));
        }
        if let Some(tags) = list(params.tags_all) {
            filters.push(Filter::TagsAll(tags));
        }

        let created = bounds(
            "created_after",
            params.created_after,
            "created_before",
            params.created_before,
        )?;
        if !created.is_unbounded() {
            filters.push(Filter::Created(created));
        }
        let updated = bounds(
            "updated_after",
            params.updated_after,
            "updated_before",
            params.updated_before,
        )?;
        if !updated.is_unbounded() {
            filters.push(Filter::Updated(updated));
        }
        let due = bounds("due_after", params.due_after, "due_before", params.due_before)?;
        if !due.is_unbounded() {
            filters.push(Filter::Due(due));
        }

        if let Some(wanted) = params.has_due_date {
            filters.push(Filter::HasDueDate(wanted));
        }

        let sort_key =
            text(params.sort_by).map_or_else(SortKey::default, |raw| SortKey::parse(&raw));
        let direction = text(params.sort_order)
            .map(|raw| raw.parse::<SortDirection>())
            .transpose()?
            .unwrap_or_default();

        let limit = match params.limit {
            None => DEFAULT_LIMIT,
            Some(raw) => usize::try_from(raw)
                .ok()
                .filter(|l| (1..=MAX_LIMIT).contains(l))
                .ok_or_else(|| {
                    ValidationError::new("limit", format!("{raw} is outside 1..={MAX_LIMIT}"))
                })?,
        };
        let offset = match params.offset {
            None => 0,
            Some(raw) => usize::try_from(raw)
                .map_err(|_| ValidationError::new("offset", format!("{raw} is negative")))?,
        };

        Ok(Self {
            filters,
            sort_key,
            direction,
            offset,
            limit,
            include_archived: params.include_archived,
            include_stats: params.include_stats,
        })
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// An item in a result page, with its overdue flag as of the query's `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: BacklogItem,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub total_items: usize,
    pub filtered_items: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_assignee: BTreeMap<String, usize>,
    pub overdue_count: usize,
    pub with_due_date: usize,
}

impl QueryStats {
    fn collect(total_items: usize, filtered: &[&BacklogItem], now: NaiveDateTime) -> Self {
        let mut stats = Self {
            total_items,
            filtered_items: filtered.len(),
            ..Self::default()
        };
        for item in filtered {
            *stats
                .by_status
                .entry(item.status.as_str().to_string())
                .or_default() += 1;
            *stats.by_priority.entry(item.priority.label()).or_default() += 1;
            if let Some(assignee) = &item.assignee {
                *stats.by_assignee.entry(assignee.clone()).or_default() += 1;
            }
            if item.is_overdue(now) {
                stats.overdue_count += 1;
            }
            if item.due_date.is_some() {
                stats.with_due_date += 1;
            }
        }
        stats
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPage {
    /// Matches before pagination.
    pub total: usize,
    /// Items on this page.
    pub count: usize,
    pub offset: usize,
    pub limit: usize,
    pub results: Vec<ItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<QueryStats>,
}

impl AdvancedQuery {
    /// True when every filter accepts `item`.
    #[must_use]
    pub fn matches(&self, item: &BacklogItem) -> bool {
        self.filters.iter().all(|f| f.matches(item))
    }

    /// Filter, sort, and paginate `items`.
    #[must_use]
    pub fn run(&self, items: &[BacklogItem], now: NaiveDateTime) -> QueryPage {
        let mut filtered: Vec<&BacklogItem> = items.iter().filter(|i| self.matches(i)).collect();
        sort_items(&mut filtered, self.sort_key, self.direction);

        let total = filtered.len();
        let start = self.offset.min(total);
        let end = self.offset.saturating_add(self.limit).min(total);
        let results: Vec<ItemView> = filtered[start..end]
            .iter()
            .map(|item| ItemView {
                item: (*item).clone(),
                is_overdue: item.is_overdue(now),
            })
            .collect();

        debug!(
            loaded = items.len(),
            matched = total,
            returned = results.len(),
            "query evaluated"
        );

        QueryPage {
            total,
            count: results.len(),
            offset: self.offset,
            limit: self.limit,
            results,
            stats: self
                .include_stats
                .then(|| QueryStats::collect(items.len(), &filtered, now)),
        }
    }
}
