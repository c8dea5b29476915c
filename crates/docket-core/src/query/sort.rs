use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::model::item::BacklogItem;

/// Field a result page is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    CreatedAt,
    #[default]
    UpdatedAt,
    /// Items without a due date sort after every dated item.
    DueDate,
    Priority,
    /// Case-insensitive.
    Title,
    /// By the status string value.
    Status,
    /// Unrecognized key: keep load order.
    Identity,
}

impl SortKey {
    /// Map a caller-supplied key. Unknown keys do not fail; they leave the
    /// order untouched.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            "due_date" => Self::DueDate,
            "priority" => Self::Priority,
            "title" => Self::Title,
            "status" => Self::Status,
            _ => Self::Identity,
        }
    }

    #[must_use]
    pub fn compare(self, a: &BacklogItem, b: &BacklogItem) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            Self::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Priority => a.priority.cmp(&b.priority),
            Self::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
            Self::Identity => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ValidationError::new(
                "sort_order",
                format!("'{other}' is not asc or desc"),
            )),
        }
    }
}

/// Stable sort in place. Descending swaps the comparison operands rather
/// than reversing, so ties keep their load order either way.
pub fn sort_items(items: &mut [&BacklogItem], key: SortKey, direction: SortDirection) {
    if key == SortKey::Identity {
        return;
    }
    match direction {
        SortDirection::Asc => items.sort_by(|a, b| key.compare(a, b)),
        SortDirection::Desc => items.sort_by(|a, b| key.compare(b, a)),
    }
}
