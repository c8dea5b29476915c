use chrono::NaiveDateTime;

use crate::dates::start_of_day;
use crate::model::item::{BacklogItem, Priority, Status};

/// Inclusive timestamp window. An item is rejected when its value falls
/// before `after` or past `before`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub after: Option<NaiveDateTime>,
    pub before: Option<NaiveDateTime>,
}

impl Bounds {
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    #[must_use]
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        if self.after.is_some_and(|after| ts < after) {
            return false;
        }
        if self.before.is_some_and(|before| ts > before) {
            return false;
        }
        true
    }
}

/// One predicate of a query. A query keeps only items every filter accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Case-insensitive substring of `title + " " + description`.
    FullText(String),
    TitleContains(String),
    DescriptionContains(String),
    /// Status is one of the set.
    Status(Vec<Status>),
    /// Assignee is one of the set; unassigned items never match.
    Assignee(Vec<String>),
    /// Inclusive priority range.
    PriorityRange { min: Priority, max: Priority },
    /// At least one of the tags is present.
    TagsAny(Vec<String>),
    /// Every one of the tags is present.
    TagsAll(Vec<String>),
    Created(Bounds),
    Updated(Bounds),
    /// Due-date window; items without a due date pass.
    Due(Bounds),
    HasDueDate(bool),
}

impl Filter {
    /// Case-insensitive text filters store the needle lowered once.
    #[must_use]
    pub fn full_text(needle: &str) -> Self {
        Self::FullText(needle.to_lowercase())
    }

    #[must_use]
    pub fn title_contains(needle: &str) -> Self {
        Self::TitleContains(needle.to_lowercase())
    }

    #[must_use]
    pub fn description_contains(needle: &str) -> Self {
        Self::DescriptionContains(needle.to_lowercase())
    }

    #[must_use]
    pub fn matches(&self, item: &BacklogItem) -> bool {
        match self {
            Self::FullText(needle) => format!("{} {}", item.title, item.description)
                .to_lowercase()
                .contains(needle.as_str()),
            Self::TitleContains(needle) => item.title.to_lowercase().contains(needle.as_str()),
            Self::DescriptionContains(needle) => {
                item.description.to_lowercase().contains(needle.as_str())
            }
            Self::Status(set) => set.contains(&item.status),
            Self::Assignee(set) => item
                .assignee
                .as_ref()
                .is_some_and(|assignee| set.contains(assignee)),
            Self::PriorityRange { min, max } => (*min..=*max).contains(&item.priority),
            Self::TagsAny(tags) => tags.iter().any(|t| item.tags.contains(t)),
            Self::TagsAll(tags) => tags.iter().all(|t| item.tags.contains(t)),
            Self::Created(bounds) => bounds.contains(item.created_at),
            Self::Updated(bounds) => bounds.contains(item.updated_at),
            Self::Due(bounds) => item
                .due_date
                .is_none_or(|due| bounds.contains(start_of_day(due))),
            Self::HasDueDate(wanted) => item.due_date.is_some() == *wanted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32) -> NaiveDateTime {
        start_of_day(NaiveDate::from_ymd_opt(2024, 5, d).unwrap())
    }

    fn item() -> BacklogItem {
        BacklogItem {
            id: "a".into(),
            title: "Fix Login".into(),
            description: "OAuth callback drops state".into(),
            status: Status::Review,
            assignee: Some("kim".into()),
            priority: Priority::new(2).unwrap(),
            tags: vec!["auth".into(), "bug".into()],
            due_date: NaiveDate::from_ymd_opt(2024, 5, 10),
            created_at: ts(1),
            updated_at: ts(5),
            completed_at: None,
        }
    }

    #[test]
    fn text_filters_ignore_case() {
        let item = item();
        assert!(Filter::full_text("login oauth").matches(&item));
        assert!(Filter::title_contains("LOGIN").matches(&item));
        assert!(!Filter::title_contains("oauth").matches(&item));
        assert!(Filter::description_contains("Callback").matches(&item));
    }

    #[test]
    fn assignee_set_excludes_unassigned() {
        let mut item = item();
        let filter = Filter::Assignee(vec!["kim".into(), "lee".into()]);
        assert!(filter.matches(&item));
        item.assignee = None;
        assert!(!filter.matches(&item));
    }

    #[test]
    fn tags_any_versus_all() {
        let item = item();
        assert!(Filter::TagsAny(vec!["ui".into(), "bug".into()]).matches(&item));
        assert!(!Filter::TagsAll(vec!["ui".into(), "bug".into()]).matches(&item));
        assert!(Filter::TagsAll(vec!["auth".into(), "bug".into()]).matches(&item));
        assert!(!Filter::TagsAny(vec!["Bug".into()]).matches(&item));
    }

    #[test]
    fn bounds_are_inclusive() {
        let item = item();
        let exact = Bounds {
            after: Some(ts(1)),
            before: Some(ts(1)),
        };
        assert!(Filter::Created(exact).matches(&item));
        let later = Bounds {
            after: Some(ts(2)),
            before: None,
        };
        assert!(!Filter::Created(later).matches(&item));
    }

    #[test]
    fn due_bounds_pass_items_without_due_date() {
        let mut item = item();
        let window = Bounds {
            after: Some(ts(11)),
            before: None,
        };
        assert!(!Filter::Due(window).matches(&item));
        item.due_date = None;
        assert!(Filter::Due(window).matches(&item));
        assert!(!Filter::HasDueDate(true).matches(&item));
        assert!(Filter::HasDueDate(false).matches(&item));
    }

    #[test]
    fn priority_range_is_inclusive() {
        let item = item();
        let range = |min: u8, max: u8| Filter::PriorityRange {
            min: Priority::new(min).unwrap(),
            max: Priority::new(max).unwrap(),
        };
        assert!(range(2, 2).matches(&item));
        assert!(range(1, 3).matches(&item));
        assert!(!range(3, 5).matches(&item));
    }
}
