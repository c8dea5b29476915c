use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::dates::{self, truncate_to_minute};
use crate::error::ValidationError;

/// File extension every stored document carries.
pub const DOCUMENT_EXTENSION: &str = "md";

/// The six backlog lifecycle states.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
    Cancelled,
}

impl Status {
    pub const ALL: [Self; 6] = [
        Self::Todo,
        Self::InProgress,
        Self::Review,
        Self::Done,
        Self::Blocked,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Cancelled => "cancelled",
        }
    }

    /// Done and cancelled items are never overdue or stale.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Parse a stored status, falling back to `todo` for anything unknown.
    ///
    /// Use [`FromStr`] where unknown input must be rejected instead.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl From<ParseEnumError> for ValidationError {
    fn from(err: ParseEnumError) -> Self {
        Self::new(
            "status",
            format!(
                "'{}' is not one of todo, in_progress, review, done, blocked, cancelled",
                err.got
            ),
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "status",
                got: s.to_string(),
            })
    }
}

/// Priority from 1 (highest) to 5 (lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Self = Self(1);
    pub const DEFAULT: Self = Self(3);
    pub const LOWEST: Self = Self(5);

    /// Glyph repeated `6 - priority` times in the markdown metadata block.
    pub const GLYPH: char = '⭐';

    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `value` is outside `1..=5`.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::HIGHEST.0..=Self::LOWEST.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::new(
                "priority",
                format!("{value} is outside 1..=5"),
            ))
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Number of glyphs rendered for this priority.
    #[must_use]
    pub const fn glyph_count(self) -> usize {
        (6 - self.0) as usize
    }

    /// Inverse of [`Priority::glyph_count`]; zero or out-of-range counts
    /// yield the default priority.
    #[must_use]
    pub fn from_glyph_count(count: usize) -> Self {
        match count {
            1 => Self(5),
            2 => Self(4),
            3 => Self(3),
            4 => Self(2),
            5 => Self(1),
            _ => Self::DEFAULT,
        }
    }

    /// Stats bucket label (`P1`..`P5`).
    #[must_use]
    pub fn label(self) -> String {
        format!("P{}", self.0)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Priority {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a short opaque item id (8 lowercase hex characters).
#[must_use]
pub fn generate_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// Caller-supplied fields for a new backlog item. Unset fields take defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewItem {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: Option<Status>,
    pub assignee: Option<String>,
    pub priority: Option<u8>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
}

/// A backlog item as projected from its markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub assignee: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

/// Field changes applied by [`BacklogItem::apply`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<u8>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<Status>,
}

impl ItemPatch {
    /// Reject out-of-domain values before anything is touched.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank or multi-line title, a
    /// multi-line assignee, a tag the markdown tag line cannot hold, or a bad
    /// priority.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(assignee) = &self.assignee {
            validate_single_line("assignee", assignee)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        if let Some(priority) = self.priority {
            Priority::new(priority)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn status_only(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("title", "must not be empty"));
    }
    validate_single_line("title", title)
}

fn validate_single_line(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().contains(['\n', '\r']) {
        return Err(ValidationError::new(field, "must be a single line"));
    }
    Ok(())
}

// Tags are stored as one comma-separated line.
fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    match tags.iter().find(|t| t.trim().contains([',', '\n', '\r'])) {
        Some(tag) => Err(ValidationError::new(
            "tags",
            format!("'{tag}' must not contain commas or line breaks"),
        )),
        None => Ok(()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BacklogItem {
    /// Build a new item from defaults plus caller overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank or multi-line title, a tag
    /// containing a comma, or a priority outside `1..=5`.
    pub fn create(new: NewItem, now: NaiveDateTime) -> Result<Self, ValidationError> {
        validate_title(&new.title)?;
        if let Some(assignee) = &new.assignee {
            validate_single_line("assignee", assignee)?;
        }
        validate_tags(&new.tags)?;
        let priority = new.priority.map_or(Ok(Priority::DEFAULT), Priority::new)?;
        let now = truncate_to_minute(now);
        let status = new.status.unwrap_or_default();

        Ok(Self {
            id: non_empty(new.id).unwrap_or_else(generate_id),
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            status,
            assignee: non_empty(new.assignee),
            priority,
            tags: clean_tags(new.tags),
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
            completed_at: (status == Status::Done).then_some(now),
        })
    }

    /// Apply a patch, bump `updated_at`, and describe what changed.
    ///
    /// Moving into `done` stamps `completed_at`; leaving `done` keeps it.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the patch fails
    /// [`ItemPatch::validate`]; the item is left untouched in that case.
    pub fn apply(
        &mut self,
        patch: ItemPatch,
        now: NaiveDateTime,
    ) -> Result<Vec<String>, ValidationError> {
        patch.validate()?;
        let now = truncate_to_minute(now);
        let mut changes = Vec::new();

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            changes.push(format!("title from '{}' to '{title}'", self.title));
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
            changes.push("description".to_string());
        }
        if let Some(assignee) = patch.assignee {
            let assignee = non_empty(Some(assignee));
            changes.push(format!(
                "assignee from '{}' to '{}'",
                self.assignee.as_deref().unwrap_or("none"),
                assignee.as_deref().unwrap_or("none")
            ));
            self.assignee = assignee;
        }
        if let Some(priority) = patch.priority {
            let priority = Priority::new(priority)?;
            changes.push(format!("priority from {} to {priority}", self.priority));
            self.priority = priority;
        }
        if let Some(tags) = patch.tags {
            self.tags = clean_tags(tags);
            changes.push("tags".to_string());
        }
        if let Some(due) = patch.due_date {
            changes.push(format!("due date to {}", due.format(dates::DATE_FORMAT)));
            self.due_date = Some(due);
        }
        if let Some(status) = patch.status {
            changes.push(format!("status from '{}' to '{status}'", self.status));
            if status == Status::Done && self.status != Status::Done {
                self.completed_at = Some(now);
            }
            self.status = status;
        }

        self.updated_at = now;
        Ok(changes)
    }

    /// Storage filename: `<id>.md`.
    #[must_use]
    pub fn filename(&self) -> String {
        filename_for(&self.id)
    }

    /// True when a due date is set, the item is still open, and `now` is past
    /// the start of the due day.
    #[must_use]
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match self.due_date {
            Some(due) if !self.status.is_closed() => now > dates::start_of_day(due),
            _ => false,
        }
    }

    /// True when the item is still open and more than `threshold_days` whole
    /// days have passed since the last update.
    #[must_use]
    pub fn is_stale(&self, now: NaiveDateTime, threshold_days: i64) -> bool {
        !self.status.is_closed() && self.days_since_update(now) > threshold_days
    }

    /// Whole days between `updated_at` and `now`.
    #[must_use]
    pub fn days_since_update(&self, now: NaiveDateTime) -> i64 {
        (now - self.updated_at).num_days()
    }

    /// Whole days past the due date, zero when there is none.
    #[must_use]
    pub fn days_overdue(&self, now: NaiveDateTime) -> i64 {
        self.due_date
            .map_or(0, |due| (now - dates::start_of_day(due)).num_days())
    }

    /// Text handed to the search index.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }
}

/// Storage filename for an item id.
#[must_use]
pub fn filename_for(id: &str) -> String {
    format!("{id}.{DOCUMENT_EXTENSION}")
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
