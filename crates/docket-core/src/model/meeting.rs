use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dates::truncate_to_minute;
use crate::error::ValidationError;
use crate::model::item::DOCUMENT_EXTENSION;

const SLUG_MAX_CHARS: usize = 50;

/// Meeting notes. The id is the filename stem, so it is only known once
/// the date and title are fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub date: NaiveDateTime,
    pub participants: Vec<String>,
    pub agenda: Option<String>,
    pub notes: Option<String>,
    pub action_items: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Caller-supplied fields for a new meeting.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewMeeting {
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub participants: Vec<String>,
    pub agenda: Option<String>,
    pub notes: Option<String>,
    pub action_items: Vec<String>,
}

impl Meeting {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the title is blank.
    pub fn create(new: NewMeeting, now: NaiveDateTime) -> Result<Self, ValidationError> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::new("title", "must not be empty"));
        }
        let now = truncate_to_minute(now);
        let date = truncate_to_minute(new.date.unwrap_or(now));

        let mut meeting = Self {
            id: String::new(),
            title,
            date,
            participants: clean_list(new.participants),
            agenda: new.agenda.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            notes: new.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            action_items: clean_list(new.action_items),
            created_at: now,
            updated_at: now,
        };
        meeting.id = meeting.stem();
        Ok(meeting)
    }

    /// `<YYYY-MM-DD>-<slug>.md`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{}.{DOCUMENT_EXTENSION}", self.stem())
    }

    fn stem(&self) -> String {
        format!("{}-{}", self.date.format("%Y-%m-%d"), slug(&self.title))
    }
}

/// Lower-case the title, turn spaces into hyphens, drop forward slashes,
/// and keep at most 50 characters.
#[must_use]
pub fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| *c != '/')
        .map(|c| if c == ' ' { '-' } else { c })
        .take(SLUG_MAX_CHARS)
        .collect()
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Sort key for listings: newest meeting first.
#[must_use]
pub fn newest_first(a: &Meeting, b: &Meeting) -> std::cmp::Ordering {
    b.date.cmp(&a.date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(h, m, 30))
            .unwrap()
    }

    #[test]
    fn filename_uses_date_and_slug() {
        let meeting = Meeting::create(
            NewMeeting {
                title: "Sprint Planning / Q2".into(),
                ..NewMeeting::default()
            },
            at(10, 0),
        )
        .unwrap();
        assert_eq!(meeting.filename(), "2024-05-01-sprint-planning--q2.md");
        assert_eq!(meeting.id, "2024-05-01-sprint-planning--q2");
        assert_eq!(meeting.created_at.format("%S").to_string(), "00");
    }

    #[test]
    fn slug_is_truncated_by_characters() {
        let long = "é".repeat(80);
        assert_eq!(slug(&long).chars().count(), 50);
    }

    #[test]
    fn same_day_same_title_collide() {
        let a = Meeting::create(
            NewMeeting {
                title: "Standup".into(),
                date: Some(at(9, 0)),
                ..NewMeeting::default()
            },
            at(9, 0),
        )
        .unwrap();
        let b = Meeting::create(
            NewMeeting {
                title: "Standup".into(),
                date: Some(at(17, 0)),
                ..NewMeeting::default()
            },
            at(17, 0),
        )
        .unwrap();
        assert_eq!(a.filename(), b.filename());
    }

    #[test]
    fn blank_title_rejected() {
        assert!(Meeting::create(NewMeeting::default(), at(9, 0)).is_err());
    }
}
