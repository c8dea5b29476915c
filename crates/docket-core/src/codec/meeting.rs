use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::dates::{format_timestamp, parse_timestamp, truncate_to_minute};
use crate::model::meeting::Meeting;

const DATE: &str = "**Date:**";
const PARTICIPANTS: &str = "**Participants:**";
const FOOTER_RULE: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Agenda,
    Notes,
    ActionItems,
    Footer,
}

impl Section {
    fn from_heading(line: &str) -> Self {
        if line.starts_with("## Agenda") {
            Self::Agenda
        } else if line.starts_with("## Notes") {
            Self::Notes
        } else if line.starts_with("## Action Items") {
            Self::ActionItems
        } else {
            Self::None
        }
    }
}

/// Render a meeting as markdown.
#[must_use]
pub fn encode(meeting: &Meeting) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", meeting.title);
    let _ = writeln!(out, "{DATE} {}", format_timestamp(meeting.date));
    let _ = writeln!(out, "{PARTICIPANTS} {}\n", meeting.participants.join(", "));

    if let Some(agenda) = &meeting.agenda {
        let _ = writeln!(out, "## Agenda\n{agenda}\n");
    }
    if let Some(notes) = &meeting.notes {
        let _ = writeln!(out, "## Notes\n{notes}\n");
    }
    if !meeting.action_items.is_empty() {
        out.push_str("## Action Items\n");
        for item in &meeting.action_items {
            let _ = writeln!(out, "- {item}");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{FOOTER_RULE}");
    let _ = writeln!(out, "*Created: {}*", format_timestamp(meeting.created_at));
    let _ = writeln!(out, "*Updated: {}*", format_timestamp(meeting.updated_at));
    out
}

/// Parse a meeting back from markdown; `id` is the filename stem.
///
/// Same scanner as the backlog codec: malformed timestamps fall back to
/// `now` and nothing here fails.
#[must_use]
pub fn decode(text: &str, id: &str, now: NaiveDateTime) -> Meeting {
    let now = truncate_to_minute(now);
    let mut title = String::new();
    let mut date = now;
    let mut participants = Vec::new();
    let mut agenda = String::new();
    let mut notes = String::new();
    let mut action_items = Vec::new();
    let mut created_at = now;
    let mut updated_at = now;

    let mut section = Section::None;

    for line in text.lines() {
        if line.starts_with("##") {
            section = Section::from_heading(line);
            continue;
        }
        if line.trim() == FOOTER_RULE {
            section = Section::Footer;
            continue;
        }

        match section {
            Section::Agenda => {
                agenda.push_str(line);
                agenda.push('\n');
            }
            Section::Notes => {
                notes.push_str(line);
                notes.push('\n');
            }
            Section::ActionItems => {
                if let Some(item) = line.strip_prefix("- ") {
                    let item = item.trim();
                    if !item.is_empty() {
                        action_items.push(item.to_string());
                    }
                }
            }
            Section::Footer => {
                if let Some(raw) = footer_value(line, "Created:") {
                    created_at = parse_timestamp(raw).unwrap_or(now);
                } else if let Some(raw) = footer_value(line, "Updated:") {
                    updated_at = parse_timestamp(raw).unwrap_or(now);
                }
            }
            Section::None => {
                if let Some(rest) = line.strip_prefix("# ") {
                    title = rest.trim().to_string();
                } else if let Some(rest) = line.strip_prefix(DATE) {
                    date = parse_timestamp(rest).unwrap_or(now);
                } else if let Some(rest) = line.strip_prefix(PARTICIPANTS) {
                    participants = rest
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect();
                }
            }
        }
    }

    Meeting {
        id: id.to_string(),
        title,
        date,
        participants,
        agenda: non_empty(&agenda),
        notes: non_empty(&notes),
        action_items,
        created_at,
        updated_at,
    }
}

fn footer_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.trim()
        .strip_prefix('*')
        .and_then(|rest| rest.strip_suffix('*'))
        .and_then(|rest| rest.strip_prefix(label))
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn sample() -> Meeting {
        Meeting {
            id: "2024-05-01-retro".into(),
            title: "Retro".into(),
            date: ts(1, 15),
            participants: vec!["Ari".into(), "Sam".into()],
            agenda: Some("1. Wins\n2. Misses".into()),
            notes: Some("Deploys were slow.".into()),
            action_items: vec!["Cache the build".into(), "Write runbook".into()],
            created_at: ts(1, 16),
            updated_at: ts(2, 9),
        }
    }

    #[test]
    fn roundtrips_all_fields() {
        let meeting = sample();
        let text = encode(&meeting);
        assert_eq!(decode(&text, &meeting.id, ts(9, 0)), meeting);
    }

    #[test]
    fn optional_sections_are_omitted() {
        let mut meeting = sample();
        meeting.agenda = None;
        meeting.notes = None;
        meeting.action_items.clear();
        let text = encode(&meeting);
        assert!(!text.contains("## Agenda"));
        assert!(!text.contains("## Notes"));
        assert!(!text.contains("## Action Items"));
        assert!(text.ends_with("*Updated: 2024-05-02 09:00*\n"));
        assert_eq!(decode(&text, &meeting.id, ts(9, 0)), meeting);
    }

    #[test]
    fn bad_date_falls_back_to_now() {
        let now = ts(7, 11);
        let meeting = decode("# Sync\n**Date:** soon\n", "x", now);
        assert_eq!(meeting.date, now);
        assert_eq!(meeting.created_at, now);
        assert!(meeting.participants.is_empty());
    }
}
