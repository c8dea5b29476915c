//! Markdown layout of a backlog item.
//!
//! ```text
//! # <title>
//!
//! **ID:** <id>
//! **Status:** <status>
//! **Priority:** ⭐⭐⭐
//! **Assignee:** <assignee>        (omitted when unset)
//! **Due Date:** YYYY-MM-DD        (omitted when unset)
//! **Tags:** a, b                  (omitted when empty)
//!
//! ## Description
//! <body>
//!
//! ## Metadata
//! - Created: YYYY-MM-DD HH:MM
//! - Updated: YYYY-MM-DD HH:MM
//! - Completed: YYYY-MM-DD HH:MM   (omitted when unset)
//! ```

use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::dates::{self, format_timestamp, parse_timestamp, truncate_to_minute};
use crate::model::item::{BacklogItem, Priority, Status, generate_id};

const ID: &str = "**ID:**";
const STATUS: &str = "**Status:**";
const PRIORITY: &str = "**Priority:**";
const ASSIGNEE: &str = "**Assignee:**";
const DUE_DATE: &str = "**Due Date:**";
const TAGS: &str = "**Tags:**";

const CREATED: &str = "Created:";
const UPDATED: &str = "Updated:";
const COMPLETED: &str = "Completed:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Description,
    Metadata,
}

impl Section {
    fn from_heading(line: &str) -> Self {
        if line.starts_with("## Description") {
            Self::Description
        } else if line.starts_with("## Metadata") {
            Self::Metadata
        } else {
            Self::None
        }
    }
}

/// Render an item as markdown.
#[must_use]
pub fn encode(item: &BacklogItem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", item.title);
    let _ = writeln!(out, "{ID} {}", item.id);
    let _ = writeln!(out, "{STATUS} {}", item.status);
    let _ = writeln!(
        out,
        "{PRIORITY} {}",
        Priority::GLYPH
            .to_string()
            .repeat(item.priority.glyph_count())
    );
    if let Some(assignee) = &item.assignee {
        let _ = writeln!(out, "{ASSIGNEE} {assignee}");
    }
    if let Some(due) = item.due_date {
        let _ = writeln!(out, "{DUE_DATE} {}", due.format(dates::DATE_FORMAT));
    }
    if !item.tags.is_empty() {
        let _ = writeln!(out, "{TAGS} {}", item.tags.join(", "));
    }

    let _ = writeln!(out, "\n## Description\n{}\n", item.description);

    out.push_str("## Metadata\n");
    let _ = writeln!(out, "- {CREATED} {}", format_timestamp(item.created_at));
    let _ = writeln!(out, "- {UPDATED} {}", format_timestamp(item.updated_at));
    if let Some(completed) = item.completed_at {
        let _ = writeln!(out, "- {COMPLETED} {}", format_timestamp(completed));
    }
    out
}

/// Parse an item back from markdown. Never fails: anything missing or
/// malformed falls back to a default.
///
/// `id_hint` (normally the filename stem) is used when the document carries
/// no `**ID:**` line; a fresh id is generated when both are absent.
#[must_use]
pub fn decode(text: &str, id_hint: Option<&str>, now: NaiveDateTime) -> BacklogItem {
    let now = truncate_to_minute(now);
    let mut title = String::new();
    let mut id: Option<String> = None;
    let mut status = Status::Todo;
    let mut priority = Priority::DEFAULT;
    let mut assignee = None;
    let mut due_date = None;
    let mut tags = Vec::new();
    let mut description = String::new();
    let mut created_at = now;
    let mut updated_at = now;
    let mut completed_at = None;

    let mut section = Section::None;

    for line in text.lines() {
        if line.starts_with("##") {
            section = Section::from_heading(line);
            continue;
        }

        if section == Section::Description {
            description.push_str(line);
            description.push('\n');
            continue;
        }

        if let Some(rest) = line.strip_prefix("# ") {
            title = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(ID) {
            id = Some(rest.trim().to_string()).filter(|v| !v.is_empty());
        } else if let Some(rest) = line.strip_prefix(STATUS) {
            status = Status::parse_lenient(rest);
        } else if let Some(rest) = line.strip_prefix(PRIORITY) {
            priority = Priority::from_glyph_count(rest.matches(Priority::GLYPH).count());
        } else if let Some(rest) = line.strip_prefix(ASSIGNEE) {
            assignee = Some(rest.trim().to_string()).filter(|v| !v.is_empty());
        } else if let Some(rest) = line.strip_prefix(DUE_DATE) {
            due_date = dates::parse_date(rest);
        } else if let Some(rest) = line.strip_prefix(TAGS) {
            tags = rest
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        } else if section == Section::Metadata {
            if let Some(raw) = metadata_value(line, CREATED) {
                created_at = parse_timestamp(raw).unwrap_or(now);
            } else if let Some(raw) = metadata_value(line, UPDATED) {
                updated_at = parse_timestamp(raw).unwrap_or(now);
            } else if let Some(raw) = metadata_value(line, COMPLETED) {
                completed_at = parse_timestamp(raw);
            }
        }
    }

    BacklogItem {
        id: id
            .or_else(|| id_hint.map(str::to_string))
            .unwrap_or_else(generate_id),
        title,
        description: description.trim().to_string(),
        status,
        assignee,
        priority,
        tags,
        due_date,
        created_at,
        updated_at,
        completed_at,
    }
}

fn metadata_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.trim_start()
        .strip_prefix("- ")
        .and_then(|rest| rest.trim_start().strip_prefix(label))
}
