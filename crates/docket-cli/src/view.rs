//! Human renderings of backlog items and meetings.

use std::io::{self, Write};

use docket_core::dates::{DATE_FORMAT, format_timestamp};
use docket_core::model::{BacklogItem, Meeting};

use crate::output::{pretty_kv, pretty_rule, pretty_section};

fn due(item: &BacklogItem) -> String {
    item.due_date
        .map_or_else(|| "-".to_string(), |d| d.format(DATE_FORMAT).to_string())
}

/// Tab-separated row: id, status, priority, assignee, due, title.
pub fn item_row(w: &mut dyn Write, item: &BacklogItem, overdue: bool) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}{}\t{}",
        item.id,
        item.status,
        item.priority.label(),
        item.assignee.as_deref().unwrap_or("-"),
        due(item),
        if overdue { "!" } else { "" },
        item.title
    )
}

/// One-line summary used in pretty listings.
pub fn item_line(w: &mut dyn Write, item: &BacklogItem, overdue: bool) -> io::Result<()> {
    let flag = if overdue { "  ⚠ overdue" } else { "" };
    writeln!(
        w,
        "{}  {:<11} {}  {}{flag}",
        item.id,
        item.status.as_str(),
        item.priority.label(),
        item.title
    )
}

pub fn item_pretty(w: &mut dyn Write, item: &BacklogItem, overdue: bool) -> io::Result<()> {
    pretty_section(w, &item.title)?;
    pretty_kv(w, "ID", &item.id)?;
    pretty_kv(w, "Status", item.status.as_str())?;
    pretty_kv(
        w,
        "Priority",
        format!("{} {}", item.priority.label(), "⭐".repeat(item.priority.glyph_count())),
    )?;
    pretty_kv(w, "Assignee", item.assignee.as_deref().unwrap_or("-"))?;
    let due_text = if overdue {
        format!("{} (overdue)", due(item))
    } else {
        due(item)
    };
    pretty_kv(w, "Due", due_text)?;
    if !item.tags.is_empty() {
        pretty_kv(w, "Tags", item.tags.join(", "))?;
    }
    pretty_kv(w, "Created", format_timestamp(item.created_at))?;
    pretty_kv(w, "Updated", format_timestamp(item.updated_at))?;
    if let Some(completed) = item.completed_at {
        pretty_kv(w, "Completed", format_timestamp(completed))?;
    }
    if !item.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", item.description)?;
    }
    Ok(())
}

pub fn meeting_row(w: &mut dyn Write, meeting: &Meeting) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        meeting.id,
        format_timestamp(meeting.date),
        meeting.participants.join(","),
        meeting.title
    )
}

pub fn meeting_pretty(w: &mut dyn Write, meeting: &Meeting) -> io::Result<()> {
    pretty_section(w, &meeting.title)?;
    pretty_kv(w, "ID", &meeting.id)?;
    pretty_kv(w, "Date", format_timestamp(meeting.date))?;
    pretty_kv(w, "People", meeting.participants.join(", "))?;
    for (heading, body) in [("Agenda", &meeting.agenda), ("Notes", &meeting.notes)] {
        if let Some(body) = body {
            writeln!(w)?;
            writeln!(w, "{heading}")?;
            writeln!(w, "{body}")?;
        }
    }
    if !meeting.action_items.is_empty() {
        writeln!(w)?;
        writeln!(w, "Action items")?;
        for action in &meeting.action_items {
            writeln!(w, "  - {action}")?;
        }
    }
    pretty_rule(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use docket_core::model::NewItem;

    fn item() -> BacklogItem {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap();
        BacklogItem::create(
            NewItem {
                id: Some("abc12345".into()),
                title: "Fix login".into(),
                priority: Some(2),
                due_date: NaiveDate::from_ymd_opt(2024, 4, 30),
                ..NewItem::default()
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn row_is_tab_separated() {
        let mut buf = Vec::new();
        item_row(&mut buf, &item(), true).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert_eq!(line, "abc12345\ttodo\tP2\t-\t2024-04-30!\tFix login\n");
    }

    #[test]
    fn pretty_marks_overdue() {
        let mut buf = Vec::new();
        item_pretty(&mut buf, &item(), true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("2024-04-30 (overdue)"));
        assert!(text.contains("P2 ⭐⭐⭐⭐"));
    }
}
