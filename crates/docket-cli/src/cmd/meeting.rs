//! `dk meeting`: record and browse meetings.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Args, Subcommand};
use docket_core::dates::format_timestamp;
use docket_core::model::{Meeting, NewMeeting};
use docket_core::service::MeetingService;

use crate::app::{self, App};
use crate::cmd::parse_when;
use crate::output::{render, render_mode};
use crate::view::{meeting_pretty, meeting_row};

#[derive(Subcommand, Debug)]
pub enum MeetingCommand {
    /// Record a new meeting.
    Create(MeetingCreateArgs),
    /// List meetings, newest first.
    List,
    /// Show one meeting.
    Show(MeetingShowArgs),
}

#[derive(Args, Debug)]
pub struct MeetingCreateArgs {
    #[arg(short, long)]
    pub title: String,

    /// When it took place (YYYY-MM-DD or YYYY-MM-DDTHH:MM); defaults to now.
    #[arg(short, long, value_parser = parse_when)]
    pub date: Option<NaiveDateTime>,

    /// Participants (comma-separated or repeated).
    #[arg(short, long = "participant", value_delimiter = ',')]
    pub participants: Vec<String>,

    #[arg(long)]
    pub agenda: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Action item; repeat for several.
    #[arg(long = "action")]
    pub actions: Vec<String>,
}

impl MeetingCreateArgs {
    fn to_new_meeting(&self) -> NewMeeting {
        NewMeeting {
            title: self.title.clone(),
            date: self.date,
            participants: self.participants.clone(),
            agenda: self.agenda.clone(),
            notes: self.notes.clone(),
            action_items: self.actions.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct MeetingShowArgs {
    /// Meeting id (the file stem, with or without `.md`).
    pub id: String,
}

fn write_rows(meetings: &[Meeting], w: &mut dyn Write) -> std::io::Result<()> {
    for meeting in meetings {
        meeting_row(w, meeting)?;
    }
    Ok(())
}

fn write_list_pretty(meetings: &[Meeting], w: &mut dyn Write) -> std::io::Result<()> {
    if meetings.is_empty() {
        return writeln!(w, "No meetings recorded");
    }
    for meeting in meetings {
        writeln!(
            w,
            "{}  {}  ({} people)",
            format_timestamp(meeting.date),
            meeting.title,
            meeting.participants.len()
        )?;
        writeln!(w, "  {}", meeting.id)?;
    }
    Ok(())
}

pub fn run_meeting(command: &MeetingCommand, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let service = MeetingService::new(&store);
    match command {
        MeetingCommand::Create(args) => {
            let created = service.create(args.to_new_meeting(), app::now())?;
            render(app.output, &created, |c, w| {
                writeln!(w, "✓ Recorded meeting {} at {}", c.record.title, c.file_path)
            })
        }
        MeetingCommand::List => {
            let meetings = service.list(app::now())?;
            render_mode(app.output, meetings.as_slice(), write_rows, write_list_pretty)
        }
        MeetingCommand::Show(args) => {
            let meeting = service.get(&args.id, app::now())?;
            render_mode(
                app.output,
                &meeting,
                |m, w| meeting_row(w, m),
                |m, w| meeting_pretty(w, m),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: MeetingCommand,
    }

    #[test]
    fn create_collects_people_and_actions() {
        let w = Wrapper::parse_from([
            "test",
            "create",
            "--title",
            "Sprint Planning",
            "--date",
            "2024-05-15",
            "-p",
            "ana,bo",
            "--action",
            "ship it",
            "--action",
            "write docs",
        ]);
        let MeetingCommand::Create(args) = w.command else {
            panic!("expected create");
        };
        let new = args.to_new_meeting();
        assert_eq!(new.participants, ["ana", "bo"]);
        assert_eq!(new.action_items, ["ship it", "write docs"]);
        assert_eq!(
            new.date,
            NaiveDate::from_ymd_opt(2024, 5, 15).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
    }

    #[test]
    fn show_requires_an_id() {
        assert!(Wrapper::try_parse_from(["test", "show"]).is_err());
    }
}
