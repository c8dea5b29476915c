pub mod completions;
pub mod config;
pub mod create;
pub mod delete;
pub mod init;
pub mod jobs;
pub mod list;
pub mod meeting;
pub mod report;
pub mod search;
pub mod show;
pub mod sync;
pub mod update;

use chrono::{NaiveDate, NaiveDateTime};
use docket_core::ValidationError;
use docket_core::dates;
use docket_core::model::Status;

pub fn parse_status(raw: &str) -> Result<Status, String> {
    raw.parse::<Status>()
        .map_err(|e| ValidationError::from(e).to_string())
}

pub fn parse_due(raw: &str) -> Result<NaiveDate, String> {
    dates::parse_due_date(raw).map_err(|e| e.to_string())
}

pub fn parse_when(raw: &str) -> Result<NaiveDateTime, String> {
    dates::parse_iso("date", raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parser_reports_choices() {
        assert_eq!(parse_status("in_progress"), Ok(Status::InProgress));
        let err = parse_status("started").unwrap_err();
        assert!(err.contains("in_progress"), "{err}");
    }

    #[test]
    fn due_parser_accepts_plain_dates() {
        assert_eq!(parse_due("2024-06-01"), Ok(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(parse_due("June 1st").is_err());
    }
}
