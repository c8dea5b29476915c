//! Entities persisted as markdown documents.

pub mod item;
pub mod meeting;

pub use item::{BacklogItem, ItemPatch, NewItem, ParseEnumError, Priority, Status};
pub use meeting::{Meeting, NewMeeting};

/// Repository-relative directory holding backlog documents.
pub const BACKLOG_DIR: &str = "backlogs";

/// Repository-relative directory holding meeting documents.
pub const MEETING_DIR: &str = "meetings";

/// Repository-relative directory holding archived documents.
pub const ARCHIVE_DIR: &str = "archives";
