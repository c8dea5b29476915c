//! Markdown codecs for stored documents.
//!
//! Decoding is a single top-to-bottom scan with an explicit section state.
//! It never fails: malformed values fall back to defaults so a hand-edited
//! file still loads.

pub mod backlog;
pub mod meeting;

pub use backlog::{decode, encode};
