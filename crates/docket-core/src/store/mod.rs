//! Content store: where markdown documents live and how writes are recorded.
//!
//! Paths are repository-relative and use `/` separators
//! (`backlogs/abc12345.md`). Every write returns the [`Revision`] it
//! produced.

pub mod git;
pub mod memory;

use std::fmt;
use std::io;

use serde::Serialize;

use crate::error::ErrorCode;
use crate::lock::LockError;
use crate::model::ARCHIVE_DIR;

pub use git::{GitIdentity, GitStore, HistoryEntry};
pub use memory::MemoryStore;

/// Opaque identifier of a recorded write (a commit hash for [`GitStore`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for terminal output.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("'{path}' does not exist")]
    NotFound { path: String },

    #[error("'{path}' is not a docket repository (no .git directory)")]
    NotInitialized { path: String },

    #[error("'{path}' escapes the repository")]
    InvalidPath { path: String },

    #[error("I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ItemNotFound,
            Self::NotInitialized { .. } => ErrorCode::NotInitialized,
            Self::InvalidPath { .. } => ErrorCode::InvalidField,
            Self::Io { .. } => ErrorCode::StoreWriteFailed,
            Self::Git { .. } => ErrorCode::GitCommandFailed,
            Self::Lock(err) => err.code(),
        }
    }

    pub(crate) fn io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_string(),
            }
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Persistence for markdown documents.
///
/// Implementations record one revision per write. `create` overwrites an
/// existing document; `update`, `read`, `delete` and `archive` fail with
/// [`StoreError::NotFound`] when the path is absent.
pub trait ContentStore {
    /// # Errors
    ///
    /// Fails when the document cannot be written or recorded.
    fn create(&self, path: &str, text: &str, message: &str) -> Result<Revision, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] when `path` is absent, otherwise as `create`.
    fn update(&self, path: &str, text: &str, message: &str) -> Result<Revision, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] when `path` is absent.
    fn read(&self, path: &str) -> Result<String, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] when `path` is absent.
    fn delete(&self, path: &str, message: &str) -> Result<Revision, StoreError>;

    /// File names (not paths) of the `.md` documents directly inside `dir`,
    /// sorted lexicographically. A missing directory lists as empty.
    ///
    /// # Errors
    ///
    /// Fails when the directory exists but cannot be read.
    fn list(&self, dir: &str) -> Result<Vec<String>, StoreError>;

    /// Move `path` to `archives/<YYYYmmdd_HHMMSS>_<name>` with the reason
    /// recorded as a leading HTML comment.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when `path` is absent.
    fn archive(&self, path: &str, reason: &str) -> Result<Revision, StoreError>;
}

/// Join a directory and file name into a store path.
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    format!("{dir}/{name}")
}

/// File name component of a store path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name without the `.md` extension.
#[must_use]
pub fn file_stem(name: &str) -> &str {
    let name = file_name(name);
    name.strip_suffix(".md").unwrap_or(name)
}

/// Target path and content of an archived copy.
#[must_use]
pub fn archived_copy(path: &str, content: &str, reason: &str, stamp: &str) -> (String, String) {
    (
        join(ARCHIVE_DIR, &format!("{stamp}_{}", file_name(path))),
        format!("<!-- Archived: {reason} -->\n{content}"),
    )
}

/// Strip the `<YYYYmmdd_HHMMSS>_` prefix an archived file name carries.
#[must_use]
pub fn unarchived_name(name: &str) -> &str {
    let bytes = name.as_bytes();
    let prefixed = bytes.len() > 16
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'_'
        && bytes[9..15].iter().all(u8::is_ascii_digit)
        && bytes[15] == b'_';
    if prefixed { &name[16..] } else { name }
}

/// Reject absolute paths and parent-directory components.
pub(crate) fn check_relative(path: &str) -> Result<(), StoreError> {
    let escapes = path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|part| part == ".." || part.is_empty());
    if escapes {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(())
}
