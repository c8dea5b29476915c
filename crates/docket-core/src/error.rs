use std::fmt;

use crate::store::StoreError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ItemNotFound,
    InvalidEnumValue,
    InvalidQuery,
    InvalidField,
    StoreWriteFailed,
    GitCommandFailed,
    LockContention,
    SearchUnavailable,
    NotifyUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ItemNotFound => "E2001",
            Self::InvalidEnumValue => "E2002",
            Self::InvalidQuery => "E2003",
            Self::InvalidField => "E2004",
            Self::StoreWriteFailed => "E5001",
            Self::GitCommandFailed => "E5002",
            Self::LockContention => "E5003",
            Self::SearchUnavailable => "E6001",
            Self::NotifyUnavailable => "E6002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Repository not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Item not found",
            Self::InvalidEnumValue => "Invalid status value",
            Self::InvalidQuery => "Invalid query parameter",
            Self::InvalidField => "Invalid field value",
            Self::StoreWriteFailed => "Store write failed",
            Self::GitCommandFailed => "Git command failed",
            Self::LockContention => "Lock contention",
            Self::SearchUnavailable => "Search index unavailable",
            Self::NotifyUnavailable => "Notification channel unavailable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `dk init` to initialize the repository."),
            Self::ConfigParseError => Some("Fix syntax in the docket config.toml and retry."),
            Self::ItemNotFound => Some("Run `dk list` to see available item IDs."),
            Self::InvalidEnumValue => Some(
                "Use one of: todo, in_progress, review, done, blocked, cancelled.",
            ),
            Self::InvalidQuery => {
                Some("Dates are ISO 8601 (2024-05-01 or 2024-05-01T09:30); limit is 1..=100.")
            }
            Self::InvalidField => Some("Priority is 1 (highest) to 5; titles must be non-empty."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::GitCommandFailed => {
                Some("Verify `git` is installed and the repository is healthy.")
            }
            Self::LockContention => Some("Retry after the other `dk` process releases its lock."),
            Self::SearchUnavailable => Some("Run `dk reindex` to rebuild the search index."),
            Self::NotifyUnavailable => {
                Some("Check the webhook URLs in the [notify] config section.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A caller-supplied value is outside the accepted domain.
///
/// Raised before any store mutation; never produced while decoding stored
/// documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self.field {
            "status" => ErrorCode::InvalidEnumValue,
            "title" | "priority" | "due_date" | "tags" | "assignee" => ErrorCode::InvalidField,
            _ => ErrorCode::InvalidQuery,
        }
    }
}

/// Top-level error surfaced by the backlog and meeting services.
#[derive(Debug, thiserror::Error)]
pub enum DocketError {
    /// The referenced item does not exist in the content store.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Caller input rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The content store failed for a reason other than a missing path.
    #[error("store error: {0}")]
    Store(StoreError),

    /// A search was requested but no index is available or it failed.
    #[error("search index unavailable: {0}")]
    SearchUnavailable(String),

    /// A notification was requested but no channel is configured.
    #[error("notifications unavailable: {0}")]
    NotifyUnavailable(String),
}

impl DocketError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ItemNotFound,
            Self::Validation(err) => err.code(),
            Self::Store(err) => err.code(),
            Self::SearchUnavailable(_) => ErrorCode::SearchUnavailable,
            Self::NotifyUnavailable(_) => ErrorCode::NotifyUnavailable,
        }
    }

    /// Remediation hint for operators and agents.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.code()
            .hint()
            .unwrap_or_else(|| self.code().message())
            .to_string()
    }

    /// Lift a store error, naming the entity when the path is missing.
    pub(crate) fn from_store(kind: &'static str, id: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound {
                kind,
                id: id.to_string(),
            },
            other => Self::Store(other),
        }
    }
}
