use thiserror::Error;

use crate::core::validation::ValidationErrors;

/// Failures at the remote API boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401, the credential is missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("API URL '{0}' cannot have path segments")]
    BaseUrl(String),

    /// Refused locally, nothing was sent
    #[error("Invalid form: {0}")]
    Invalid(#[from] ValidationErrors),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failures of roster operations. None of them leave the roster or the
/// selection partially modified.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Failed to load participants: {0}")]
    LoadFailed(#[source] ApiError),

    #[error("Failed to {action} participant: {source}")]
    MutationFailed {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Bulk check-in failed: {0}")]
    BulkActionFailed(#[source] ApiError),

    #[error("Response for a previously viewed event was discarded")]
    Stale,

    #[error("A bulk check-in is already in progress")]
    Busy,

    #[error("Participant {0} already has an action in progress")]
    RowBusy(String),

    #[error("No participants selected")]
    EmptySelection,

    #[error("No participants to export")]
    NothingToExport,

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Participant {0} is already checked in")]
    AlreadyCheckedIn(String),

    #[error("No participant is being edited")]
    NotEditing,

    #[error("Deleting {0} requires confirmation")]
    ConfirmationRequired(String),

    #[error("No event is open")]
    NoEvent,
}
