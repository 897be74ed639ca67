//! Error kinds reported by this crate
//!
//! None of them is fatal: every operation can simply be retried by the user.

use thiserror::Error;

use crate::task::TaskId;

/// A failure to talk to a task or auth service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("the session token was rejected")]
    Unauthorized,

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("{0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Only returned by mocked services
    #[error("mocked failure: {0}")]
    Mocked(String),
}

/// The errors an application using this crate has to deal with
#[derive(Debug, Error)]
pub enum Error {
    /// The task list could not be retrieved. The previous view (if any) is still valid
    #[error("failed to fetch tasks: {0}")]
    FetchFailed(#[source] ServiceError),

    /// The task keeps its previous completion state
    #[error("failed to update task {id}: {source}")]
    UpdateFailed {
        id: TaskId,
        #[source]
        source: ServiceError,
    },

    #[error("failed to add task: {0}")]
    CreateFailed(#[source] ServiceError),

    #[error("authentication failed: {0}")]
    AuthFailed(#[source] ServiceError),

    /// Rejected before anything was sent to the server
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Rejected before anything was sent to the server
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Which part of a task record could not be understood
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedField {
    Due,
    Priority,
}

/// A task record the projection could only partially understand.
///
/// This is not a failure: the task is still displayed, using the raw value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("task {id} has a malformed {field:?} value {raw:?}")]
pub struct MalformedTask {
    pub id: TaskId,
    pub field: MalformedField,
    pub raw: String,
}

/// Error returned while parsing a priority
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);
