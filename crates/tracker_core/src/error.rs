use thiserror::Error;

/// Input rejected before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("job title is required")]
    EmptyTitle,
    #[error("company is required")]
    EmptyCompany,
    #[error("unknown status: {0:?}")]
    InvalidStatus(String),
    #[error("invalid job url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no edit session is active")]
    Inactive,
    #[error("an edit session is already active")]
    AlreadyActive,
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Remote operation that a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Displayable failure kept as the last error of the application state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to {} job: {message}", .operation.as_str())]
    Remote {
        operation: Operation,
        message: String,
    },
    #[error("live updates unavailable: {0}")]
    Subscription(String),
    #[error("user not authenticated")]
    NotSignedIn,
}

impl TrackerError {
    pub fn remote(operation: Operation, message: impl Into<String>) -> Self {
        Self::Remote {
            operation,
            message: message.into(),
        }
    }
}
