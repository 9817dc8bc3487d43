use std::fmt;

use tracker_core::{Generation, Origin, Record, RecordId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    RecordsFetched {
        generation: Generation,
        result: Result<Vec<Record>, StoreError>,
    },
    RecordCreated {
        origin: Origin,
        result: Result<RecordId, StoreError>,
    },
    RecordUpdated {
        id: RecordId,
        origin: Origin,
        result: Result<(), StoreError>,
    },
    RecordDeleted {
        id: RecordId,
        origin: Origin,
        result: Result<(), StoreError>,
    },
    /// Coalesced change notification for the subscribed user.
    RemoteChanged,
    SubscriptionFailed(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: FailureKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidConfig,
    Network,
    Timeout,
    HttpStatus(u16),
    Decode,
    NotFound,
    /// Store or feed refused the call (injected failure, missing feed).
    Unavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidConfig => write!(f, "invalid store configuration"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Unavailable => write!(f, "unavailable"),
        }
    }
}
