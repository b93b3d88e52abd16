use std::fmt;

use docwatch_core::{OwnerId, Token, TokenError};

use crate::store::StoreError;

/// Why a page check could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode { encoding: String },
    /// The cell selector could not be built.
    Scan,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode { encoding } => write!(f, "could not decode body as {encoding}"),
            FailureKind::Scan => write!(f, "invalid cell selector"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Errors surfaced by the supervisor to its callers.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("page check failed: {0}")]
    TransientFetch(#[from] FetchError),
    #[error("persistence failed: {0}")]
    Persistence(#[source] StoreError),
    #[error("{owner} is already tracking {token}")]
    Duplicate { owner: OwnerId, token: Token },
    #[error("{owner} has no live watch for {token}")]
    NotFound { owner: OwnerId, token: Token },
    #[error("invalid tracking number: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("supervisor is shutting down")]
    ShuttingDown,
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { owner, token } => TrackerError::Duplicate { owner, token },
            other => TrackerError::Persistence(other),
        }
    }
}
