use shared::error::ValidationError;
use thiserror::Error;

/// Transport errors are kept as messages so the type stays `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("fetch panicked before producing a result")]
    Panicked,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FetchError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        FetchError::Network(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        FetchError::Decode(err.to_string())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScrollError {
    #[error("scroll listener is already attached to this controller")]
    AlreadyAttached,
}
