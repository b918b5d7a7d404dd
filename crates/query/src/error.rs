use thiserror::Error;

use ledgerlens_core::ErrorKind;

/// A request could not be built or a remote payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },
}

impl QueryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn malformed(what: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidRequest(_) => ErrorKind::Validation,
            QueryError::Malformed { .. } => ErrorKind::Api,
        }
    }
}
