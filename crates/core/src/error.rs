//! Failure taxonomy.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stable classification of every failure a caller can observe.
///
/// The routing layer branches on [`ErrorKind::code`]; the wire strings never
/// change once published.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing or invalid credentials, or identity establishment failed.
    #[serde(rename = "AUTH_ERROR")]
    Auth,

    /// Transport failure that exhausted retries, or a generic remote fault.
    #[serde(rename = "API_ERROR")]
    Api,

    /// The remote identity lacks permission for the requested read.
    AccessDenied,

    /// Caller input was rejected before any remote call.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,

    /// The referenced entity does not exist.
    NotFound,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "AUTH_ERROR",
            ErrorKind::Api => "API_ERROR",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified failure with a message that is safe to show to end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub code: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Failure {}
