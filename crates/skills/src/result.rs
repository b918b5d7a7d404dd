use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use ledgerlens_core::{ErrorKind, Failure};
use ledgerlens_query::QueryError;
use ledgerlens_rpc::RpcError;

#[derive(Debug, Clone, Error)]
pub enum SkillError {
    #[error("integration `{0}` is not configured for this tenant")]
    MissingIntegration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown skill `{0}`")]
    UnknownSkill(String),

    #[error("skill `{0}` is already registered")]
    DuplicateSkill(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl SkillError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SkillError::InvalidInput(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SkillError::MissingIntegration(_) => ErrorKind::Auth,
            SkillError::InvalidInput(_) | SkillError::DuplicateSkill(_) => ErrorKind::Validation,
            SkillError::UnknownSkill(_) => ErrorKind::NotFound,
            SkillError::Internal(_) => ErrorKind::Api,
            SkillError::Rpc(e) => e.kind(),
            SkillError::Query(e) => e.kind(),
        }
    }

    pub fn to_failure(&self) -> Failure {
        let message = match self {
            SkillError::Rpc(e) => e.user_message(),
            other => other.to_string(),
        };
        Failure::new(self.kind(), message)
    }
}

/// Result of one skill invocation.
///
/// Serialises as `{"success": true, "data": ...}` or
/// `{"success": false, "error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillOutcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> SkillOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, SkillOutcome::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            SkillOutcome::Success(data) => Some(data),
            SkillOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SkillOutcome::Success(_) => None,
            SkillOutcome::Failure(f) => Some(f),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            SkillOutcome::Success(data) => Ok(data),
            SkillOutcome::Failure(f) => Err(f),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SkillOutcome<U> {
        match self {
            SkillOutcome::Success(data) => SkillOutcome::Success(f(data)),
            SkillOutcome::Failure(failure) => SkillOutcome::Failure(failure),
        }
    }
}

impl<T> From<Result<T, SkillError>> for SkillOutcome<T> {
    fn from(result: Result<T, SkillError>) -> Self {
        match result {
            Ok(data) => SkillOutcome::Success(data),
            Err(e) => SkillOutcome::Failure(e.to_failure()),
        }
    }
}

impl<T: Serialize> Serialize for SkillOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SkillOutcome", 2)?;
        match self {
            SkillOutcome::Success(data) => {
                s.serialize_field("success", &true)?;
                s.serialize_field("data", data)?;
            }
            SkillOutcome::Failure(failure) => {
                s.serialize_field("success", &false)?;
                s.serialize_field("error", failure)?;
            }
        }
        s.end()
    }
}
