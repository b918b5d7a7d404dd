//! Client error model and fault classification.

use thiserror::Error;

use ledgerlens_core::{ErrorKind, Failure};
use ledgerlens_query::QueryError;

use crate::protocol::RemoteFault;

/// Failure of a remote call, already classified.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Identity could not be established. Never carries the secret.
    #[error("authentication failed for user `{username}` on database `{namespace}`: {reason}")]
    Auth {
        namespace: String,
        username: String,
        reason: String,
    },

    /// Well-formed application error from the remote system.
    #[error("{kind} from remote: {message}")]
    Remote {
        kind: ErrorKind,
        model: Option<String>,
        fault_name: Option<String>,
        message: String,
    },

    /// Non-success HTTP status that is not worth retrying.
    #[error("HTTP {status} calling {service}.{method}")]
    Http {
        status: u16,
        service: String,
        method: String,
    },

    /// Retries were exhausted or the failure was not retryable.
    #[error("transport failure after {attempts} attempt(s): {reason}")]
    Transport { attempts: u32, reason: String },

    #[error("malformed reply: {0}")]
    Malformed(String),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::Auth { .. } => ErrorKind::Auth,
            RpcError::Remote { kind, .. } => *kind,
            RpcError::Http { status, .. } => status_kind(*status),
            RpcError::Transport { .. } | RpcError::Malformed(_) => ErrorKind::Api,
            RpcError::Query(e) => e.kind(),
        }
    }

    /// Build a classified error from a remote fault.
    pub fn from_fault(fault: &RemoteFault, model: Option<&str>) -> Self {
        RpcError::Remote {
            kind: classify_fault(fault),
            model: model.map(str::to_string),
            fault_name: fault.name.clone(),
            message: fault.best_message().to_string(),
        }
    }

    /// Message safe to show to end users, with guidance where one exists.
    pub fn user_message(&self) -> String {
        match self {
            RpcError::Remote {
                kind: ErrorKind::AccessDenied,
                model,
                message,
                ..
            } => match model {
                Some(m) => format!(
                    "The ERP user lacks permission to read `{m}` ({message}). Ask an administrator to grant read access to this model."
                ),
                None => format!(
                    "The ERP user lacks the required permission ({message}). Ask an administrator to review its access rights."
                ),
            },
            RpcError::Transport { attempts, .. } => format!(
                "The ERP server could not be reached after {attempts} attempt(s). Please try again shortly."
            ),
            other => other.to_string(),
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure::new(self.kind(), self.user_message())
    }
}

/// Map a remote exception type to an error kind.
pub fn classify_fault(fault: &RemoteFault) -> ErrorKind {
    match fault.short_name() {
        Some("AccessError" | "AccessDenied") => ErrorKind::AccessDenied,
        Some("MissingError" | "KeyError") => ErrorKind::NotFound,
        Some("ValidationError" | "UserError") => ErrorKind::Validation,
        _ => ErrorKind::Api,
    }
}

/// Whether an HTTP status signals a transient condition.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 502
}

fn status_kind(status: u16) -> ErrorKind {
    match status {
        401 => ErrorKind::Auth,
        403 => ErrorKind::AccessDenied,
        404 => ErrorKind::NotFound,
        _ => ErrorKind::Api,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(name: &str) -> RemoteFault {
        RemoteFault {
            code: Some(200),
            message: "Odoo Server Error".into(),
            name: Some(name.into()),
            detail: Some("details".into()),
        }
    }

    #[test]
    fn classifies_by_exception_type() {
        assert_eq!(classify_fault(&fault("odoo.exceptions.AccessError")), ErrorKind::AccessDenied);
        assert_eq!(classify_fault(&fault("odoo.exceptions.MissingError")), ErrorKind::NotFound);
        assert_eq!(classify_fault(&fault("builtins.KeyError")), ErrorKind::NotFound);
        assert_eq!(classify_fault(&fault("odoo.exceptions.UserError")), ErrorKind::Validation);
        assert_eq!(classify_fault(&fault("builtins.TypeError")), ErrorKind::Api);
    }

    #[test]
    fn message_text_does_not_drive_classification() {
        let f = RemoteFault {
            code: None,
            message: "access denied".into(),
            name: None,
            detail: None,
        };
        assert_eq!(classify_fault(&f), ErrorKind::Api);

        let missing_text = RemoteFault {
            code: Some(200),
            message: "Odoo Server Error".into(),
            name: Some("builtins.ValueError".into()),
            detail: Some("Object res.partner(42,) doesn't exist".into()),
        };
        assert_eq!(classify_fault(&missing_text), ErrorKind::Api);
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(502));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(500));
        assert!(!is_retryable_status(403));
    }

    #[test]
    fn http_status_kinds() {
        let e = |status| RpcError::Http {
            status,
            service: "object".into(),
            method: "execute_kw".into(),
        };
        assert_eq!(e(401).kind(), ErrorKind::Auth);
        assert_eq!(e(403).kind(), ErrorKind::AccessDenied);
        assert_eq!(e(404).kind(), ErrorKind::NotFound);
        assert_eq!(e(500).kind(), ErrorKind::Api);
    }

    #[test]
    fn access_denied_message_names_model_and_gives_guidance() {
        let err = RpcError::from_fault(&fault("odoo.exceptions.AccessError"), Some("account.move"));
        let failure = err.to_failure();
        assert_eq!(failure.code, ErrorKind::AccessDenied);
        assert!(failure.message.contains("account.move"));
        assert!(failure.message.contains("administrator"));
    }
}
