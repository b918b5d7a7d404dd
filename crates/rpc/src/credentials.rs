//! Per-tenant connection credentials.

use core::fmt;

use serde::Deserialize;

use crate::error::RpcError;

/// Everything needed to reach and log into one remote database.
///
/// Immutable and never shared across tenants. `Debug` redacts the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub url: String,
    #[serde(alias = "db", alias = "database")]
    pub namespace: String,
    pub username: String,
    #[serde(alias = "password", alias = "api_key")]
    secret: String,
}

impl Credentials {
    pub fn new(
        url: impl Into<String>,
        namespace: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            namespace: namespace.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }

    /// Full RPC endpoint for a path such as `/jsonrpc`.
    pub fn endpoint(&self, rpc_path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            rpc_path.trim_start_matches('/')
        )
    }

    /// Reject credential sets with blank fields before any network call.
    pub fn validate(&self) -> Result<(), RpcError> {
        let missing: Vec<&str> = [
            ("url", &self.url),
            ("namespace", &self.namespace),
            ("username", &self.username),
            ("secret", &self.secret),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            return Ok(());
        }
        Err(RpcError::Auth {
            namespace: self.namespace.clone(),
            username: self.username.clone(),
            reason: format!("incomplete credentials (missing {})", missing.join(", ")),
        })
    }

    /// Load from `<PREFIX>_URL`, `<PREFIX>_DB`, `<PREFIX>_USERNAME`, `<PREFIX>_PASSWORD`.
    ///
    /// Intended for operational tooling; request paths receive credentials from
    /// their configuration collaborator instead.
    pub fn from_env(prefix: &str) -> Result<Self, RpcError> {
        let read = |suffix: &str| {
            let key = format!("{prefix}_{suffix}");
            std::env::var(&key).map_err(|_| RpcError::Auth {
                namespace: String::new(),
                username: String::new(),
                reason: format!("environment variable {key} is not set"),
            })
        };
        let creds = Self::new(read("URL")?, read("DB")?, read("USERNAME")?, read("PASSWORD")?);
        creds.validate()?;
        Ok(creds)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_secret() {
        let c = Credentials::new("https://erp.example.com", "prod", "bot", "hunter2");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("prod"));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let c = Credentials::new("https://erp.example.com/", "prod", "bot", "x");
        assert_eq!(c.endpoint("/jsonrpc"), "https://erp.example.com/jsonrpc");
        assert_eq!(c.endpoint("jsonrpc"), "https://erp.example.com/jsonrpc");
    }

    #[test]
    fn blank_fields_fail_validation_without_leaking_secret() {
        let c = Credentials::new("https://erp.example.com", "prod", "", "s3cr3t");
        let err = c.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("username"));
        assert!(!msg.contains("s3cr3t"));
    }

    #[test]
    fn deserializes_with_aliases() {
        let c: Credentials = serde_json::from_value(serde_json::json!({
            "url": "https://erp.example.com",
            "db": "prod",
            "username": "bot",
            "password": "pw"
        }))
        .unwrap();
        assert_eq!(c.namespace, "prod");
        assert_eq!(c.secret(), "pw");
    }
}
