//! Client configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Transport-level settings shared by every client built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Path of the JSON-RPC endpoint relative to the server URL.
    pub rpc_path: String,
    /// Per-request timeout enforced by the HTTP transport.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_path: "/jsonrpc".to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_rpc_path(mut self, path: impl Into<String>) -> Self {
        self.rpc_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Defaults overridden by `LEDGERLENS_RPC_PATH`, `LEDGERLENS_RPC_TIMEOUT_SECS`
    /// and `LEDGERLENS_RPC_MAX_ATTEMPTS`. Malformed values are logged and ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(path) = std::env::var("LEDGERLENS_RPC_PATH") {
            if !path.trim().is_empty() {
                cfg.rpc_path = path;
            }
        }

        if let Some(secs) = env_number::<u64>("LEDGERLENS_RPC_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(attempts) = env_number::<u32>("LEDGERLENS_RPC_MAX_ATTEMPTS") {
            cfg.retry.max_attempts = attempts.max(1);
        }

        cfg
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring malformed numeric setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.rpc_path, "/jsonrpc");
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.retry, RetryPolicy::default());
    }

    #[test]
    fn builders_override() {
        let cfg = ClientConfig::default()
            .with_rpc_path("/rpc")
            .with_timeout(Duration::from_secs(5))
            .with_retry(RetryPolicy::no_retry());
        assert_eq!(cfg.rpc_path, "/rpc");
        assert_eq!(cfg.retry.max_attempts, 1);
    }
}
