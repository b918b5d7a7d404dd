//! Connectivity probe results.

use serde::Serialize;

use crate::error::RpcError;

/// Outcome of [`RpcClient::health_check`](crate::RpcClient::health_check).
///
/// Stages run in order; a failed stage leaves the later flags `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub endpoint: String,
    pub reachable: bool,
    pub authenticated: bool,
    pub readable: bool,
    pub server_version: Option<String>,
    pub message: String,
}

impl HealthReport {
    pub(crate) fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            reachable: false,
            authenticated: false,
            readable: false,
            server_version: None,
            message: String::new(),
        }
    }

    pub(crate) fn failed(mut self, stage: &str, error: &RpcError) -> Self {
        tracing::warn!(endpoint = %self.endpoint, stage, code = error.kind().code(), "health check failed");
        self.message = format!("{stage} check failed: {}", error.user_message());
        self
    }

    pub(crate) fn succeeded(mut self, username: &str, namespace: &str) -> Self {
        self.message = format!("connected to `{namespace}` as `{username}`");
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.reachable && self.authenticated && self.readable
    }
}
