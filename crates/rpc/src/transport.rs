//! Transports: how an encoded request reaches the server.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Raw HTTP outcome. `body` is `Value::Null` when the payload was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// `200` carrying a JSON-RPC `result`.
    pub fn rpc_result(result: Value) -> Self {
        Self::new(200, json!({"jsonrpc": "2.0", "id": null, "result": result}))
    }

    /// `200` carrying a JSON-RPC `error` with a typed `data.name`.
    pub fn rpc_error(name: &str, message: &str) -> Self {
        Self::new(
            200,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {
                    "code": 200,
                    "message": "Odoo Server Error",
                    "data": {"name": name, "message": message}
                }
            }),
        )
    }

    /// A bare HTTP status with no JSON body.
    pub fn status(status: u16) -> Self {
        Self::new(status, Value::Null)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure before any HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("request could not be sent: {0}")]
    Request(String),
}

impl TransportError {
    /// Connection-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout)
    }
}

/// Sends one JSON body to one URL. Stateless with respect to tenants.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, TransportError>;
}

/// Production transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() || e.is_request() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, TransportError> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(map_reqwest_error)?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(TransportResponse { status, body })
    }
}

/// A request observed by [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Value,
}

impl RecordedRequest {
    pub fn service(&self) -> Option<&str> {
        self.body.pointer("/params/service").and_then(Value::as_str)
    }

    pub fn method(&self) -> Option<&str> {
        self.body.pointer("/params/method").and_then(Value::as_str)
    }

    pub fn args(&self) -> &[Value] {
        self.body
            .pointer("/params/args")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Model of an `execute_kw` call.
    pub fn model(&self) -> Option<&str> {
        self.args().get(3).and_then(Value::as_str)
    }

    /// Model method of an `execute_kw` call (`search_read`, `read_group`, ...).
    pub fn model_method(&self) -> Option<&str> {
        self.args().get(4).and_then(Value::as_str)
    }

    /// Positional arguments of an `execute_kw` call.
    pub fn model_args(&self) -> &[Value] {
        self.args()
            .get(5)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keyword arguments of an `execute_kw` call.
    pub fn kwargs(&self) -> Option<&Map<String, Value>> {
        self.args().get(6).and_then(Value::as_object)
    }

    pub fn is_login(&self) -> bool {
        self.service() == Some("common") && self.method() == Some("login")
    }
}

type Handler = dyn Fn(&RecordedRequest) -> Result<TransportResponse, TransportError> + Send + Sync;

/// In-memory transport for tests/dev: answers through a handler and records
/// every request it sees.
pub struct InMemoryTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl InMemoryTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        match self.requests.lock() {
            Ok(r) => r.clone(),
            Err(_) => vec![],
        }
    }

    pub fn count_where(&self, pred: impl Fn(&RecordedRequest) -> bool) -> usize {
        self.requests().iter().filter(|r| pred(r)).count()
    }

    pub fn login_count(&self) -> usize {
        self.count_where(RecordedRequest::is_login)
    }
}

impl core::fmt::Debug for InMemoryTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryTransport")
            .field("requests", &self.requests().len())
            .finish()
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, TransportError> {
        let req = RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
        };
        if let Ok(mut log) = self.requests.lock() {
            log.push(req.clone());
        }
        (self.handler)(&req)
    }
}
