//! The Transport/Auth client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use ledgerlens_query::{AggregateRequest, Domain, GroupRow, QueryRequest};

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{is_retryable_status, RpcError};
use crate::health::HealthReport;
use crate::protocol::{self, RpcReply};
use crate::schema_cache::{SchemaCache, SchemaKey};
use crate::totals::{GrandTotal, GroupedTotals};
use crate::transport::{HttpTransport, Transport};

/// One authenticated session against one remote database.
///
/// The identity is established lazily on first use and cached for the life of
/// the instance. After that it is only read, so concurrent calls through one
/// client share it safely. Build a fresh client per credential set; clients are
/// never shared across tenants.
pub struct RpcClient {
    credentials: Credentials,
    endpoint: String,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    uid: OnceCell<i64>,
    next_id: AtomicU64,
    schema_cache: Option<Arc<SchemaCache>>,
}

impl core::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RpcClient")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.uid.initialized())
            .finish()
    }
}

impl RpcClient {
    pub fn new(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(credentials, transport, ClientConfig::default())
    }

    pub fn with_config(credentials: Credentials, transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let endpoint = credentials.endpoint(&config.rpc_path);
        Self {
            credentials,
            endpoint,
            config,
            transport,
            uid: OnceCell::new(),
            next_id: AtomicU64::new(1),
            schema_cache: None,
        }
    }

    /// Client over a fresh HTTP transport.
    pub fn http(credentials: Credentials, config: ClientConfig) -> Result<Self, RpcError> {
        let transport = HttpTransport::new(config.request_timeout).map_err(|e| RpcError::Transport {
            attempts: 0,
            reason: e.to_string(),
        })?;
        Ok(Self::with_config(credentials, Arc::new(transport), config))
    }

    pub fn with_schema_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.schema_cache = Some(cache);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The cached identity, performing the login handshake on first use.
    pub async fn authenticate(&self) -> Result<i64, RpcError> {
        self.uid.get_or_try_init(|| self.login()).await.copied()
    }

    async fn login(&self) -> Result<i64, RpcError> {
        self.credentials.validate()?;
        let auth_error = |reason: String| RpcError::Auth {
            namespace: self.credentials.namespace.clone(),
            username: self.credentials.username.clone(),
            reason,
        };

        let args = [
            json!(self.credentials.namespace),
            json!(self.credentials.username),
            json!(self.credentials.secret()),
        ];
        let result = self
            .call("common", "login", &args)
            .await
            .map_err(|e| auth_error(e.to_string()))?;

        match result.as_i64() {
            Some(uid) if uid > 0 => {
                debug!(
                    namespace = %self.credentials.namespace,
                    username = %self.credentials.username,
                    uid,
                    "remote identity established"
                );
                Ok(uid)
            }
            _ => Err(auth_error("server returned no identity".to_string())),
        }
    }

    /// One remote procedure invocation with transient-failure retry.
    ///
    /// 429, ≥502 and connection failures are retried per the configured
    /// [`RetryPolicy`](crate::RetryPolicy); application errors are terminal.
    pub async fn call(&self, service: &str, method: &str, args: &[Value]) -> Result<Value, RpcError> {
        let policy = &self.config.retry;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let body = protocol::envelope(id, service, method, args);

            let reason = match self.transport.post_json(&self.endpoint, &body).await {
                Ok(resp) if resp.is_success() => {
                    return match protocol::parse_reply(resp.body)? {
                        RpcReply::Result(v) => Ok(v),
                        RpcReply::Fault(fault) => Err(RpcError::from_fault(&fault, None)),
                    };
                }
                Ok(resp) if is_retryable_status(resp.status) => format!("HTTP {}", resp.status),
                Ok(resp) => {
                    return Err(RpcError::Http {
                        status: resp.status,
                        service: service.to_string(),
                        method: method.to_string(),
                    });
                }
                Err(e) if e.is_retryable() => e.to_string(),
                Err(e) => {
                    return Err(RpcError::Transport {
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            };

            if !policy.should_retry(attempt) {
                warn!(service, method, attempts = attempt, reason = %reason, "remote call failed; retries exhausted");
                return Err(RpcError::Transport {
                    attempts: attempt,
                    reason,
                });
            }

            let delay = policy.delay_for_attempt(attempt);
            warn!(
                service,
                method,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "transient remote failure; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Call a model method as the cached identity.
    pub async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, RpcError> {
        let uid = self.authenticate().await?;
        let params = [
            json!(self.credentials.namespace),
            json!(uid),
            json!(self.credentials.secret()),
            json!(model),
            json!(method),
            Value::Array(args),
            Value::Object(kwargs),
        ];
        self.call("object", "execute_kw", &params)
            .await
            .map_err(|e| match e {
                RpcError::Remote {
                    kind,
                    model: None,
                    fault_name,
                    message,
                } => RpcError::Remote {
                    kind,
                    model: Some(model.to_string()),
                    fault_name,
                    message,
                },
                other => other,
            })
    }

    /// Row search. Returns one JSON object per record.
    pub async fn search_read(&self, request: &QueryRequest) -> Result<Vec<Map<String, Value>>, RpcError> {
        request.validate()?;
        let opts = &request.options;

        let mut kwargs = Map::new();
        if let Some(fields) = &opts.fields {
            kwargs.insert("fields".into(), json!(fields));
        }
        if let Some(limit) = opts.limit {
            kwargs.insert("limit".into(), json!(limit));
        }
        kwargs.insert("offset".into(), json!(opts.offset));
        if let Some(order) = &opts.order {
            kwargs.insert("order".into(), json!(order));
        }

        let domain = serde_json::to_value(&request.domain).map_err(|e| RpcError::Malformed(e.to_string()))?;
        let result = self
            .execute_kw(&request.model, "search_read", vec![domain], kwargs)
            .await?;

        match result {
            Value::Array(rows) => rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(map) => Ok(map),
                    other => Err(RpcError::Malformed(format!("search_read row is not an object: {other}"))),
                })
                .collect(),
            other => Err(RpcError::Malformed(format!("search_read returned {other}"))),
        }
    }

    /// Grouped aggregation. The group limit never changes aggregate magnitudes,
    /// only how many groups come back.
    pub async fn read_group(&self, request: &AggregateRequest) -> Result<Vec<GroupRow>, RpcError> {
        request.validate()?;
        let opts = &request.options;

        let mut kwargs = Map::new();
        kwargs.insert("offset".into(), json!(opts.offset));
        if let Some(limit) = opts.limit {
            kwargs.insert("limit".into(), json!(limit));
        }
        if let Some(order) = &opts.order_by {
            kwargs.insert("orderby".into(), json!(order));
        }
        kwargs.insert("lazy".into(), json!(opts.lazy));

        let domain = serde_json::to_value(&request.domain).map_err(|e| RpcError::Malformed(e.to_string()))?;
        let args = vec![
            domain,
            json!(request.aggregate_specs()),
            json!(request.group_by_specs()),
        ];
        let result = self.execute_kw(&request.model, "read_group", args, kwargs).await?;
        Ok(GroupRow::list_from_value(result)?)
    }

    /// The limited group list together with a grand total computed by a
    /// separate unlimited aggregate. Both reads run concurrently.
    pub async fn read_group_with_total(&self, request: &AggregateRequest) -> Result<GroupedTotals, RpcError> {
        let (groups, grand_total) = tokio::try_join!(self.read_group(request), self.aggregate_total(request))?;
        Ok(GroupedTotals::new(groups, grand_total, request.options.limit))
    }

    /// Grand totals of `request`'s aggregates over every matching record,
    /// ignoring its grouping and limit.
    pub async fn aggregate_total(&self, request: &AggregateRequest) -> Result<GrandTotal, RpcError> {
        let total_request = request.ungrouped_total();
        let rows = self.read_group(&total_request).await?;
        Ok(GrandTotal::from_unlimited(&total_request.aggregates, &rows))
    }

    /// Count matching records without fetching them.
    pub async fn search_count(&self, model: &str, domain: &Domain) -> Result<u64, RpcError> {
        let domain_json = serde_json::to_value(domain).map_err(|e| RpcError::Malformed(e.to_string()))?;
        let result = self
            .execute_kw(model, "search_count", vec![domain_json], Map::new())
            .await?;
        result
            .as_u64()
            .ok_or_else(|| RpcError::Malformed(format!("search_count returned {result}")))
    }

    /// Schema introspection, served from the injected cache when present.
    pub async fn fields_get(&self, model: &str, attributes: &[&str]) -> Result<Arc<Map<String, Value>>, RpcError> {
        let key = SchemaKey {
            endpoint: self.endpoint.clone(),
            namespace: self.credentials.namespace.clone(),
            model: model.to_string(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        };

        if let Some(cache) = &self.schema_cache {
            if let Some(hit) = cache.get(&key) {
                debug!(model, "schema cache hit");
                return Ok(hit);
            }
        }

        let mut kwargs = Map::new();
        kwargs.insert("attributes".into(), json!(attributes));
        let result = self.execute_kw(model, "fields_get", vec![], kwargs).await?;
        let Value::Object(fields) = result else {
            return Err(RpcError::Malformed(format!("fields_get for {model} is not an object")));
        };

        Ok(match &self.schema_cache {
            Some(cache) => cache.insert(key, fields),
            None => Arc::new(fields),
        })
    }

    /// Three-stage liveness probe: reachability, authentication, a trivial read.
    pub async fn health_check(&self) -> HealthReport {
        let mut report = HealthReport::new(&self.endpoint);

        match self.call("common", "version", &[]).await {
            Ok(version) => {
                report.reachable = true;
                report.server_version = version
                    .get("server_version")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            Err(e) => return report.failed("reachability", &e),
        }

        let uid = match self.authenticate().await {
            Ok(uid) => {
                report.authenticated = true;
                uid
            }
            Err(e) => return report.failed("authentication", &e),
        };

        match self
            .search_count("res.users", &Domain::leaf("id", ledgerlens_query::Operator::Eq, uid))
            .await
        {
            Ok(_) => report.readable = true,
            Err(e) => return report.failed("read", &e),
        }

        report.succeeded(&self.credentials.username, &self.credentials.namespace)
    }
}
