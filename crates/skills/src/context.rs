use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use ledgerlens_core::{TenantId, UserId};
use ledgerlens_rpc::{ClientConfig, Credentials, HttpTransport, RpcClient, SchemaCache, Transport};

use crate::result::SkillError;

/// Integration name the built-in skills read from.
pub const ERP_INTEGRATION: &str = "erp";

/// Everything one skill invocation may use. Built per request, never persisted.
///
/// Clients made from a context are fresh per call, so a cached identity never
/// outlives the request nor crosses tenants.
#[derive(Clone)]
pub struct SkillContext {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    integrations: HashMap<String, Credentials>,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    schema_cache: Option<Arc<SchemaCache>>,
    today: NaiveDate,
}

impl SkillContext {
    pub fn new(tenant_id: TenantId, user_id: UserId, transport: Arc<dyn Transport>) -> Self {
        Self {
            tenant_id,
            user_id,
            integrations: HashMap::new(),
            transport,
            config: ClientConfig::default(),
            schema_cache: None,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Context over a fresh HTTP transport honouring `config`'s timeout.
    pub fn http(tenant_id: TenantId, user_id: UserId, config: ClientConfig) -> Result<Self, SkillError> {
        let transport = HttpTransport::new(config.request_timeout)
            .map_err(|e| SkillError::Internal(format!("building HTTP transport: {e}")))?;
        Ok(Self::new(tenant_id, user_id, Arc::new(transport)).with_config(config))
    }

    pub fn with_integration(mut self, name: impl Into<String>, credentials: Credentials) -> Self {
        self.integrations.insert(name.into(), credentials);
        self
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_schema_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.schema_cache = Some(cache);
        self
    }

    /// Pin the date periods resolve against (defaults to the local date at construction).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn has_integration(&self, name: &str) -> bool {
        self.integrations.contains_key(name)
    }

    pub fn credentials(&self, integration: &str) -> Result<&Credentials, SkillError> {
        self.integrations
            .get(integration)
            .ok_or_else(|| SkillError::MissingIntegration(integration.to_string()))
    }

    /// A new client for `integration`. No network traffic happens here.
    pub fn client(&self, integration: &str) -> Result<RpcClient, SkillError> {
        let credentials = self.credentials(integration)?.clone();
        credentials.validate()?;
        let client = RpcClient::with_config(credentials, Arc::clone(&self.transport), self.config.clone());
        Ok(match &self.schema_cache {
            Some(cache) => client.with_schema_cache(Arc::clone(cache)),
            None => client,
        })
    }
}

impl fmt::Debug for SkillContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.integrations.keys().collect();
        names.sort();
        f.debug_struct("SkillContext")
            .field("tenant_id", &self.tenant_id)
            .field("user_id", &self.user_id)
            .field("integrations", &names)
            .field("today", &self.today)
            .finish()
    }
}
