use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use ledgerlens_core::Failure;
use ledgerlens_rpc::RpcClient;

use crate::context::{SkillContext, ERP_INTEGRATION};
use crate::result::{SkillError, SkillOutcome};
use crate::schema::InputSchema;

/// What the routing layer sees of a skill. Nothing else about a skill is part
/// of that contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Opaque tie-breaker for the routing layer; higher sorts first.
    pub priority: i32,
    pub input_schema: InputSchema,
}

impl SkillDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            tags: Vec::new(),
            priority: 0,
            input_schema: InputSchema::new(),
        }
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn input(mut self, schema: InputSchema) -> Self {
        self.input_schema = schema;
        self
    }
}

/// A named business-metric command.
///
/// Skills are stateless: everything they read comes from the remote system
/// through the client they are handed, and they never write to it.
#[async_trait]
pub trait Skill: Send + Sync + 'static {
    type Input: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;

    fn descriptor(&self) -> SkillDescriptor;

    /// Integration whose credentials the skill reads with.
    fn integration(&self) -> &'static str {
        ERP_INTEGRATION
    }

    /// Compute the metric from already validated input.
    async fn run(&self, input: Self::Input, ctx: &SkillContext, erp: &RpcClient) -> Result<Self::Output, SkillError>;
}

/// Run a skill end to end. Never fails: every error becomes a
/// [`SkillOutcome::Failure`].
///
/// Credentials are checked first, then the input contract, both before any
/// network traffic.
pub async fn execute<S: Skill + ?Sized>(skill: &S, input: Value, ctx: &SkillContext) -> SkillOutcome<S::Output> {
    let descriptor = skill.descriptor();
    let started = Instant::now();
    info!(skill = %descriptor.name, tenant = %ctx.tenant_id, user = %ctx.user_id, "skill started");

    let result = async {
        let erp = ctx.client(skill.integration())?;
        let input = descriptor.input_schema.parse::<S::Input>(input)?;
        skill.run(input, ctx, &erp).await
    }
    .await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => info!(skill = %descriptor.name, tenant = %ctx.tenant_id, elapsed_ms, "skill finished"),
        Err(e) => warn!(
            skill = %descriptor.name,
            tenant = %ctx.tenant_id,
            code = e.kind().code(),
            error = %e,
            elapsed_ms,
            "skill failed"
        ),
    }
    result.into()
}

/// Object-safe face of [`Skill`] with JSON in and out, used by the registry.
#[async_trait]
pub trait DynSkill: Send + Sync {
    fn describe(&self) -> SkillDescriptor;

    async fn invoke(&self, input: Value, ctx: &SkillContext) -> SkillOutcome<Value>;
}

#[async_trait]
impl<S: Skill> DynSkill for S {
    fn describe(&self) -> SkillDescriptor {
        self.descriptor()
    }

    async fn invoke(&self, input: Value, ctx: &SkillContext) -> SkillOutcome<Value> {
        match execute(self, input, ctx).await {
            SkillOutcome::Success(output) => match serde_json::to_value(output) {
                Ok(v) => SkillOutcome::Success(v),
                Err(e) => SkillOutcome::Failure(Failure::api(format!("could not encode skill output: {e}"))),
            },
            SkillOutcome::Failure(f) => SkillOutcome::Failure(f),
        }
    }
}
