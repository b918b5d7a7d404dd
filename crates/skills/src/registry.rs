use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::context::SkillContext;
use crate::result::{SkillError, SkillOutcome};
use crate::skill::{DynSkill, Skill, SkillDescriptor};

/// Registry of skills dispatched by name.
#[derive(Default)]
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn DynSkill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names are unique; a second skill with a taken name is rejected.
    pub fn register<S: Skill>(&mut self, skill: S) -> Result<(), SkillError> {
        let name = skill.descriptor().name;
        if self.skills.contains_key(&name) {
            return Err(SkillError::DuplicateSkill(name));
        }
        debug!(skill = %name, "skill registered");
        self.skills.insert(name, Arc::new(skill));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynSkill>> {
        self.skills.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Every descriptor, highest priority first, then by name.
    pub fn descriptors(&self) -> Vec<SkillDescriptor> {
        let mut out: Vec<SkillDescriptor> = self.skills.values().map(|s| s.describe()).collect();
        out.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        out
    }

    /// Skills carrying `tag`, in descriptor order.
    pub fn with_tag(&self, tag: &str) -> Vec<SkillDescriptor> {
        self.descriptors()
            .into_iter()
            .filter(|d| d.tags.iter().any(|t| t == tag))
            .collect()
    }

    pub async fn invoke(&self, name: &str, input: Value, ctx: &SkillContext) -> SkillOutcome<Value> {
        match self.get(name) {
            Some(skill) => skill.invoke(input, ctx).await,
            None => SkillOutcome::Failure(SkillError::UnknownSkill(name.to_string()).to_failure()),
        }
    }
}

impl core::fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&String> = self.skills.keys().collect();
        names.sort();
        f.debug_struct("SkillRegistry").field("skills", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledgerlens_core::{ErrorKind, TenantId, UserId};
    use ledgerlens_rpc::{Credentials, InMemoryTransport, RpcClient, TransportResponse};
    use serde::Deserialize;
    use serde_json::json;

    use crate::context::ERP_INTEGRATION;
    use crate::schema::{FieldSpec, InputSchema};

    struct Echo {
        name: &'static str,
        priority: i32,
    }

    #[derive(Deserialize)]
    struct EchoInput {
        word: String,
    }

    #[async_trait]
    impl Skill for Echo {
        type Input = EchoInput;
        type Output = String;

        fn descriptor(&self) -> SkillDescriptor {
            SkillDescriptor::new(self.name, "repeats a word")
                .tags(&["test"])
                .priority(self.priority)
                .input(InputSchema::new().field(FieldSpec::string("word", "what to say").default_value("hi")))
        }

        async fn run(&self, input: EchoInput, _ctx: &SkillContext, _erp: &RpcClient) -> Result<String, SkillError> {
            Ok(input.word)
        }
    }

    fn ctx() -> SkillContext {
        let t = Arc::new(InMemoryTransport::new(|_| Ok(TransportResponse::rpc_result(json!(1)))));
        SkillContext::new(TenantId::new(), UserId::new(), t)
            .with_integration(ERP_INTEGRATION, Credentials::new("https://erp", "acme", "bot", "pw"))
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut r = SkillRegistry::new();
        r.register(Echo { name: "echo", priority: 0 }).unwrap();
        let err = r.register(Echo { name: "echo", priority: 9 }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn descriptors_sort_by_priority_then_name() {
        let mut r = SkillRegistry::new();
        r.register(Echo { name: "b", priority: 1 }).unwrap();
        r.register(Echo { name: "a", priority: 1 }).unwrap();
        r.register(Echo { name: "z", priority: 5 }).unwrap();
        let names: Vec<String> = r.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["z", "a", "b"]);
        assert_eq!(r.with_tag("test").len(), 3);
        assert!(r.with_tag("sales").is_empty());
    }

    #[tokio::test]
    async fn invoke_applies_defaults_and_wraps_output() {
        let mut r = SkillRegistry::new();
        r.register(Echo { name: "echo", priority: 0 }).unwrap();
        let out = r.invoke("echo", Value::Null, &ctx()).await;
        assert_eq!(out.data(), Some(&json!("hi")));
    }

    #[tokio::test]
    async fn unknown_skill_and_bad_input_fail_cleanly() {
        let mut r = SkillRegistry::new();
        r.register(Echo { name: "echo", priority: 0 }).unwrap();

        let missing = r.invoke("nope", Value::Null, &ctx()).await;
        assert_eq!(missing.failure().unwrap().code, ErrorKind::NotFound);

        let bad = r.invoke("echo", json!({"word": 3}), &ctx()).await;
        assert_eq!(bad.failure().unwrap().code, ErrorKind::Validation);
    }
}
