//! `ledgerlens-skills` — named, self-describing business-metric commands.
//!
//! **Responsibility:** turn validated caller input into typed metrics read from
//! the remote ERP, and report every outcome as a tagged [`SkillOutcome`].
//!
//! ## Components
//!
//! - [`Skill`]: the contract (descriptor, typed input, async run)
//! - [`SkillRegistry`]: name-indexed dispatch for the routing layer
//! - [`SkillContext`]: per-invocation identity, tenant and integration credentials
//! - [`metrics`]: shared numeric routines (change, trend, aging, shares)
//! - [`skills`]: the built-in skill set

pub mod context;
pub mod metrics;
pub mod period;
pub mod registry;
pub mod result;
pub mod schema;
pub mod skill;
pub mod skills;

pub use context::{SkillContext, ERP_INTEGRATION};
pub use period::{Period, PeriodInput, PeriodPreset};
pub use registry::SkillRegistry;
pub use result::{SkillError, SkillOutcome};
pub use schema::{FieldKind, FieldSpec, InputSchema};
pub use skill::{execute, DynSkill, Skill, SkillDescriptor};

/// A registry holding every built-in skill.
pub fn default_registry() -> Result<SkillRegistry, SkillError> {
    let mut registry = SkillRegistry::new();
    skills::register_builtin(&mut registry)?;
    Ok(registry)
}
