//! A fake ERP for driving skills end to end.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};

use ledgerlens_core::{TenantId, UserId};
use ledgerlens_rpc::{Credentials, InMemoryTransport, RecordedRequest, TransportResponse};
use ledgerlens_skills::{SkillContext, ERP_INTEGRATION};

pub const UID: i64 = 2;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

/// Answers logins itself and every other call with `handler`'s result.
pub fn fake_erp<F>(handler: F) -> Arc<InMemoryTransport>
where
    F: Fn(&RecordedRequest) -> Value + Send + Sync + 'static,
{
    Arc::new(InMemoryTransport::new(move |req| {
        if req.is_login() {
            return Ok(TransportResponse::rpc_result(json!(UID)));
        }
        Ok(TransportResponse::rpc_result(handler(req)))
    }))
}

pub fn context(transport: Arc<InMemoryTransport>) -> SkillContext {
    SkillContext::new(TenantId::new(), UserId::new(), transport)
        .with_integration(
            ERP_INTEGRATION,
            Credentials::new("https://erp.example.com", "acme", "bot@acme.test", "s3cret"),
        )
        .with_today(today())
}

/// A `read_group` call with at least one group-by.
pub fn is_grouped(req: &RecordedRequest) -> bool {
    req.model_args()
        .get(2)
        .and_then(Value::as_array)
        .is_some_and(|g| !g.is_empty())
}

pub fn limit(req: &RecordedRequest) -> Option<usize> {
    req.kwargs()
        .and_then(|k| k.get("limit"))
        .and_then(Value::as_u64)
        .map(|n| n as usize)
}

/// Value of the first `[field, op, value]` triple in the call's domain.
pub fn domain_value<'a>(req: &'a RecordedRequest, field: &str, op: &str) -> Option<&'a Value> {
    req.model_args().first()?.as_array()?.iter().find_map(|term| {
        let t = term.as_array()?;
        (t.first()?.as_str()? == field && t.get(1)?.as_str()? == op).then(|| t.get(2)).flatten()
    })
}

/// Grouped rows honouring the requested limit, like the real server.
pub fn limited(req: &RecordedRequest, groups: Vec<Value>) -> Value {
    match limit(req) {
        Some(n) => Value::Array(groups.into_iter().take(n).collect()),
        None => Value::Array(groups),
    }
}
