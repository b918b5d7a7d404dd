//! Decoded grouped-aggregate rows.

use serde_json::{Map, Value};

use crate::error::QueryError;
use crate::relation::Relation;
use crate::request::{AggregateField, GroupBy};

/// One group returned by a grouped read.
///
/// Keys are the group-by specs (`partner_id`, `date_order:month`); aggregate
/// values sit under the bare field name; the record count is `__count` or, in
/// lazy mode, `<first group-by>_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow(Map<String, Value>);

impl GroupRow {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn from_value(value: Value) -> Result<Self, QueryError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(QueryError::malformed("group row", format!("expected object, got {other}"))),
        }
    }

    /// Decode a grouped-read result list.
    pub fn list_from_value(value: Value) -> Result<Vec<Self>, QueryError> {
        match value {
            Value::Array(items) => items.into_iter().map(Self::from_value).collect(),
            other => Err(QueryError::malformed("group list", format!("expected array, got {other}"))),
        }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Raw key value for a group-by (`Value::Null` when absent).
    pub fn key(&self, group_by: &GroupBy) -> &Value {
        self.0.get(&group_by.to_string()).unwrap_or(&Value::Null)
    }

    /// The group key as a relation; `None` for the unset (`false`) group.
    pub fn key_relation(&self, group_by: &GroupBy) -> Option<Relation> {
        Relation::from_value(self.key(group_by))
    }

    /// Human label for the group key: relation name, date bucket or selection value.
    pub fn key_label(&self, group_by: &GroupBy) -> Option<String> {
        match self.key(group_by) {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            v @ Value::Array(_) => Relation::from_value(v).map(|r| r.label()),
            _ => None,
        }
    }

    /// Aggregate value; missing or `false` reads as zero.
    pub fn aggregate(&self, field: &AggregateField) -> f64 {
        self.number(&field.field)
    }

    pub fn number(&self, key: &str) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Records in the group.
    pub fn count(&self) -> u64 {
        if let Some(n) = self.0.get("__count").and_then(Value::as_u64) {
            return n;
        }
        self.0
            .iter()
            .find(|(k, _)| k.ends_with("_count"))
            .and_then(|(_, v)| v.as_u64())
            .unwrap_or(0)
    }
}
