//! Relation values: the remote `(id, display name)` pair convention.

use serde::Serialize;
use serde_json::Value;

/// A resolved reference to another remote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Relation {
    pub id: i64,
    pub name: String,
}

impl Relation {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    /// Decode a relation value.
    ///
    /// Unset relations arrive as `false` (occasionally `null`); those, and any
    /// payload that is not an `[id, name]` pair with a positive id, yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let pair = value.as_array()?;
        let id = pair.first()?.as_i64().filter(|id| *id > 0)?;
        let name = match pair.get(1) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(false)) | Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Some(Self { id, name })
    }

    /// The display name, or `#<id>` when the remote sent none.
    pub fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("#{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pair_decodes() {
        assert_eq!(
            Relation::from_value(&json!([7, "Azure Interior"])),
            Some(Relation::new(7, "Azure Interior"))
        );
    }

    #[test]
    fn falsy_values_are_unset() {
        assert_eq!(Relation::from_value(&json!(false)), None);
        assert_eq!(Relation::from_value(&Value::Null), None);
        assert_eq!(Relation::from_value(&json!([])), None);
        assert_eq!(Relation::from_value(&json!([false, "x"])), None);
        assert_eq!(Relation::from_value(&json!("false")), None);
    }

    #[test]
    fn missing_name_gets_id_label() {
        let r = Relation::from_value(&json!([12])).unwrap();
        assert_eq!(r.label(), "#12");
    }
}
