//! Declarative input contracts.
//!
//! A skill's input is checked against its [`InputSchema`] before any remote
//! call: unknown fields are rejected, types and bounds are enforced and
//! defaults are filled in. Only then is the object deserialised into the
//! skill's typed input.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::result::SkillError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        choices: Option<Vec<String>>,
    },
    Integer {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// `YYYY-MM-DD`
    Date,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    fn new(name: &str, description: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn string(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldKind::String { choices: None })
    }

    pub fn choice(name: &str, description: &str, choices: &[&str]) -> Self {
        let choices = choices.iter().map(|c| c.to_string()).collect();
        Self::new(name, description, FieldKind::String { choices: Some(choices) })
    }

    pub fn integer(name: &str, description: &str, min: Option<i64>, max: Option<i64>) -> Self {
        Self::new(name, description, FieldKind::Integer { min, max })
    }

    pub fn number(name: &str, description: &str, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(name, description, FieldKind::Number { min, max })
    }

    pub fn date(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldKind::Date)
    }

    pub fn boolean(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldKind::Boolean)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn check(&self, value: &Value) -> Result<(), SkillError> {
        let name = &self.name;
        match &self.kind {
            FieldKind::String { choices } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| SkillError::invalid(format!("`{name}` must be a string")))?;
                if let Some(choices) = choices {
                    if !choices.iter().any(|c| c == s) {
                        return Err(SkillError::invalid(format!(
                            "`{name}` must be one of: {}",
                            choices.join(", ")
                        )));
                    }
                }
            }
            FieldKind::Integer { min, max } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| SkillError::invalid(format!("`{name}` must be an integer")))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(SkillError::invalid(format!(
                        "`{name}` must be between {} and {}",
                        bound(min),
                        bound(max)
                    )));
                }
            }
            FieldKind::Number { min, max } => {
                let n = value
                    .as_f64()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| SkillError::invalid(format!("`{name}` must be a number")))?;
                if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                    return Err(SkillError::invalid(format!(
                        "`{name}` must be between {} and {}",
                        bound(min),
                        bound(max)
                    )));
                }
            }
            FieldKind::Date => {
                let ok = value
                    .as_str()
                    .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok());
                if !ok {
                    return Err(SkillError::invalid(format!("`{name}` must be a date (YYYY-MM-DD)")));
                }
            }
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    return Err(SkillError::invalid(format!("`{name}` must be true or false")));
                }
            }
        }
        Ok(())
    }
}

fn bound<T: ToString>(b: &Option<T>) -> String {
    b.as_ref().map(T::to_string).unwrap_or_else(|| "unbounded".to_string())
}

/// Ordered field list describing a skill's accepted input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check `input` and return it with defaults applied.
    ///
    /// `null` is treated as an empty object. Explicit `null` field values count
    /// as absent.
    pub fn validate(&self, input: Value) -> Result<Map<String, Value>, SkillError> {
        let mut map = match input {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(SkillError::invalid(format!("input must be an object, got {other}")));
            }
        };

        if let Some(unknown) = map.keys().find(|k| self.get(k).is_none()) {
            return Err(SkillError::invalid(format!("unknown field `{unknown}`")));
        }

        map.retain(|_, v| !v.is_null());

        for spec in &self.fields {
            match map.get(&spec.name) {
                Some(value) => spec.check(value)?,
                None => match &spec.default {
                    Some(default) => {
                        map.insert(spec.name.clone(), default.clone());
                    }
                    None if spec.required => {
                        return Err(SkillError::invalid(format!("missing required field `{}`", spec.name)));
                    }
                    None => {}
                },
            }
        }

        Ok(map)
    }

    /// Validate, then deserialise into the typed input.
    pub fn parse<T: DeserializeOwned>(&self, input: Value) -> Result<T, SkillError> {
        let map = self.validate(input)?;
        serde_json::from_value(Value::Object(map)).map_err(|e| SkillError::invalid(e.to_string()))
    }
}
