//! Domain filter expressions.
//!
//! A [`Domain`] is an ordered list of [`Term`]s in the remote system's native
//! prefix notation: a logical marker (`&`, `|`, `!`) applies to the expression(s)
//! that immediately follow it, and consecutive top-level expressions are joined
//! by an implicit AND. An empty domain matches every record.

use core::fmt;
use core::str::FromStr;

use chrono::NaiveDate;
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Right-hand side of a filter triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FilterValue>),
    Null,
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for FilterValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        Self::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Comparison operator of a filter triple.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "ilike")]
    ILike,
    #[serde(rename = "=like")]
    EqLike,
    #[serde(rename = "=ilike")]
    EqILike,
    #[serde(rename = "child_of")]
    ChildOf,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::EqLike => "=like",
            Operator::EqILike => "=ilike",
            Operator::ChildOf => "child_of",
        }
    }

    /// `=` and `in` pin a field to values; a second one on the same field
    /// restates it rather than narrowing further.
    pub fn pins_value(&self) -> bool {
        matches!(self, Operator::Eq | Operator::In)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim() {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "=like" => Operator::EqLike,
            "=ilike" => Operator::EqILike,
            "child_of" => Operator::ChildOf,
            other => return Err(QueryError::invalid(format!("unknown operator `{other}`"))),
        };
        Ok(op)
    }
}

/// A `(field, operator, value)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(3)?;
        t.serialize_element(&self.field)?;
        t.serialize_element(&self.operator)?;
        t.serialize_element(&self.value)?;
        t.end()
    }
}

/// One element of a domain: a triple or a prefix logical marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Condition(Condition),
    /// `&` — both of the next two expressions.
    And,
    /// `|` — either of the next two expressions.
    Or,
    /// `!` — negation of the next expression.
    Not,
}

impl Term {
    /// Number of operand expressions this term consumes.
    fn arity(&self) -> usize {
        match self {
            Term::Condition(_) => 0,
            Term::And | Term::Or => 2,
            Term::Not => 1,
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            Term::Condition(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Condition> for Term {
    fn from(c: Condition) -> Self {
        Term::Condition(c)
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Term::Condition(c) => c.serialize(serializer),
            Term::And => serializer.serialize_str("&"),
            Term::Or => serializer.serialize_str("|"),
            Term::Not => serializer.serialize_str("!"),
        }
    }
}

/// Ordered filter expression in prefix notation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Domain(Vec<Term>);

impl Domain {
    /// The match-everything domain.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A domain holding exactly one triple.
    pub fn leaf(field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self(vec![Term::Condition(Condition::new(field, operator, value))])
    }

    /// Append a triple (implicit AND with what is already there).
    pub fn with(mut self, field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        self.0.push(Term::Condition(Condition::new(field, operator, value)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    pub fn into_terms(self) -> Vec<Term> {
        self.0
    }

    /// Iterate the triples, ignoring logical markers.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter().filter_map(Term::as_condition)
    }

    /// Split into top-level expressions (the implicitly AND-ed units).
    pub fn expressions(&self) -> Result<Vec<&[Term]>, QueryError> {
        let mut out = Vec::new();
        let mut start = 0;
        while start < self.0.len() {
            let mut need = 1usize;
            let mut end = start;
            while need > 0 {
                let term = self.0.get(end).ok_or_else(|| {
                    QueryError::malformed("domain", "logical operator is missing operands")
                })?;
                need = need - 1 + term.arity();
                end += 1;
            }
            out.push(&self.0[start..end]);
            start = end;
        }
        Ok(out)
    }

    pub fn is_well_formed(&self) -> bool {
        self.expressions().is_ok()
    }

    /// Rewrite as a single expression by making the implicit ANDs explicit.
    fn into_expression(self) -> Vec<Term> {
        let count = self.expressions().map(|e| e.len()).unwrap_or(1);
        let mut terms = Vec::with_capacity(self.0.len() + count.saturating_sub(1));
        terms.extend(std::iter::repeat_n(Term::And, count.saturating_sub(1)));
        terms.extend(self.0);
        terms
    }

    /// Both domains must match. An empty side contributes nothing.
    pub fn and(self, other: Domain) -> Domain {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let mut terms = self.0;
        terms.extend(other.0);
        Domain(terms)
    }

    /// Either domain may match. An empty side already matches everything.
    pub fn or(self, other: Domain) -> Domain {
        if self.is_empty() || other.is_empty() {
            return Domain::new();
        }
        let mut terms = vec![Term::Or];
        terms.extend(self.into_expression());
        terms.extend(other.into_expression());
        Domain(terms)
    }

    /// Records not matched by this domain. Negating the empty domain is
    /// left as the empty domain rather than a match-nothing filter.
    pub fn negate(self) -> Domain {
        if self.is_empty() {
            return self;
        }
        let mut terms = vec![Term::Not];
        terms.extend(self.into_expression());
        Domain(terms)
    }
}

impl From<Vec<Term>> for Domain {
    fn from(terms: Vec<Term>) -> Self {
        Self(terms)
    }
}

impl From<Condition> for Domain {
    fn from(c: Condition) -> Self {
        Self(vec![Term::Condition(c)])
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str("[<unserializable>]"),
        }
    }
}
