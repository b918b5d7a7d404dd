//! Row search and grouped aggregate request shapes.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::domain::Domain;
use crate::error::QueryError;

/// Rows returned by a search when the caller does not say otherwise.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Groups returned by a grouped read when the caller does not say otherwise.
pub const DEFAULT_GROUP_LIMIT: u32 = 80;

/// Aggregate function applied to a numeric field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
    Max,
    Min,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Max => "max",
            AggregateFunction::Min => "min",
        }
    }
}

impl FromStr for AggregateFunction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(Self::Sum),
            "count" => Ok(Self::Count),
            "avg" => Ok(Self::Avg),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            other => Err(QueryError::invalid(format!("unknown aggregate function `{other}`"))),
        }
    }
}

/// `field:function` aggregate spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateField {
    pub field: String,
    pub function: AggregateFunction,
}

impl AggregateField {
    pub fn new(field: impl Into<String>, function: AggregateFunction) -> Self {
        Self {
            field: field.into(),
            function,
        }
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::new(field, AggregateFunction::Sum)
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::new(field, AggregateFunction::Count)
    }
}

impl fmt::Display for AggregateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.function.as_str())
    }
}

impl FromStr for AggregateField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, func) = s
            .split_once(':')
            .ok_or_else(|| QueryError::invalid(format!("aggregate `{s}` must be `field:function`")))?;
        if field.is_empty() {
            return Err(QueryError::invalid(format!("aggregate `{s}` has no field")));
        }
        Ok(Self::new(field, func.parse()?))
    }
}

/// Time bucketing for date group-bys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }
}

impl FromStr for Granularity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(QueryError::invalid(format!("unknown granularity `{other}`"))),
        }
    }
}

/// `field` or `field:granularity` group-by spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupBy {
    pub field: String,
    pub granularity: Option<Granularity>,
}

impl GroupBy {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            granularity: None,
        }
    }

    pub fn date(field: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            field: field.into(),
            granularity: Some(granularity),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Some(g) => write!(f, "{}:{}", self.field, g.as_str()),
            None => f.write_str(&self.field),
        }
    }
}

impl FromStr for GroupBy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((field, g)) if !field.is_empty() => Ok(Self::date(field, g.parse()?)),
            None if !s.is_empty() => Ok(Self::field(s)),
            _ => Err(QueryError::invalid(format!("group-by `{s}` has no field"))),
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

impl SortOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Render a list of sort keys as the remote `order` clause.
    pub fn clause(keys: &[SortOrder]) -> Option<String> {
        if keys.is_empty() {
            return None;
        }
        Some(keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, if self.descending { "desc" } else { "asc" })
    }
}

/// Paging/projection options for a row search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub fields: Option<Vec<String>>,
    /// `None` means every matching row.
    pub limit: Option<u32>,
    pub offset: u32,
    pub order: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fields: None,
            limit: Some(DEFAULT_SEARCH_LIMIT),
            offset: 0,
            order: None,
        }
    }
}

impl SearchOptions {
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.limit = None;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }
}

/// Options for a grouped read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGroupOptions {
    /// Caps the number of *groups* returned; never affects aggregate magnitudes.
    pub limit: Option<u32>,
    pub offset: u32,
    pub order_by: Option<String>,
    /// Collapse to the first group-by level only (the remote's native mode).
    pub lazy: bool,
}

impl Default for ReadGroupOptions {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_GROUP_LIMIT),
            offset: 0,
            order_by: None,
            lazy: true,
        }
    }
}

impl ReadGroupOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.limit = None;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn eager(mut self) -> Self {
        self.lazy = false;
        self
    }
}

/// Row search against one model.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub model: String,
    pub domain: Domain,
    pub options: SearchOptions,
}

impl QueryRequest {
    pub fn new(model: impl Into<String>, domain: Domain) -> Self {
        Self {
            model: model.into(),
            domain,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.model.trim().is_empty() {
            return Err(QueryError::invalid("model name is required"));
        }
        if !self.domain.is_well_formed() {
            return Err(QueryError::invalid(format!("malformed domain {}", self.domain)));
        }
        Ok(())
    }
}

/// Grouped aggregation against one model.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub model: String,
    pub domain: Domain,
    pub aggregates: Vec<AggregateField>,
    pub group_by: Vec<GroupBy>,
    pub options: ReadGroupOptions,
}

impl AggregateRequest {
    pub fn new(model: impl Into<String>, domain: Domain) -> Self {
        Self {
            model: model.into(),
            domain,
            aggregates: Vec::new(),
            group_by: Vec::new(),
            options: ReadGroupOptions::default(),
        }
    }

    pub fn aggregate(mut self, field: AggregateField) -> Self {
        self.aggregates.push(field);
        self
    }

    pub fn sum(self, field: impl Into<String>) -> Self {
        self.aggregate(AggregateField::sum(field))
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by.push(group_by);
        self
    }

    pub fn with_options(mut self, options: ReadGroupOptions) -> Self {
        self.options = options;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.options.limit = None;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.options.order_by = Some(order_by.into());
        self
    }

    /// Same filter and aggregates, no grouping, no limit: one row carrying the
    /// grand totals over every matching record.
    ///
    /// A request with no aggregates (a plain count per group) gets an `id`
    /// count so the twin stays a valid request.
    pub fn ungrouped_total(&self) -> AggregateRequest {
        let aggregates = if self.aggregates.is_empty() {
            vec![AggregateField::count("id")]
        } else {
            self.aggregates.clone()
        };
        AggregateRequest {
            model: self.model.clone(),
            domain: self.domain.clone(),
            aggregates,
            group_by: Vec::new(),
            options: ReadGroupOptions {
                limit: None,
                offset: 0,
                order_by: None,
                lazy: true,
            },
        }
    }

    pub fn aggregate_specs(&self) -> Vec<String> {
        self.aggregates.iter().map(ToString::to_string).collect()
    }

    pub fn group_by_specs(&self) -> Vec<String> {
        self.group_by.iter().map(ToString::to_string).collect()
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.model.trim().is_empty() {
            return Err(QueryError::invalid("model name is required"));
        }
        if !self.domain.is_well_formed() {
            return Err(QueryError::invalid(format!("malformed domain {}", self.domain)));
        }
        if self.aggregates.is_empty() && self.group_by.is_empty() {
            return Err(QueryError::invalid(
                "an aggregate request needs at least one aggregate or group-by",
            ));
        }
        // results are keyed by bare field name, so two functions on one field collide
        for (i, agg) in self.aggregates.iter().enumerate() {
            if self.aggregates[..i].iter().any(|a| a.field == agg.field) {
                return Err(QueryError::invalid(format!(
                    "field `{}` is aggregated more than once",
                    agg.field
                )));
            }
        }
        Ok(())
    }
}
