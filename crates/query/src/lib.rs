//! `ledgerlens-query` — read-side query composition for the remote ERP.
//!
//! **Responsibility:** everything needed to *describe* a read without issuing it:
//! - the Domain filter algebra (prefix-notation AND/OR, pure builders)
//! - row search and grouped aggregate request shapes
//! - decoding of relation pairs and grouped result rows
//!
//! Nothing in this crate performs I/O.

pub mod domain;
pub mod error;
pub mod filters;
pub mod group;
pub mod relation;
pub mod request;

pub use domain::{Condition, Domain, FilterValue, Operator, Term};
pub use error::QueryError;
pub use filters::{
    combine_domains, date_range, datetime_range, ids_filter, invoice_type_filter, payment_state_filter,
    state_filter, ModelKind,
};
pub use group::GroupRow;
pub use relation::Relation;
pub use request::{
    AggregateField, AggregateFunction, AggregateRequest, Granularity, GroupBy, QueryRequest,
    ReadGroupOptions, SearchOptions, SortOrder, DEFAULT_GROUP_LIMIT, DEFAULT_SEARCH_LIMIT,
};
