//! Limited group lists paired with grand totals that ignore the limit.

use std::collections::BTreeMap;

use serde::Serialize;

use ledgerlens_query::{AggregateField, GroupRow};

/// Totals over *every* record matching a request's domain.
///
/// Only produced from an unlimited, ungrouped aggregate inside this crate, so
/// a value of this type can never be the sum of a truncated group list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrandTotal {
    values: BTreeMap<String, f64>,
    count: u64,
}

impl GrandTotal {
    pub(crate) fn from_unlimited(aggregates: &[AggregateField], rows: &[GroupRow]) -> Self {
        let mut values = BTreeMap::new();
        for agg in aggregates {
            let total = rows.iter().map(|r| r.aggregate(agg)).sum::<f64>();
            values.insert(agg.field.clone(), total);
        }
        Self {
            values,
            count: rows.iter().map(GroupRow::count).sum(),
        }
    }

    /// Grand total of an aggregated field; zero if it was not requested.
    pub fn value(&self, field: &str) -> f64 {
        self.values.get(field).copied().unwrap_or(0.0)
    }

    /// Number of matching records.
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Result of [`RpcClient::read_group_with_total`](crate::RpcClient::read_group_with_total).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTotals {
    groups: Vec<GroupRow>,
    grand_total: GrandTotal,
    group_limit: Option<u32>,
}

impl GroupedTotals {
    pub(crate) fn new(groups: Vec<GroupRow>, grand_total: GrandTotal, group_limit: Option<u32>) -> Self {
        Self {
            groups,
            grand_total,
            group_limit,
        }
    }

    /// The (possibly limited) groups, in the order the remote returned them.
    pub fn groups(&self) -> &[GroupRow] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<GroupRow> {
        self.groups
    }

    pub fn grand_total(&self) -> &GrandTotal {
        &self.grand_total
    }

    pub fn group_limit(&self) -> Option<u32> {
        self.group_limit
    }

    /// Whether matching records exist outside the returned groups.
    pub fn is_truncated(&self) -> bool {
        let shown: u64 = self.groups.iter().map(GroupRow::count).sum();
        shown < self.grand_total.count
    }

    /// Portion of `field` not covered by the returned groups.
    pub fn remainder(&self, field: &str) -> f64 {
        let shown: f64 = self.groups.iter().map(|g| g.number(field)).sum();
        self.grand_total.value(field) - shown
    }
}
