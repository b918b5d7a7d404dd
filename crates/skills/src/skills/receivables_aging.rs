use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ledgerlens_query::{
    combine_domains, invoice_type_filter, payment_state_filter, state_filter, Domain, ModelKind, Operator,
    QueryRequest, Relation, SearchOptions,
};
use ledgerlens_rpc::RpcClient;

use crate::context::SkillContext;
use crate::metrics::{age_items, BucketTotal};
use crate::result::SkillError;
use crate::schema::{FieldSpec, InputSchema};
use crate::skill::{Skill, SkillDescriptor};

use super::money;

const FIELDS: [&str; 5] = ["name", "partner_id", "invoice_date", "invoice_date_due", "amount_residual"];

/// Open customer invoices bucketed by days past due.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceivablesAging;

#[derive(Debug, Clone, Deserialize)]
pub struct ReceivablesAgingInput {
    pub as_of: Option<NaiveDate>,
    pub top_debtors: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Debtor {
    pub customer_id: i64,
    pub customer: String,
    pub outstanding: f64,
    pub invoices: u64,
    pub oldest_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceivablesReport {
    pub as_of: NaiveDate,
    pub total_outstanding: f64,
    pub overdue_amount: f64,
    pub invoice_count: u64,
    pub buckets: Vec<BucketTotal>,
    pub weighted_average_age_days: Option<i64>,
    pub top_debtors: Vec<Debtor>,
}

fn date_field(row: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    row.get(key)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok())
}

/// Days past due; invoices without a due date age from their invoice date.
fn days_past_due(row: &Map<String, Value>, as_of: NaiveDate) -> i64 {
    date_field(row, "invoice_date_due")
        .or_else(|| date_field(row, "invoice_date"))
        .map(|due| (as_of - due).num_days())
        .unwrap_or(0)
}

#[async_trait]
impl Skill for ReceivablesAging {
    type Input = ReceivablesAgingInput;
    type Output = ReceivablesReport;

    fn descriptor(&self) -> SkillDescriptor {
        SkillDescriptor::new(
            "receivables_aging",
            "Outstanding customer invoices grouped into 0-30, 31-60, 61-90 and 90+ days past due, with the customers owing most.",
        )
        .tags(&["receivables", "invoices", "aging", "customers"])
        .priority(9)
        .input(
            InputSchema::new()
                .field(FieldSpec::date("as_of", "reference date for ages; defaults to today"))
                .field(
                    FieldSpec::integer("top_debtors", "how many customers to rank", Some(1), Some(50))
                        .default_value(5),
                ),
        )
    }

    async fn run(
        &self,
        input: ReceivablesAgingInput,
        ctx: &SkillContext,
        erp: &RpcClient,
    ) -> Result<ReceivablesReport, SkillError> {
        let as_of = input.as_of.unwrap_or_else(|| ctx.today());
        let domain = combine_domains([
            Some(invoice_type_filter("customer_invoice")),
            Some(state_filter("posted", ModelKind::Invoice)),
            Some(payment_state_filter("open")),
            Some(Domain::leaf("invoice_date", Operator::Le, as_of)),
        ]);
        // every open invoice is needed for the totals, so no row limit
        let request = QueryRequest::new("account.move", domain).with_options(
            SearchOptions::default()
                .fields(FIELDS)
                .unlimited()
                .order("invoice_date_due asc, id asc"),
        );
        let rows = erp.search_read(&request).await?;

        let mut items = Vec::with_capacity(rows.len());
        let mut debtors: HashMap<i64, Debtor> = HashMap::new();
        for row in &rows {
            let amount = row.get("amount_residual").and_then(Value::as_f64).unwrap_or(0.0);
            let age = days_past_due(row, as_of);
            items.push((amount, age));

            let Some(customer) = row.get("partner_id").and_then(Relation::from_value) else {
                continue;
            };
            let d = debtors.entry(customer.id).or_insert_with(|| Debtor {
                customer_id: customer.id,
                customer: customer.label(),
                outstanding: 0.0,
                invoices: 0,
                oldest_days: age,
            });
            d.outstanding += amount;
            d.invoices += 1;
            d.oldest_days = d.oldest_days.max(age);
        }

        let aging = age_items(&items);
        let overdue: f64 = items.iter().filter(|(_, age)| *age > 0).map(|(a, _)| a).sum();

        let mut top_debtors: Vec<Debtor> = debtors.into_values().collect();
        top_debtors.sort_by(|a, b| {
            b.outstanding
                .total_cmp(&a.outstanding)
                .then_with(|| a.customer.cmp(&b.customer))
        });
        top_debtors.truncate(input.top_debtors as usize);
        for d in &mut top_debtors {
            d.outstanding = money(d.outstanding);
        }

        Ok(ReceivablesReport {
            as_of,
            total_outstanding: aging.total,
            overdue_amount: money(overdue),
            invoice_count: rows.len() as u64,
            buckets: aging.buckets,
            weighted_average_age_days: aging.weighted_average_age,
            top_debtors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn age_counts_from_due_date_then_invoice_date() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let due = row(json!({"invoice_date": "2024-01-01", "invoice_date_due": "2024-03-01"}));
        assert_eq!(days_past_due(&due, as_of), 30);
        let no_due = row(json!({"invoice_date": "2024-03-21", "invoice_date_due": false}));
        assert_eq!(days_past_due(&no_due, as_of), 10);
        assert_eq!(days_past_due(&row(json!({})), as_of), 0);
    }
}
