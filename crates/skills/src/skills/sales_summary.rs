use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ledgerlens_query::{combine_domains, datetime_range, state_filter, AggregateRequest, GroupBy, ModelKind};
use ledgerlens_rpc::RpcClient;

use crate::context::SkillContext;
use crate::metrics::share_of;
use crate::period::{Period, PeriodInput, PeriodPreset};
use crate::result::SkillError;
use crate::schema::{FieldSpec, InputSchema};
use crate::skill::{Skill, SkillDescriptor};

use super::{money, related_groups};

pub const SALES_STATES: [&str; 6] = ["confirmed", "draft", "sent", "done", "cancelled", "all"];

/// Revenue, order count and best customers for a period.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesSummary;

#[derive(Debug, Clone, Deserialize)]
pub struct SalesSummaryInput {
    #[serde(flatten)]
    pub period: PeriodInput,
    pub state: String,
    pub top_customers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRevenue {
    pub customer_id: i64,
    pub customer: String,
    pub revenue: f64,
    pub orders: u64,
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummaryReport {
    pub period: Period,
    pub state: String,
    pub total_revenue: f64,
    pub order_count: u64,
    pub average_order_value: f64,
    pub top_customers: Vec<CustomerRevenue>,
    /// Revenue from customers outside the top list.
    pub other_revenue: f64,
}

#[async_trait]
impl Skill for SalesSummary {
    type Input = SalesSummaryInput;
    type Output = SalesSummaryReport;

    fn descriptor(&self) -> SkillDescriptor {
        let schema = InputSchema::new()
            .field(
                FieldSpec::choice("state", "order state to include", &SALES_STATES).default_value("confirmed"),
            )
            .field(
                FieldSpec::integer("top_customers", "how many customers to rank", Some(1), Some(50))
                    .default_value(5),
            );
        SkillDescriptor::new(
            "sales_summary",
            "Total sales revenue, number of orders, average order value and top customers for a period.",
        )
        .tags(&["sales", "revenue", "customers"])
        .priority(10)
        .input(PeriodInput::schema_fields(schema, PeriodPreset::ThisMonth))
    }

    async fn run(
        &self,
        input: SalesSummaryInput,
        ctx: &SkillContext,
        erp: &RpcClient,
    ) -> Result<SalesSummaryReport, SkillError> {
        let period = input.period.resolve(ctx.today())?;
        let domain = combine_domains([
            Some(state_filter(&input.state, ModelKind::SaleOrder)),
            Some(datetime_range("date_order", period.start, period.end)),
        ]);

        let by_customer = GroupBy::field("partner_id");
        let request = AggregateRequest::new("sale.order", domain)
            .sum("amount_total")
            .group_by(by_customer.clone())
            // one spare group in case the unset-customer bucket ranks among them
            .limit(input.top_customers.saturating_add(1))
            .order_by("amount_total desc");

        let totals = erp.read_group_with_total(&request).await?;
        let grand = totals.grand_total();
        let total_revenue = grand.value("amount_total");
        let order_count = grand.count();

        let top_customers: Vec<CustomerRevenue> = related_groups(totals.groups(), &by_customer)
            .take(input.top_customers as usize)
            .map(|(customer, g)| {
                let revenue = g.number("amount_total");
                CustomerRevenue {
                    customer_id: customer.id,
                    customer: customer.label(),
                    revenue: money(revenue),
                    orders: g.count(),
                    share_pct: share_of(revenue, total_revenue),
                }
            })
            .collect();

        let shown: f64 = top_customers.iter().map(|c| c.revenue).sum();
        let average_order_value = if order_count == 0 {
            0.0
        } else {
            money(total_revenue / order_count as f64)
        };

        Ok(SalesSummaryReport {
            period,
            state: input.state,
            total_revenue: money(total_revenue),
            order_count,
            average_order_value,
            top_customers,
            other_revenue: money(total_revenue - shown),
        })
    }
}
