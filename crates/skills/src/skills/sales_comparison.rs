use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ledgerlens_query::{combine_domains, datetime_range, state_filter, AggregateRequest, ModelKind};
use ledgerlens_rpc::RpcClient;

use crate::context::SkillContext;
use crate::metrics::Change;
use crate::period::{Period, PeriodInput, PeriodPreset};
use crate::result::SkillError;
use crate::schema::{FieldSpec, InputSchema};
use crate::skill::{Skill, SkillDescriptor};

use super::money;
use super::sales_summary::SALES_STATES;

/// Sales in a period against the period right before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesComparison;

#[derive(Debug, Clone, Deserialize)]
pub struct SalesComparisonInput {
    #[serde(flatten)]
    pub period: PeriodInput,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub period: Period,
    pub revenue: f64,
    pub orders: u64,
    pub average_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesComparisonReport {
    /// The current window was still running, so both windows were cut to
    /// the days elapsed so far.
    pub to_date: bool,
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub revenue: Change,
    pub orders: Change,
    pub average_order_value: Change,
}

async fn period_totals(erp: &RpcClient, state: &str, period: Period) -> Result<PeriodTotals, SkillError> {
    let domain = combine_domains([
        Some(state_filter(state, ModelKind::SaleOrder)),
        Some(datetime_range("date_order", period.start, period.end)),
    ]);
    let total = erp
        .aggregate_total(&AggregateRequest::new("sale.order", domain).sum("amount_total"))
        .await?;
    let revenue = total.value("amount_total");
    let orders = total.count();
    Ok(PeriodTotals {
        period,
        revenue: money(revenue),
        orders,
        average_order_value: if orders == 0 { 0.0 } else { money(revenue / orders as f64) },
    })
}

#[async_trait]
impl Skill for SalesComparison {
    type Input = SalesComparisonInput;
    type Output = SalesComparisonReport;

    fn descriptor(&self) -> SkillDescriptor {
        let schema = InputSchema::new().field(
            FieldSpec::choice("state", "order state to include", &SALES_STATES).default_value("confirmed"),
        );
        SkillDescriptor::new(
            "sales_comparison",
            "Compare revenue, order count and average order value with the previous period, with trend. A period still in progress is compared to date.",
        )
        .tags(&["sales", "revenue", "trend", "comparison"])
        .priority(8)
        .input(PeriodInput::schema_fields(schema, PeriodPreset::ThisMonth))
    }

    async fn run(
        &self,
        input: SalesComparisonInput,
        ctx: &SkillContext,
        erp: &RpcClient,
    ) -> Result<SalesComparisonReport, SkillError> {
        let today = ctx.today();
        let requested = input.period.resolve(today)?;
        let (current_period, previous_period) = requested.elapsed_with_previous(today)?;

        let (current, previous) = tokio::try_join!(
            period_totals(erp, &input.state, current_period),
            period_totals(erp, &input.state, previous_period),
        )?;

        Ok(SalesComparisonReport {
            to_date: requested.is_running(today),
            revenue: Change::between(current.revenue, previous.revenue),
            orders: Change::between(current.orders as f64, previous.orders as f64),
            average_order_value: Change::between(current.average_order_value, previous.average_order_value),
            current,
            previous,
        })
    }
}
