use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ledgerlens_query::{
    combine_domains, datetime_range, state_filter, AggregateRequest, Domain, GroupBy, ModelKind, Operator,
};
use ledgerlens_rpc::RpcClient;

use crate::context::SkillContext;
use crate::metrics::{round_to, share_of};
use crate::period::{Period, PeriodInput, PeriodPreset};
use crate::result::SkillError;
use crate::schema::{FieldSpec, InputSchema};
use crate::skill::{Skill, SkillDescriptor};

use super::{money, related_groups};

/// Best-selling products in a period, from confirmed order lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopProducts;

#[derive(Debug, Clone, Deserialize)]
pub struct TopProductsInput {
    #[serde(flatten)]
    pub period: PeriodInput,
    pub limit: u32,
    pub rank_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub rank: u32,
    pub product_id: i64,
    pub product: String,
    pub revenue: f64,
    pub quantity: f64,
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProductsReport {
    pub period: Period,
    pub rank_by: String,
    pub total_revenue: f64,
    pub total_quantity: f64,
    pub products: Vec<ProductSales>,
    /// Revenue from products outside the ranking.
    pub other_revenue: f64,
}

#[async_trait]
impl Skill for TopProducts {
    type Input = TopProductsInput;
    type Output = TopProductsReport;

    fn descriptor(&self) -> SkillDescriptor {
        let schema = InputSchema::new()
            .field(FieldSpec::integer("limit", "how many products to rank", Some(1), Some(100)).default_value(10))
            .field(FieldSpec::choice("rank_by", "ranking measure", &["revenue", "quantity"]).default_value("revenue"));
        SkillDescriptor::new(
            "top_products",
            "Best-selling products by revenue or quantity for a period, with each product's share of sales.",
        )
        .tags(&["sales", "products", "ranking"])
        .priority(5)
        .input(PeriodInput::schema_fields(schema, PeriodPreset::ThisMonth))
    }

    async fn run(
        &self,
        input: TopProductsInput,
        ctx: &SkillContext,
        erp: &RpcClient,
    ) -> Result<TopProductsReport, SkillError> {
        let period = input.period.resolve(ctx.today())?;
        let domain = combine_domains([
            Some(state_filter("confirmed", ModelKind::SaleOrder)),
            Some(datetime_range("order_id.date_order", period.start, period.end)),
            Some(Domain::leaf("display_type", Operator::Eq, false)),
        ]);

        let order = match input.rank_by.as_str() {
            "quantity" => "product_uom_qty desc",
            _ => "price_subtotal desc",
        };
        let by_product = GroupBy::field("product_id");
        let request = AggregateRequest::new("sale.order.line", domain)
            .sum("price_subtotal")
            .sum("product_uom_qty")
            .group_by(by_product.clone())
            .limit(input.limit.saturating_add(1))
            .order_by(order);
        let totals = erp.read_group_with_total(&request).await?;
        let total_revenue = totals.grand_total().value("price_subtotal");

        let products: Vec<ProductSales> = related_groups(totals.groups(), &by_product)
            .take(input.limit as usize)
            .zip(1..)
            .map(|((product, g), rank)| {
                let revenue = g.number("price_subtotal");
                ProductSales {
                    rank,
                    product_id: product.id,
                    product: product.label(),
                    revenue: money(revenue),
                    quantity: round_to(g.number("product_uom_qty"), 3),
                    share_pct: share_of(revenue, total_revenue),
                }
            })
            .collect();
        let shown: f64 = products.iter().map(|p| p.revenue).sum();

        Ok(TopProductsReport {
            period,
            rank_by: input.rank_by,
            total_revenue: money(total_revenue),
            total_quantity: round_to(totals.grand_total().value("product_uom_qty"), 3),
            products,
            other_revenue: money(total_revenue - shown),
        })
    }
}
