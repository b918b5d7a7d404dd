use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ledgerlens_query::{combine_domains, AggregateRequest, Domain, GroupBy, Operator};
use ledgerlens_rpc::RpcClient;

use crate::context::SkillContext;
use crate::metrics::round_to;
use crate::result::SkillError;
use crate::schema::{FieldSpec, InputSchema};
use crate::skill::{Skill, SkillDescriptor};

use super::{money, related_groups};

/// On-hand quantity per product across internal locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockLevels;

#[derive(Debug, Clone, Deserialize)]
pub struct StockLevelsInput {
    pub product: Option<String>,
    pub low_stock_threshold: Option<f64>,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStock {
    pub product_id: i64,
    pub product: String,
    pub quantity: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLevelsReport {
    pub products: Vec<ProductStock>,
    /// More products matched than `limit` allowed to list.
    pub truncated: bool,
    pub total_quantity: f64,
    pub total_value: f64,
    pub low_stock_threshold: Option<f64>,
    pub low_stock: Vec<ProductStock>,
}

#[async_trait]
impl Skill for StockLevels {
    type Input = StockLevelsInput;
    type Output = StockLevelsReport;

    fn descriptor(&self) -> SkillDescriptor {
        SkillDescriptor::new(
            "stock_levels",
            "Current on-hand stock quantity and value per product in internal warehouses, flagging low stock.",
        )
        .tags(&["inventory", "stock", "products"])
        .priority(7)
        .input(
            InputSchema::new()
                .field(FieldSpec::string("product", "product name or reference to search for"))
                .field(FieldSpec::number(
                    "low_stock_threshold",
                    "quantity at or below which a product counts as low stock",
                    Some(0.0),
                    None,
                ))
                .field(FieldSpec::integer("limit", "how many products to list", Some(1), Some(200)).default_value(20)),
        )
    }

    async fn run(
        &self,
        input: StockLevelsInput,
        _ctx: &SkillContext,
        erp: &RpcClient,
    ) -> Result<StockLevelsReport, SkillError> {
        let product_filter = input
            .product
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| Domain::leaf("product_id", Operator::ILike, p));
        let domain = combine_domains([Some(Domain::leaf("location_id.usage", Operator::Eq, "internal")), product_filter]);

        // lowest first when hunting for low stock, so the limit keeps the relevant ones
        let order = if input.low_stock_threshold.is_some() {
            "quantity asc"
        } else {
            "quantity desc"
        };
        let by_product = GroupBy::field("product_id");
        let request = AggregateRequest::new("stock.quant", domain)
            .sum("quantity")
            .sum("value")
            .group_by(by_product.clone())
            .limit(input.limit.saturating_add(1))
            .order_by(order);

        let totals = erp.read_group_with_total(&request).await?;

        let listed: Vec<_> = related_groups(totals.groups(), &by_product)
            .take(input.limit as usize)
            .collect();
        let listed_records: u64 = listed.iter().map(|(_, g)| g.count()).sum();
        let products: Vec<ProductStock> = listed
            .into_iter()
            .map(|(product, g)| ProductStock {
                product_id: product.id,
                product: product.label(),
                quantity: round_to(g.number("quantity"), 3),
                value: money(g.number("value")),
            })
            .collect();

        let low_stock = match input.low_stock_threshold {
            Some(threshold) => products.iter().filter(|p| p.quantity <= threshold).cloned().collect(),
            None => Vec::new(),
        };

        Ok(StockLevelsReport {
            truncated: listed_records < totals.grand_total().count(),
            total_quantity: round_to(totals.grand_total().value("quantity"), 3),
            total_value: money(totals.grand_total().value("value")),
            low_stock_threshold: input.low_stock_threshold,
            low_stock,
            products,
        })
    }
}
