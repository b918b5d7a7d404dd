//! Built-in skills.

mod cash_position;
mod receivables_aging;
mod sales_comparison;
mod sales_summary;
mod stock_levels;
mod top_products;

pub use cash_position::{CashPosition, CashPositionInput, CashPositionReport, JournalBalance};
pub use receivables_aging::{Debtor, ReceivablesAging, ReceivablesAgingInput, ReceivablesReport};
pub use sales_comparison::{PeriodTotals, SalesComparison, SalesComparisonInput, SalesComparisonReport};
pub use sales_summary::{CustomerRevenue, SalesSummary, SalesSummaryInput, SalesSummaryReport};
pub use stock_levels::{ProductStock, StockLevels, StockLevelsInput, StockLevelsReport};
pub use top_products::{ProductSales, TopProducts, TopProductsInput, TopProductsReport};

use ledgerlens_query::{GroupBy, GroupRow, Relation};

use crate::metrics::round_to;
use crate::registry::SkillRegistry;
use crate::result::SkillError;

pub fn register_builtin(registry: &mut SkillRegistry) -> Result<(), SkillError> {
    registry.register(SalesSummary)?;
    registry.register(SalesComparison)?;
    registry.register(ReceivablesAging)?;
    registry.register(StockLevels)?;
    registry.register(CashPosition)?;
    registry.register(TopProducts)?;
    Ok(())
}

/// Groups keyed by a set relation. The unset (`false`) group is skipped so it
/// never shows up as a phantom entry.
pub(crate) fn related_groups<'a>(
    groups: &'a [GroupRow],
    by: &'a GroupBy,
) -> impl Iterator<Item = (Relation, &'a GroupRow)> + 'a {
    groups
        .iter()
        .filter_map(move |g| g.key_relation(by).map(|rel| (rel, g)))
}

pub(crate) fn money(value: f64) -> f64 {
    round_to(value, 2)
}
