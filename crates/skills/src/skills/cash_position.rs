use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerlens_query::{combine_domains, AggregateRequest, Domain, GroupBy, Operator};
use ledgerlens_rpc::RpcClient;

use crate::context::SkillContext;
use crate::result::SkillError;
use crate::schema::{FieldSpec, InputSchema};
use crate::skill::{Skill, SkillDescriptor};

use super::{money, related_groups};

/// Cash held per bank and cash journal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashPosition;

#[derive(Debug, Clone, Deserialize)]
pub struct CashPositionInput {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalBalance {
    pub journal_id: i64,
    pub journal: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashPositionReport {
    pub as_of: NaiveDate,
    pub total_cash: f64,
    pub journals: Vec<JournalBalance>,
}

#[async_trait]
impl Skill for CashPosition {
    type Input = CashPositionInput;
    type Output = CashPositionReport;

    fn descriptor(&self) -> SkillDescriptor {
        SkillDescriptor::new(
            "cash_position",
            "Current cash and bank balances per journal and in total, from posted accounting entries.",
        )
        .tags(&["cash", "bank", "accounting"])
        .priority(6)
        .input(InputSchema::new().field(FieldSpec::date("as_of", "balance date; defaults to today")))
    }

    async fn run(
        &self,
        input: CashPositionInput,
        ctx: &SkillContext,
        erp: &RpcClient,
    ) -> Result<CashPositionReport, SkillError> {
        let as_of = input.as_of.unwrap_or_else(|| ctx.today());
        let domain = combine_domains([
            Some(Domain::leaf("journal_id.type", Operator::In, vec!["bank", "cash"])),
            Some(Domain::leaf("account_id.account_type", Operator::Eq, "asset_cash")),
            Some(Domain::leaf("parent_state", Operator::Eq, "posted")),
            Some(Domain::leaf("date", Operator::Le, as_of)),
        ]);

        let by_journal = GroupBy::field("journal_id");
        let request = AggregateRequest::new("account.move.line", domain)
            .sum("balance")
            .group_by(by_journal.clone())
            .unlimited()
            .order_by("balance desc");
        let totals = erp.read_group_with_total(&request).await?;

        let mut journals: Vec<JournalBalance> = related_groups(totals.groups(), &by_journal)
            .map(|(journal, g)| JournalBalance {
                journal_id: journal.id,
                journal: journal.label(),
                balance: money(g.number("balance")),
            })
            .collect();
        journals.sort_by(|a, b| b.balance.total_cmp(&a.balance).then_with(|| a.journal.cmp(&b.journal)));

        Ok(CashPositionReport {
            as_of,
            total_cash: money(totals.grand_total().value("balance")),
            journals,
        })
    }
}
