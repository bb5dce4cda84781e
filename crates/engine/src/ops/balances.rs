use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Currency, Expense, Money, ResultEngine, Settlement, Split,
    balance::{self, MemberBalance, SETTLEMENT_EPSILON, Transfer},
    expenses, groups, settlements, splits,
};

use super::{Engine, SettlementPolicy, with_tx};

/// A group's computed balance sheet: per-member net positions plus the
/// transfers that settle them. Recomputed from scratch on every read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSheet {
    pub group_id: String,
    pub currency: Currency,
    pub balances: Vec<MemberBalance>,
    pub transfers: Vec<Transfer>,
    pub residual: Money,
}

/// One group's contribution to a user's dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupBalanceRow {
    pub group_id: String,
    pub group_name: String,
    pub balance: Money,
}

/// A user's position across all their groups. `receivable` totals the
/// groups where others owe the user, `payable` the groups where the user
/// owes, and `net = receivable - payable`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserOverview {
    pub net: Money,
    pub receivable: Money,
    pub payable: Money,
    pub groups: Vec<GroupBalanceRow>,
}

impl Engine {
    /// Computes the group's balance sheet from one consistent snapshot
    /// (any member).
    pub async fn group_balance_sheet(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<BalanceSheet> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_read(&db_tx, group_id, user_id).await?;
            self.balance_sheet_for(&db_tx, &group).await
        })
    }

    /// The caller's position across every group they belong to, one sheet
    /// per group over the same loading path as [`Engine::group_balance_sheet`].
    pub async fn user_balance_overview(&self, user_id: &str) -> ResultEngine<UserOverview> {
        with_tx!(self, |db_tx| {
            let group_models = self.load_user_groups(&db_tx, user_id).await?;

            let mut net = Money::ZERO;
            let mut receivable = Money::ZERO;
            let mut payable = Money::ZERO;
            let mut group_rows = Vec::with_capacity(group_models.len());
            for model in group_models {
                let sheet = self.balance_sheet_for(&db_tx, &model).await?;
                let balance = sheet
                    .balances
                    .iter()
                    .find(|row| row.user_id == user_id)
                    .map(|row| row.balance)
                    .unwrap_or(Money::ZERO);

                net += balance;
                if balance.is_positive() {
                    receivable += balance;
                } else {
                    payable += -balance;
                }
                group_rows.push(GroupBalanceRow {
                    group_id: model.id,
                    group_name: model.name,
                    balance,
                });
            }

            Ok(UserOverview {
                net,
                receivable,
                payable,
                groups: group_rows,
            })
        })
    }

    /// Loads members, expenses, splits and (policy permitting) recorded
    /// settlements inside the caller's transaction, then delegates to the
    /// pure balance core.
    async fn balance_sheet_for(
        &self,
        db: &DatabaseTransaction,
        group: &groups::Model,
    ) -> ResultEngine<BalanceSheet> {
        let members = self.load_group_members(db, &group.id).await?;

        let expense_models = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group.id.clone()))
            .all(db)
            .await?;
        let expense_ids: Vec<String> =
            expense_models.iter().map(|model| model.id.clone()).collect();
        let expense_rows: Vec<Expense> = expense_models
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultEngine<_>>()?;

        let split_rows: Vec<Split> = splits::Entity::find()
            .filter(splits::Column::ExpenseId.is_in(expense_ids))
            .all(db)
            .await?
            .into_iter()
            .map(Split::try_from)
            .collect::<ResultEngine<_>>()?;

        let settlement_rows: Vec<Settlement> = match self.settlement_policy {
            SettlementPolicy::Applied => settlements::Entity::find()
                .filter(settlements::Column::GroupId.eq(group.id.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(Settlement::try_from)
                .collect::<ResultEngine<_>>()?,
            SettlementPolicy::Informational => Vec::new(),
        };

        let balances =
            balance::compute_balances(&members, &expense_rows, &split_rows, &settlement_rows);
        let plan = balance::compute_settlements(&balances);
        if plan.residual > SETTLEMENT_EPSILON {
            tracing::warn!(
                "group {} settlement plan left residual {}",
                group.id,
                plan.residual
            );
        }

        Ok(BalanceSheet {
            group_id: group.id.clone(),
            currency: Currency::try_from(group.currency.as_str()).unwrap_or_default(),
            balances,
            transfers: plan.transfers,
            residual: plan.residual,
        })
    }
}
