use std::collections::HashMap;

use chrono::{Datelike, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{Currency, Expense, ExpenseCategory, Money, ResultEngine, expenses};

use super::{Engine, with_tx};

/// Spending statistics for one group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupStats {
    pub group_id: String,
    pub currency: Currency,
    pub total_spent: Money,
    pub expense_count: u64,
    pub average_expense: Money,
    pub categories: Vec<CategoryStat>,
    pub members: Vec<MemberSpend>,
    pub monthly: Vec<MonthlyTotal>,
}

/// Total spent in one category and its share of all spending, in basis
/// points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryStat {
    pub category: ExpenseCategory,
    pub total: Money,
    pub share_bp: i32,
}

/// Total a member has paid for the group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSpend {
    pub user_id: String,
    pub display_name: String,
    pub paid: Money,
}

/// Spending in one calendar month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total: Money,
}

impl Engine {
    /// Spending statistics for a group (any member): totals, per-category
    /// and per-member breakdowns, and a monthly series for the trailing
    /// `months` calendar months (default 6, clamped to five years), oldest
    /// first with empty months at zero.
    pub async fn group_statistics(
        &self,
        group_id: &str,
        user_id: &str,
        months: Option<u32>,
    ) -> ResultEngine<GroupStats> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_read(&db_tx, group_id, user_id).await?;
            let members = self.load_group_members(&db_tx, &group.id).await?;

            let expense_rows: Vec<Expense> = expenses::Entity::find()
                .filter(expenses::Column::GroupId.eq(group.id.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Expense::try_from)
                .collect::<ResultEngine<_>>()?;

            let expense_count = expense_rows.len() as u64;
            let total_spent = expense_rows
                .iter()
                .fold(Money::ZERO, |acc, expense| acc + expense.amount);
            let average_expense = if expense_count == 0 {
                Money::ZERO
            } else {
                Money::new(total_spent.minor() / expense_count as i64)
            };

            let mut category_totals: HashMap<ExpenseCategory, Money> = HashMap::new();
            for expense in &expense_rows {
                *category_totals.entry(expense.category).or_insert(Money::ZERO) += expense.amount;
            }
            let mut categories: Vec<CategoryStat> = category_totals
                .into_iter()
                .map(|(category, total)| {
                    let share_bp = if total_spent.is_positive() {
                        (total.minor() * 10_000 / total_spent.minor()) as i32
                    } else {
                        0
                    };
                    CategoryStat {
                        category,
                        total,
                        share_bp,
                    }
                })
                .collect();
            categories.sort_by(|a, b| {
                b.total
                    .cmp(&a.total)
                    .then_with(|| a.category.as_str().cmp(b.category.as_str()))
            });

            let positions: HashMap<&str, usize> = members
                .iter()
                .enumerate()
                .map(|(position, member)| (member.user_id.as_str(), position))
                .collect();
            let mut member_rows: Vec<MemberSpend> = members
                .iter()
                .map(|member| MemberSpend {
                    user_id: member.user_id.clone(),
                    display_name: member.display_name.clone(),
                    paid: Money::ZERO,
                })
                .collect();
            for expense in &expense_rows {
                if let Some(&position) = positions.get(expense.paid_by.as_str()) {
                    member_rows[position].paid += expense.amount;
                }
            }
            member_rows.sort_by(|a, b| b.paid.cmp(&a.paid));

            let months = months.unwrap_or(6).clamp(1, 60);
            let now = Utc::now();
            let mut buckets: Vec<(i32, u32)> = Vec::with_capacity(months as usize);
            let (mut year, mut month) = (now.year(), now.month());
            for _ in 0..months {
                buckets.push((year, month));
                if month == 1 {
                    year -= 1;
                    month = 12;
                } else {
                    month -= 1;
                }
            }
            buckets.reverse();

            let mut month_totals: HashMap<(i32, u32), Money> = HashMap::new();
            for expense in &expense_rows {
                let key = (expense.expense_date.year(), expense.expense_date.month());
                *month_totals.entry(key).or_insert(Money::ZERO) += expense.amount;
            }
            let monthly = buckets
                .into_iter()
                .map(|(year, month)| MonthlyTotal {
                    year,
                    month,
                    total: month_totals.get(&(year, month)).copied().unwrap_or(Money::ZERO),
                })
                .collect();

            Ok(GroupStats {
                group_id: group.id,
                currency: Currency::try_from(group.currency.as_str()).unwrap_or_default(),
                total_spent,
                expense_count,
                average_expense,
                categories,
                members: member_rows,
                monthly,
            })
        })
    }
}
