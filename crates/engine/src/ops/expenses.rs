use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    EngineError, Expense, ExpenseCategory, Money, NewExpenseCmd, ResultEngine, Split, SplitSpec,
    UpdateExpenseCmd, balance, expenses, splits, util::parse_uuid,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// Narrowing options for [`Engine::list_expenses`].
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub category: Option<ExpenseCategory>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

impl ExpenseListFilter {
    #[must_use]
    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Expands a split spec into validated rows for `expense`. Every split
/// user must be listed in `members`, and the produced amounts always sum
/// to the expense amount.
fn build_splits(
    expense: &Expense,
    spec: &SplitSpec,
    members: &HashSet<&str>,
) -> ResultEngine<Vec<Split>> {
    match spec {
        SplitSpec::Equal { participants } => {
            let unique: HashSet<&str> = participants.iter().map(String::as_str).collect();
            if unique.len() != participants.len() {
                return Err(EngineError::InvalidSplit(
                    "duplicate split participant".to_string(),
                ));
            }
            for user in participants {
                if !members.contains(user.as_str()) {
                    return Err(EngineError::InvalidSplit(format!(
                        "{user} is not a group member"
                    )));
                }
            }

            // Payer first, so the rounding remainder lands on the person
            // who fronted the money.
            let mut ordered: Vec<&str> = Vec::with_capacity(participants.len());
            if unique.contains(expense.paid_by.as_str()) {
                ordered.push(expense.paid_by.as_str());
            }
            for user in participants {
                if *user != expense.paid_by {
                    ordered.push(user.as_str());
                }
            }

            let shares = balance::equal_shares(expense.amount, ordered.len())?;
            ordered
                .iter()
                .zip(shares)
                .map(|(user, share)| {
                    let mut split = Split::new(expense.id, user, share)?;
                    split.shares = Some(1);
                    Ok(split)
                })
                .collect()
        }
        SplitSpec::Unequal { shares } => {
            if shares.is_empty() {
                return Err(EngineError::InvalidSplit(
                    "participants must be > 0".to_string(),
                ));
            }
            let mut seen: HashSet<&str> = HashSet::new();
            let mut total = Money::ZERO;
            for (user, amount) in shares {
                if !seen.insert(user.as_str()) {
                    return Err(EngineError::InvalidSplit(
                        "duplicate split participant".to_string(),
                    ));
                }
                if !members.contains(user.as_str()) {
                    return Err(EngineError::InvalidSplit(format!(
                        "{user} is not a group member"
                    )));
                }
                total += *amount;
            }
            if total != expense.amount {
                return Err(EngineError::InvalidSplit(format!(
                    "split amounts sum to {total}, expense is {}",
                    expense.amount
                )));
            }
            shares
                .iter()
                .map(|(user, amount)| Split::new(expense.id, user, *amount))
                .collect()
        }
        SplitSpec::Percent { shares } => {
            let mut seen: HashSet<&str> = HashSet::new();
            for (user, _) in shares {
                if !seen.insert(user.as_str()) {
                    return Err(EngineError::InvalidSplit(
                        "duplicate split participant".to_string(),
                    ));
                }
                if !members.contains(user.as_str()) {
                    return Err(EngineError::InvalidSplit(format!(
                        "{user} is not a group member"
                    )));
                }
            }
            let weights: Vec<i32> = shares.iter().map(|(_, bp)| *bp).collect();
            let amounts = balance::percent_shares(expense.amount, &weights)?;
            shares
                .iter()
                .zip(amounts)
                .map(|((user, bp), amount)| {
                    let mut split = Split::new(expense.id, user, amount)?;
                    split.percent_bp = Some(*bp);
                    Ok(split)
                })
                .collect()
        }
    }
}

impl Engine {
    /// Record an expense with its splits (any group member).
    pub async fn new_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<String> {
        let title = normalize_required_name(&cmd.title, "expense")?;

        with_tx!(self, |db_tx| {
            let group = self
                .require_group_read(&db_tx, &cmd.group_id, &cmd.user_id)
                .await?;
            let member_rows = self.group_member_rows(&db_tx, &group.id).await?;
            let members: HashSet<&str> =
                member_rows.iter().map(|row| row.user_id.as_str()).collect();
            if !members.contains(cmd.paid_by.as_str()) {
                return Err(EngineError::InvalidAmount(
                    "paid_by must be a group member".to_string(),
                ));
            }

            let mut expense = Expense::new(
                group.id.clone(),
                title,
                cmd.category,
                cmd.amount,
                normalize_optional_text(cmd.description.as_deref()),
                cmd.receipt_ref.clone(),
                cmd.paid_by.clone(),
                cmd.expense_date,
                cmd.user_id.clone(),
            )?;
            expense.splits = build_splits(&expense, &cmd.split, &members)?;

            let expense_model: expenses::ActiveModel = (&expense).into();
            expense_model.insert(&db_tx).await?;
            for split in &expense.splits {
                let split_model: splits::ActiveModel = split.into();
                split_model.insert(&db_tx).await?;
            }

            Ok(expense.id.to_string())
        })
    }

    /// Edit an expense (any group member). The stored split rows are
    /// replaced wholesale when a new split spec is given, and one is
    /// required whenever the amount changes.
    pub async fn update_expense(&self, cmd: UpdateExpenseCmd) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_read(&db_tx, &cmd.group_id, &cmd.user_id)
                .await?;
            let expense_uuid = parse_uuid(&cmd.expense_id, "expense")?;
            let current = self
                .require_expense_in_group(&db_tx, &cmd.group_id, expense_uuid)
                .await?;
            let mut expense = Expense::try_from(current)?;

            if let Some(title) = &cmd.title {
                expense.title = normalize_required_name(title, "expense")?;
            }
            if let Some(amount) = cmd.amount {
                if !amount.is_positive() {
                    return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
                }
                expense.amount = amount;
            }
            if let Some(category) = cmd.category {
                expense.category = category;
            }
            if let Some(paid_by) = &cmd.paid_by {
                expense.paid_by = paid_by.clone();
            }
            if let Some(expense_date) = cmd.expense_date {
                expense.expense_date = expense_date;
            }
            if let Some(description) = &cmd.description {
                expense.description = normalize_optional_text(Some(description));
            }
            if let Some(receipt_ref) = &cmd.receipt_ref {
                expense.receipt_ref = Some(receipt_ref.clone());
            }

            let member_rows = self.group_member_rows(&db_tx, &cmd.group_id).await?;
            let members: HashSet<&str> =
                member_rows.iter().map(|row| row.user_id.as_str()).collect();
            if !members.contains(expense.paid_by.as_str()) {
                return Err(EngineError::InvalidAmount(
                    "paid_by must be a group member".to_string(),
                ));
            }

            let spec = match (&cmd.split, cmd.amount) {
                (Some(spec), _) => Some(spec),
                (None, Some(_)) => {
                    return Err(EngineError::InvalidSplit(
                        "split must be provided when the amount changes".to_string(),
                    ));
                }
                (None, None) => None,
            };
            let rebuilt = if let Some(spec) = spec {
                expense.splits = build_splits(&expense, spec, &members)?;
                true
            } else {
                false
            };

            let expense_model: expenses::ActiveModel = (&expense).into();
            expense_model.update(&db_tx).await?;

            if rebuilt {
                splits::Entity::delete_many()
                    .filter(splits::Column::ExpenseId.eq(expense.id.to_string()))
                    .exec(&db_tx)
                    .await?;
                for split in &expense.splits {
                    let split_model: splits::ActiveModel = split.into();
                    split_model.insert(&db_tx).await?;
                }
            }

            Ok(())
        })
    }

    /// Delete an expense and its splits (any group member).
    pub async fn delete_expense(
        &self,
        group_id: &str,
        expense_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_read(&db_tx, group_id, user_id).await?;
            let expense_uuid = parse_uuid(expense_id, "expense")?;
            let model = self
                .require_expense_in_group(&db_tx, group_id, expense_uuid)
                .await?;

            splits::Entity::delete_many()
                .filter(splits::Column::ExpenseId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_by_id(model.id).exec(&db_tx).await?;

            Ok(())
        })
    }

    /// One expense with its splits (any group member).
    pub async fn expense_detail(
        &self,
        group_id: &str,
        expense_id: &str,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            self.require_group_read(&db_tx, group_id, user_id).await?;
            let expense_uuid = parse_uuid(expense_id, "expense")?;
            let model = self
                .require_expense_in_group(&db_tx, group_id, expense_uuid)
                .await?;

            let mut expense = Expense::try_from(model)?;
            let split_models = splits::Entity::find()
                .filter(splits::Column::ExpenseId.eq(expense.id.to_string()))
                .order_by_asc(splits::Column::UserId)
                .all(&db_tx)
                .await?;
            expense.splits = split_models
                .into_iter()
                .map(Split::try_from)
                .collect::<ResultEngine<Vec<Split>>>()?;

            Ok(expense)
        })
    }

    /// The group's expenses, newest first (any group member). Splits are
    /// not loaded here; use [`Engine::expense_detail`] for one expense.
    pub async fn list_expenses(
        &self,
        group_id: &str,
        user_id: &str,
        filter: ExpenseListFilter,
    ) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_read(&db_tx, group_id, user_id).await?;

            let mut query = expenses::Entity::find()
                .filter(expenses::Column::GroupId.eq(group.id.clone()));
            if let Some(category) = filter.category {
                query = query.filter(expenses::Column::Category.eq(category.as_str().to_string()));
            }
            if let Some(since) = filter.since {
                query = query.filter(expenses::Column::ExpenseDate.gte(since));
            }
            if let Some(until) = filter.until {
                query = query.filter(expenses::Column::ExpenseDate.lte(until));
            }
            let models = query
                .order_by_desc(expenses::Column::ExpenseDate)
                .order_by_asc(expenses::Column::Id)
                .limit(filter.limit)
                .all(&db_tx)
                .await?;

            models.into_iter().map(Expense::try_from).collect()
        })
    }
}
