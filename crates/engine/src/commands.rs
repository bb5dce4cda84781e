//! Command structs for engine operations.
//!
//! These types group parameters for write operations (expense
//! record/update, settlement), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};

use crate::{ExpenseCategory, Money};

/// How an expense is divided between members.
///
/// `Equal` lists the participating usernames; the payer's share absorbs
/// the rounding remainder. `Unequal` gives explicit amounts that must sum
/// to the expense amount. `Percent` gives weights in basis points that
/// must sum to 10 000.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitSpec {
    Equal { participants: Vec<String> },
    Unequal { shares: Vec<(String, Money)> },
    Percent { shares: Vec<(String, i32)> },
}

/// Record a new expense with its splits.
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub group_id: String,
    pub user_id: String,
    pub title: String,
    pub amount: Money,
    pub category: ExpenseCategory,
    pub paid_by: String,
    pub expense_date: DateTime<Utc>,
    pub description: Option<String>,
    pub receipt_ref: Option<String>,
    pub split: SplitSpec,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        amount: Money,
        paid_by: impl Into<String>,
        expense_date: DateTime<Utc>,
        split: SplitSpec,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
            title: title.into(),
            amount,
            category: ExpenseCategory::Other,
            paid_by: paid_by.into(),
            expense_date,
            description: None,
            receipt_ref: None,
            split,
        }
    }

    #[must_use]
    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn receipt_ref(mut self, receipt_ref: impl Into<String>) -> Self {
        self.receipt_ref = Some(receipt_ref.into());
        self
    }
}

/// Update an existing expense. Unset fields keep their stored value.
///
/// Changing the amount requires a new [`SplitSpec`], since the stored
/// splits would no longer sum to the expense amount.
#[derive(Clone, Debug)]
pub struct UpdateExpenseCmd {
    pub group_id: String,
    pub expense_id: String,
    pub user_id: String,

    pub title: Option<String>,
    pub amount: Option<Money>,
    pub category: Option<ExpenseCategory>,
    pub paid_by: Option<String>,
    pub expense_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub receipt_ref: Option<String>,
    pub split: Option<SplitSpec>,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        expense_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            expense_id: expense_id.into(),
            user_id: user_id.into(),
            title: None,
            amount: None,
            category: None,
            paid_by: None,
            expense_date: None,
            description: None,
            receipt_ref: None,
            split: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn paid_by(mut self, paid_by: impl Into<String>) -> Self {
        self.paid_by = Some(paid_by.into());
        self
    }

    #[must_use]
    pub fn expense_date(mut self, expense_date: DateTime<Utc>) -> Self {
        self.expense_date = Some(expense_date);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn receipt_ref(mut self, receipt_ref: impl Into<String>) -> Self {
        self.receipt_ref = Some(receipt_ref.into());
        self
    }

    #[must_use]
    pub fn split(mut self, split: SplitSpec) -> Self {
        self.split = Some(split);
        self
    }
}

/// Record a repayment between two members.
#[derive(Clone, Debug)]
pub struct RecordSettlementCmd {
    pub group_id: String,
    pub user_id: String,
    pub from: String,
    pub to: String,
    pub amount: Money,
    pub settled_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl RecordSettlementCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: Money,
        settled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
            from: from.into(),
            to: to.into(),
            amount,
            settled_at,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
