use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub currency: Option<Currency>,
        pub description: Option<String>,
    }

    /// Request body for the group snapshot, by id or by name.
    ///
    /// Name lookup is case-insensitive and scoped to groups the caller
    /// belongs to.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupGet {
        pub id: Option<String>,
        pub name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupCreated {
        pub id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        /// Username of the group creator.
        pub owner: String,
        pub currency: Currency,
        /// RFC3339 timestamp.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupsResponse {
        pub groups: Vec<GroupView>,
    }
}

pub mod user {
    use super::*;

    /// Request body for updating the caller's profile.
    ///
    /// Absent fields keep their stored value.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub display_name: Option<String>,
        pub email: Option<String>,
        pub avatar_ref: Option<String>,
    }
}

pub mod member {
    use super::*;

    /// Role of a user in a group.
    ///
    /// The server treats roles as:
    /// - `admin`: can manage the group, its members, and delete it.
    /// - `member`: can record expenses and settlements.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MembershipRole {
        Admin,
        Member,
    }

    impl MembershipRole {
        /// Returns the canonical role string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Admin => "admin",
                Self::Member => "member",
            }
        }
    }

    /// Request body for adding/updating a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpsert {
        pub username: String,
        pub role: MembershipRole,
    }

    /// Response body for listing members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }

    /// A member with their role.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub username: String,
        pub display_name: String,
        pub role: MembershipRole,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SplitKind {
        Equal,
        Unequal,
        Percent,
    }

    /// One participant's share in an `unequal` or `percent` split.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareSpec {
        pub username: String,
        /// Minor units, required for `unequal` splits.
        pub amount_minor: Option<i64>,
        /// Basis points (1% = 100), required for `percent` splits.
        pub percent_bp: Option<i32>,
    }

    /// How to divide the expense between members.
    ///
    /// - `equal`: `participants` share the amount evenly, the payer
    ///   absorbing the rounding remainder.
    /// - `unequal`: `shares` carry explicit amounts that must sum to the
    ///   expense amount.
    /// - `percent`: `shares` carry basis-point weights that must sum to
    ///   10 000.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitRequest {
        pub kind: SplitKind,
        pub participants: Option<Vec<String>>,
        pub shares: Option<Vec<ShareSpec>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub group_id: String,
        pub title: String,
        pub amount_minor: i64,
        pub category: Option<String>,
        /// Defaults to the caller.
        pub paid_by: Option<String>,
        /// RFC3339 timestamp. Optional: if absent, server uses now().
        pub expense_date: Option<DateTime<FixedOffset>>,
        pub description: Option<String>,
        pub receipt_ref: Option<String>,
        pub split: SplitRequest,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: String,
    }

    /// Request body for listing a group's expenses, newest first.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub group_id: String,
        pub category: Option<String>,
        pub since: Option<DateTime<FixedOffset>>,
        pub until: Option<DateTime<FixedOffset>>,
        pub limit: Option<u64>,
    }

    /// Request body for the expense detail.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseGet {
        pub group_id: String,
        /// Expense id (UUID).
        ///
        /// This is serialized as a string in JSON.
        pub expense_id: String,
    }

    /// Request body for deleting an expense (id travels in the path).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseDelete {
        pub group_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub group_id: String,
        pub title: Option<String>,
        /// Changing the amount requires a new `split`.
        pub amount_minor: Option<i64>,
        pub category: Option<String>,
        pub paid_by: Option<String>,
        pub expense_date: Option<DateTime<FixedOffset>>,
        pub description: Option<String>,
        pub receipt_ref: Option<String>,
        pub split: Option<SplitRequest>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitView {
        pub username: String,
        pub amount_minor: i64,
        pub percent_bp: Option<i32>,
        pub shares: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub title: String,
        pub category: String,
        pub amount_minor: i64,
        pub paid_by: String,
        /// RFC3339 timestamp.
        pub expense_date: DateTime<FixedOffset>,
        pub description: Option<String>,
        pub receipt_ref: Option<String>,
        pub created_by: String,
        pub splits: Vec<SplitView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub group_id: String,
        /// Who paid. Defaults to the caller.
        pub from: Option<String>,
        /// Who got paid.
        pub to: String,
        pub amount_minor: i64,
        /// RFC3339 timestamp. Optional: if absent, server uses now().
        pub settled_at: Option<DateTime<FixedOffset>>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementCreated {
        pub id: String,
    }

    /// Request body for listing a group's settlements, newest first.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementList {
        pub group_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub id: Uuid,
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
        /// RFC3339 timestamp.
        pub settled_at: DateTime<FixedOffset>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementsResponse {
        pub settlements: Vec<SettlementView>,
    }
}

pub mod balance {
    use super::*;

    /// One member's position in the group.
    ///
    /// `balance_minor` is positive when the group owes the member money.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberBalanceView {
        pub username: String,
        pub display_name: String,
        pub paid_minor: i64,
        pub owes_minor: i64,
        pub settled_minor: i64,
        pub balance_minor: i64,
    }

    /// A suggested repayment.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceSheetResponse {
        pub group_id: String,
        pub currency: Currency,
        pub balances: Vec<MemberBalanceView>,
        pub transfers: Vec<TransferView>,
        /// Leftover debt the suggested transfers cannot cancel. Zero on
        /// consistent data.
        pub residual_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupBalanceView {
        pub group_id: String,
        pub group_name: String,
        pub balance_minor: i64,
    }

    /// The caller's position across every group they belong to.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverviewResponse {
        pub net_minor: i64,
        pub receivable_minor: i64,
        pub payable_minor: i64,
        pub groups: Vec<GroupBalanceView>,
    }
}

pub mod stats {
    use super::*;

    /// Request body for group statistics.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatsGet {
        pub group_id: String,
        /// How many months of history the `monthly` series spans.
        /// Defaults to 6, clamped to 1..=60.
        pub months: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub category: String,
        pub total_minor: i64,
        /// Share of total spending in basis points.
        pub share_bp: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberSpendView {
        pub username: String,
        pub display_name: String,
        pub paid_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyView {
        pub year: i32,
        pub month: u32,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistic {
        pub currency: Currency,
        pub total_spent_minor: i64,
        pub expense_count: u64,
        pub average_expense_minor: i64,
        pub categories: Vec<CategoryView>,
        pub members: Vec<MemberSpendView>,
        pub monthly: Vec<MonthlyView>,
    }
}
