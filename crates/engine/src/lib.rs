pub use balance::{MemberBalance, SETTLEMENT_EPSILON, SettlementPlan, Transfer};
pub use commands::{NewExpenseCmd, RecordSettlementCmd, SplitSpec, UpdateExpenseCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use expenses::{Expense, ExpenseCategory};
pub use group_members::GroupMember;
pub use groups::Group;
pub use money::Money;
pub use ops::{
    BalanceSheet, CategoryStat, Engine, EngineBuilder, ExpenseListFilter, GroupBalanceRow,
    GroupStats, MemberSpend, MonthlyTotal, SettlementPolicy, UserOverview,
};
pub use settlements::Settlement;
pub use splits::Split;

mod balance;
mod commands;
mod currency;
mod error;
mod expenses;
mod group_members;
mod groups;
mod money;
mod ops;
mod settlements;
mod splits;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
