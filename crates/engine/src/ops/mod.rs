use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod access;
mod balances;
mod expenses;
mod groups;
mod memberships;
mod settlements;
mod stats;

pub use balances::{BalanceSheet, GroupBalanceRow, UserOverview};
pub use expenses::ExpenseListFilter;
pub use stats::{CategoryStat, GroupStats, MemberSpend, MonthlyTotal};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Whether recorded settlements feed back into computed balances.
///
/// Under `Applied` a recorded repayment nets against both parties' balances
/// through the `settled` column. Under `Informational` recorded settlements
/// are history only, and suggested transfers always reflect the raw splits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SettlementPolicy {
    #[default]
    Applied,
    Informational,
}

impl SettlementPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Informational => "informational",
        }
    }
}

impl TryFrom<&str> for SettlementPolicy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "applied" => Ok(Self::Applied),
            "informational" => Ok(Self::Informational),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid settlement policy: {other}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    settlement_policy: SettlementPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn settlement_policy(&self) -> SettlementPolicy {
        self.settlement_policy
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    settlement_policy: SettlementPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Choose how recorded settlements affect balances. Defaults to `Applied`.
    pub fn settlement_policy(mut self, policy: SettlementPolicy) -> EngineBuilder {
        self.settlement_policy = policy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            settlement_policy: self.settlement_policy,
        })
    }
}
