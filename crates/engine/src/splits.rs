//! A `Split` is one member's share of an expense.
//!
//! Split amounts are stored in minor units and always sum to the expense
//! amount. For percentage splits the requested weight is kept alongside in
//! basis points so the original intent survives edits.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: String,
    pub amount: Money,
    pub percent_bp: Option<i32>,
    pub shares: Option<i32>,
}

impl Split {
    pub fn new(expense_id: Uuid, user_id: &str, amount: Money) -> ResultEngine<Self> {
        if amount.is_negative() {
            return Err(EngineError::InvalidSplit(
                "split amount must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            expense_id,
            user_id: user_id.to_string(),
            amount,
            percent_bp: None,
            shares: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub percent_bp: Option<i32>,
    pub shares: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Split> for ActiveModel {
    fn from(split: &Split) -> Self {
        Self {
            id: ActiveValue::Set(split.id.to_string()),
            expense_id: ActiveValue::Set(split.expense_id.to_string()),
            user_id: ActiveValue::Set(split.user_id.clone()),
            amount_minor: ActiveValue::Set(split.amount.minor()),
            percent_bp: ActiveValue::Set(split.percent_bp),
            shares: ActiveValue::Set(split.shares),
        }
    }
}

impl TryFrom<Model> for Split {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("split not exists".to_string()))?,
            expense_id: Uuid::parse_str(&model.expense_id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            user_id: model.user_id,
            amount: Money::new(model.amount_minor),
            percent_bp: model.percent_bp,
            shares: model.shares,
        })
    }
}
