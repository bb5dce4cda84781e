//! Expense primitives.
//!
//! An `Expense` is a purchase paid by one member on behalf of the group.
//! How it is divided between members is recorded as `Split` rows.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

use super::splits;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Food,
    Rent,
    Electricity,
    Water,
    Groceries,
    Travel,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Rent => "rent",
            Self::Electricity => "electricity",
            Self::Water => "water",
            Self::Groceries => "groceries",
            Self::Travel => "travel",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for ExpenseCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "food" => Ok(Self::Food),
            "rent" => Ok(Self::Rent),
            "electricity" => Ok(Self::Electricity),
            "water" => Ok(Self::Water),
            "groceries" => Ok(Self::Groceries),
            "travel" => Ok(Self::Travel),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid expense category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: String,
    pub title: String,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub description: Option<String>,
    pub receipt_ref: Option<String>,
    pub paid_by: String,
    pub expense_date: DateTime<Utc>,
    pub created_by: String,
    pub splits: Vec<splits::Split>,
}

impl Expense {
    pub fn new(
        group_id: String,
        title: String,
        category: ExpenseCategory,
        amount: Money,
        description: Option<String>,
        receipt_ref: Option<String>,
        paid_by: String,
        expense_date: DateTime<Utc>,
        created_by: String,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            title,
            category,
            amount,
            description,
            receipt_ref,
            paid_by,
            expense_date,
            created_by,
            splits: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub receipt_ref: Option<String>,
    pub paid_by: String,
    pub expense_date: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.clone()),
            title: ActiveValue::Set(expense.title.clone()),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
            amount_minor: ActiveValue::Set(expense.amount.minor()),
            description: ActiveValue::Set(expense.description.clone()),
            receipt_ref: ActiveValue::Set(expense.receipt_ref.clone()),
            paid_by: ActiveValue::Set(expense.paid_by.clone()),
            expense_date: ActiveValue::Set(expense.expense_date),
            created_by: ActiveValue::Set(expense.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            group_id: model.group_id,
            title: model.title,
            category: ExpenseCategory::try_from(model.category.as_str()).unwrap_or_default(),
            amount: Money::new(model.amount_minor),
            description: model.description,
            receipt_ref: model.receipt_ref,
            paid_by: model.paid_by,
            expense_date: model.expense_date,
            created_by: model.created_by,
            splits: Vec::new(),
        })
    }
}
