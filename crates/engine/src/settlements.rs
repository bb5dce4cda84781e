//! A `Settlement` is a direct repayment between two members, recorded so
//! the group's balances move toward zero without editing any expense.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub id: Uuid,
    pub group_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Money,
    pub settled_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Settlement {
    pub fn new(
        group_id: String,
        from_user_id: String,
        to_user_id: String,
        amount: Money,
        settled_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        if from_user_id == to_user_id {
            return Err(EngineError::InvalidAmount(
                "cannot settle with yourself".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            from_user_id,
            to_user_id,
            amount,
            settled_at,
            note,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_minor: i64,
    pub settled_at: DateTimeUtc,
    pub note: Option<String>,
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
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Settlement> for ActiveModel {
    fn from(settlement: &Settlement) -> Self {
        Self {
            id: ActiveValue::Set(settlement.id.to_string()),
            group_id: ActiveValue::Set(settlement.group_id.clone()),
            from_user_id: ActiveValue::Set(settlement.from_user_id.clone()),
            to_user_id: ActiveValue::Set(settlement.to_user_id.clone()),
            amount_minor: ActiveValue::Set(settlement.amount.minor()),
            settled_at: ActiveValue::Set(settlement.settled_at),
            note: ActiveValue::Set(settlement.note.clone()),
        }
    }
}

impl TryFrom<Model> for Settlement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("settlement not exists".to_string()))?,
            group_id: model.group_id,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            amount: Money::new(model.amount_minor),
            settled_at: model.settled_at,
            note: model.note,
        })
    }
}
