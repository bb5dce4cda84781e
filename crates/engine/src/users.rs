//! Users table (minimal entity).
//!
//! The engine stores memberships and payers by `user_id`, which is the
//! username. Profile fields (display name, avatar) live here so balance
//! sheets can render people without a second lookup.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_ref: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
