//! Group membership rows plus the joined view the balance code consumes.
//!
//! The group creator always has a membership row with the admin role, so
//! every person who can appear in a balance sheet is listed here.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A member of a group, joined with their profile display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMember {
    pub user_id: String,
    pub display_name: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn new(user_id: &str, display_name: &str, role: &str, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            role: role.to_string(),
            joined_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "group_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub role: String,
    pub joined_at: DateTimeUtc,
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
