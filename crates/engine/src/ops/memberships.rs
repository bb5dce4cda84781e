use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{EngineError, GroupMember, ResultEngine, group_members, users};

use super::{Engine, access::GroupRole, with_tx};

impl Engine {
    /// Adds a member or changes their role (admin only). The target user
    /// must exist; the creator's row cannot be touched.
    pub async fn upsert_group_member(
        &self,
        group_id: &str,
        member_username: &str,
        role: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_admin(&db_tx, group_id, user_id).await?;
            if member_username == group.user_id {
                return Err(EngineError::InvalidAmount(
                    "cannot change the creator's role".to_string(),
                ));
            }
            self.require_user_exists(&db_tx, member_username).await?;
            let role = GroupRole::try_from(role)?;

            match group_members::Entity::find_by_id((
                group.id.clone(),
                member_username.to_string(),
            ))
            .one(&db_tx)
            .await?
            {
                Some(_) => {
                    let active = group_members::ActiveModel {
                        group_id: ActiveValue::Set(group.id.clone()),
                        user_id: ActiveValue::Set(member_username.to_string()),
                        role: ActiveValue::Set(role.as_str().to_string()),
                        ..Default::default()
                    };
                    active.update(&db_tx).await?;
                }
                None => {
                    let active = group_members::ActiveModel {
                        group_id: ActiveValue::Set(group.id.clone()),
                        user_id: ActiveValue::Set(member_username.to_string()),
                        role: ActiveValue::Set(role.as_str().to_string()),
                        joined_at: ActiveValue::Set(Utc::now()),
                    };
                    active.insert(&db_tx).await?;
                }
            }

            Ok(())
        })
    }

    /// Removes a member (admin only), or lets a member leave on their own.
    /// The creator can never be removed.
    pub async fn remove_group_member(
        &self,
        group_id: &str,
        member_username: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let group = if member_username == user_id {
                self.require_group_read(&db_tx, group_id, user_id).await?
            } else {
                self.require_group_admin(&db_tx, group_id, user_id).await?
            };
            if member_username == group.user_id {
                return Err(EngineError::InvalidAmount(
                    "cannot remove the group creator".to_string(),
                ));
            }

            let result = group_members::Entity::delete_by_id((
                group.id.clone(),
                member_username.to_string(),
            ))
            .exec(&db_tx)
            .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("member not exists".to_string()));
            }

            Ok(())
        })
    }

    /// Lists the group's members with display names (any member).
    pub async fn list_group_members(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<GroupMember>> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_read(&db_tx, group_id, user_id).await?;
            self.load_group_members(&db_tx, &group.id).await
        })
    }

    /// Membership rows joined with user display names, in join order. This
    /// is the member list the balance sheet is computed over.
    pub(super) async fn load_group_members(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Vec<GroupMember>> {
        let membership_rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(group_members::Column::JoinedAt)
            .order_by_asc(group_members::Column::UserId)
            .all(db)
            .await?;

        let usernames: Vec<String> = membership_rows
            .iter()
            .map(|row| row.user_id.clone())
            .collect();
        let display_names: HashMap<String, String> = users::Entity::find()
            .filter(users::Column::Username.is_in(usernames))
            .all(db)
            .await?
            .into_iter()
            .map(|user| (user.username, user.display_name))
            .collect();

        Ok(membership_rows
            .into_iter()
            .map(|row| {
                let display_name = display_names
                    .get(&row.user_id)
                    .cloned()
                    .unwrap_or_else(|| row.user_id.clone());
                GroupMember {
                    user_id: row.user_id,
                    display_name,
                    role: row.role,
                    joined_at: row.joined_at,
                }
            })
            .collect())
    }
}
