use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, expenses, group_members, groups, users};

use super::{Engine, normalize_required_name};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum GroupRole {
    Admin,
    Member,
}

impl GroupRole {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub(super) fn can_manage(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl TryFrom<&str> for GroupRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidRole(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

impl Engine {
    async fn find_group_by_id(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Option<groups::Model>> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn group_membership_role(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<GroupRole>> {
        let row = group_members::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| GroupRole::try_from(m.role.as_str()))
            .transpose()
    }

    /// Any membership row (or being the creator) grants read access.
    /// Outsiders see the group as missing rather than as forbidden.
    pub(super) async fn require_group_read(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<groups::Model> {
        let model = self
            .find_group_by_id(db, group_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        if model.user_id != user_id
            && self
                .group_membership_role(db, group_id, user_id)
                .await?
                .is_none()
        {
            return Err(EngineError::KeyNotFound("group not exists".to_string()));
        }
        Ok(model)
    }

    /// Management requires the admin role or being the creator. Members
    /// without it get `Forbidden`; non-members still get `KeyNotFound`.
    pub(super) async fn require_group_admin(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<groups::Model> {
        let model = self.require_group_read(db, group_id, user_id).await?;
        if model.user_id == user_id {
            return Ok(model);
        }
        let role = self
            .group_membership_role(db, group_id, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        if !role.can_manage() {
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(model)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    pub(super) async fn is_group_member(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        username: &str,
    ) -> ResultEngine<bool> {
        let row = group_members::Entity::find_by_id((group_id.to_string(), username.to_string()))
            .one(db)
            .await?;
        Ok(row.is_some())
    }

    pub(super) async fn group_member_rows(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Vec<group_members::Model>> {
        group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .all(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_expense_in_group(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        expense_id: Uuid,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::GroupId.eq(group_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))
    }

    pub(super) async fn require_group_by_name(
        &self,
        db: &DatabaseTransaction,
        group_name: &str,
        user_id: &str,
    ) -> ResultEngine<groups::Model> {
        let group_name = normalize_required_name(group_name, "group")?;
        let group_name_lower = group_name.to_lowercase();
        let models: Vec<groups::Model> = groups::Entity::find()
            .filter(Expr::cust("LOWER(name)").eq(group_name_lower))
            .all(db)
            .await?;

        let mut out: Option<groups::Model> = None;
        for model in models {
            let allowed = if model.user_id == user_id {
                true
            } else {
                self.group_membership_role(db, &model.id, user_id)
                    .await?
                    .is_some()
            };
            if allowed {
                if out.is_some() {
                    return Err(EngineError::InvalidAmount(
                        "ambiguous group name".to_string(),
                    ));
                }
                out = Some(model);
            }
        }

        out.ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))
    }
}
