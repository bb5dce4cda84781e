use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, Statement, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{Currency, EngineError, Group, ResultEngine, group_members, groups};

use super::{Engine, access::GroupRole, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Create a group with the caller as its admin member.
    pub async fn new_group(
        &self,
        name: &str,
        user_id: &str,
        currency: Option<Currency>,
        description: Option<&str>,
    ) -> ResultEngine<String> {
        let name = normalize_required_name(name, "group")?;

        let mut new_group = Group::new(name.clone(), user_id);
        new_group.currency = currency.unwrap_or_default();
        new_group.description = normalize_optional_text(description);
        let new_group_id = new_group.id.clone();
        let group_entry: groups::ActiveModel = (&new_group).into();
        with_tx!(self, |db_tx| {
            // Enforce unique group names per creator (case-insensitive) to
            // avoid ambiguous name lookups.
            let exists = groups::Entity::find()
                .filter(groups::Column::UserId.eq(user_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            group_entry.insert(&db_tx).await?;

            // The creator shows up in balance sheets like everyone else, so
            // they get a membership row from day one.
            let membership = group_members::ActiveModel {
                group_id: ActiveValue::Set(new_group_id.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(GroupRole::Admin.as_str().to_string()),
                joined_at: ActiveValue::Set(new_group.created_at),
            };
            membership.insert(&db_tx).await?;

            Ok(new_group_id)
        })
    }

    /// Rename a group or change its description (admin only). Passing an
    /// empty description clears it; `None` leaves it unchanged.
    pub async fn update_group(
        &self,
        group_id: &str,
        user_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_group_admin(&db_tx, group_id, user_id).await?;

            let mut active = groups::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            if let Some(name) = name {
                let name = normalize_required_name(name, "group")?;
                let clash = groups::Entity::find()
                    .filter(groups::Column::UserId.eq(model.user_id.clone()))
                    .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                    .filter(groups::Column::Id.ne(model.id.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if clash {
                    return Err(EngineError::ExistingKey(name));
                }
                active.name = ActiveValue::Set(name);
            }
            if let Some(description) = description {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            active.update(&db_tx).await?;

            Ok(())
        })
    }

    /// Delete a group and everything recorded in it (admin only).
    pub async fn delete_group(&self, group_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_group_admin(&db_tx, group_id, user_id).await?;
            let group_db_id = model.id;

            // Cascade within one DB transaction. sqlite only honors the FK
            // cascades when the foreign_keys pragma is on, so delete
            // explicitly, children first.
            let backend = self.database.get_database_backend();

            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM expense_splits WHERE expense_id IN (SELECT id FROM expenses WHERE group_id = ?);",
                    vec![group_db_id.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM expenses WHERE group_id = ?;",
                    vec![group_db_id.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM settlements WHERE group_id = ?;",
                    vec![group_db_id.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM group_members WHERE group_id = ?;",
                    vec![group_db_id.clone().into()],
                ))
                .await?;
            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "DELETE FROM groups WHERE id = ?;",
                    vec![group_db_id.clone().into()],
                ))
                .await?;

            Ok(())
        })
    }

    /// Return a group by id or by case-insensitive name. Any member may
    /// read; outsiders get `KeyNotFound`.
    pub async fn group_snapshot(
        &self,
        group_id: Option<&str>,
        group_name: Option<String>,
        user_id: &str,
    ) -> ResultEngine<Group> {
        if group_id.is_none() && group_name.is_none() {
            return Err(EngineError::KeyNotFound(
                "missing group id or name".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let model = if let Some(id) = group_id {
                self.require_group_read(&db_tx, id, user_id).await?
            } else {
                let name = group_name.ok_or_else(|| {
                    EngineError::KeyNotFound("missing group id or name".to_string())
                })?;
                self.require_group_by_name(&db_tx, &name, user_id).await?
            };
            Group::try_from(model)
        })
    }

    /// Every group the user belongs to, creator or not, sorted by name.
    pub async fn list_groups(&self, user_id: &str) -> ResultEngine<Vec<Group>> {
        with_tx!(self, |db_tx| {
            let models = self.load_user_groups(&db_tx, user_id).await?;
            models.into_iter().map(Group::try_from).collect()
        })
    }

    /// The user's groups by membership row, sorted by name. Shared by the
    /// group listing and the dashboard.
    pub(super) async fn load_user_groups(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<groups::Model>> {
        let membership_rows = group_members::Entity::find()
            .filter(group_members::Column::UserId.eq(user_id.to_string()))
            .all(db)
            .await?;
        let group_ids: Vec<String> = membership_rows
            .into_iter()
            .map(|row| row.group_id)
            .collect();

        groups::Entity::find()
            .filter(groups::Column::Id.is_in(group_ids))
            .order_by_asc(groups::Column::Name)
            .all(db)
            .await
            .map_err(Into::into)
    }
}
