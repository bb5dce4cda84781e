use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, RecordSettlementCmd, ResultEngine, Settlement, settlements};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Record a repayment between two members (any member may record it).
    pub async fn record_settlement(&self, cmd: RecordSettlementCmd) -> ResultEngine<String> {
        with_tx!(self, |db_tx| {
            let group = self
                .require_group_read(&db_tx, &cmd.group_id, &cmd.user_id)
                .await?;
            if !self.is_group_member(&db_tx, &group.id, &cmd.from).await? {
                return Err(EngineError::InvalidAmount(format!(
                    "{} is not a group member",
                    cmd.from
                )));
            }
            if !self.is_group_member(&db_tx, &group.id, &cmd.to).await? {
                return Err(EngineError::InvalidAmount(format!(
                    "{} is not a group member",
                    cmd.to
                )));
            }

            let settlement = Settlement::new(
                group.id.clone(),
                cmd.from.clone(),
                cmd.to.clone(),
                cmd.amount,
                cmd.settled_at,
                normalize_optional_text(cmd.note.as_deref()),
            )?;
            let settlement_id = settlement.id.to_string();
            let model: settlements::ActiveModel = (&settlement).into();
            model.insert(&db_tx).await?;

            Ok(settlement_id)
        })
    }

    /// The group's recorded repayments, newest first (any member).
    pub async fn list_settlements(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<Settlement>> {
        with_tx!(self, |db_tx| {
            let group = self.require_group_read(&db_tx, group_id, user_id).await?;
            let models = settlements::Entity::find()
                .filter(settlements::Column::GroupId.eq(group.id.clone()))
                .order_by_desc(settlements::Column::SettledAt)
                .order_by_asc(settlements::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Settlement::try_from).collect()
        })
    }
}
