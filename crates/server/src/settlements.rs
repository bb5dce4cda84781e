//! Settlement API endpoints

use api_types::settlement::{
    SettlementCreated, SettlementList, SettlementNew, SettlementView, SettlementsResponse,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::{FixedOffset, Utc};

use engine::{Money, RecordSettlementCmd};

use crate::{ServerError, server::ServerState, user};

pub async fn settlement_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<SettlementCreated>), ServerError> {
    let from = payload.from.unwrap_or_else(|| user.username.clone());
    let settled_at = payload
        .settled_at
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let mut cmd = RecordSettlementCmd::new(
        payload.group_id,
        user.username.clone(),
        from,
        payload.to,
        Money::new(payload.amount_minor),
        settled_at,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let id = state.engine.record_settlement(cmd).await?;

    Ok((StatusCode::CREATED, Json(SettlementCreated { id })))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SettlementList>,
) -> Result<Json<SettlementsResponse>, ServerError> {
    let settlements = state
        .engine
        .list_settlements(&payload.group_id, &user.username)
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let settlements = settlements
        .into_iter()
        .map(|settlement| SettlementView {
            id: settlement.id,
            from: settlement.from_user_id,
            to: settlement.to_user_id,
            amount_minor: settlement.amount.minor(),
            settled_at: settlement.settled_at.with_timezone(&utc),
            note: settlement.note,
        })
        .collect();

    Ok(Json(SettlementsResponse { settlements }))
}
