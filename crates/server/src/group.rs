//! Group API endpoints

use api_types::group::{GroupCreated, GroupGet, GroupNew, GroupUpdate, GroupView, GroupsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::FixedOffset;

use crate::{ServerError, server::ServerState, user};

fn view(group: engine::Group, utc: FixedOffset) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        description: group.description,
        owner: group.user_id,
        currency: match group.currency {
            engine::Currency::Inr => api_types::Currency::Inr,
        },
        created_at: group.created_at.with_timezone(&utc),
    }
}

/// Handle requests for creating a new group.
pub async fn group_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupCreated>), ServerError> {
    let currency = payload.currency.map(|currency| match currency {
        api_types::Currency::Inr => engine::Currency::Inr,
    });
    let id = state
        .engine
        .new_group(
            &payload.name,
            &user.username,
            currency,
            payload.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(GroupCreated { id })))
}

/// Handle requests for the group snapshot, by id or name.
pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupGet>,
) -> Result<Json<GroupView>, ServerError> {
    if payload.id.is_none() && payload.name.is_none() {
        return Err(ServerError::Generic("id or name required".to_string()));
    }

    let group = state
        .engine
        .group_snapshot(payload.id.as_deref(), payload.name, &user.username)
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    Ok(Json(view(group, utc)))
}

/// Handle requests for listing the caller's groups.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<GroupsResponse>, ServerError> {
    let groups = state.engine.list_groups(&user.username).await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let groups = groups.into_iter().map(|group| view(group, utc)).collect();

    Ok(Json(GroupsResponse { groups }))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<GroupUpdate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .update_group(
            &group_id,
            &user.username,
            payload.name.as_deref(),
            payload.description.as_deref(),
        )
        .await?;

    Ok(StatusCode::OK)
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(&group_id, &user.username).await?;

    Ok(StatusCode::NO_CONTENT)
}
