//! Membership management endpoints (admin-only, except leaving).

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::member::{MemberUpsert, MemberView, MembersResponse, MembershipRole};

use crate::{ServerError, server::ServerState, user};

pub async fn list_group_members(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state
        .engine
        .list_group_members(&group_id, &user.username)
        .await?
        .into_iter()
        .map(|member| MemberView {
            username: member.user_id,
            display_name: member.display_name,
            role: match member.role.as_str() {
                "admin" => MembershipRole::Admin,
                _ => MembershipRole::Member,
            },
        })
        .collect();

    Ok(Json(MembersResponse { members }))
}

pub async fn upsert_group_member(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<MemberUpsert>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .upsert_group_member(
            &group_id,
            &payload.username,
            payload.role.as_str(),
            &user.username,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_group_member(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((group_id, username)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_group_member(&group_id, &username, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
