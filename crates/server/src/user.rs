//! Caller profile endpoints, plus the `users` entity the auth middleware
//! resolves credentials against.

use api_types::user::ProfileUpdate;
use axum::{Extension, Json, extract::State, http::StatusCode};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{ServerError, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
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

/// Update the caller's profile. Absent fields keep their stored value.
pub async fn update_profile(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<StatusCode, ServerError> {
    if payload.display_name.is_none() && payload.email.is_none() && payload.avatar_ref.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut user: ActiveModel = user.into();
    if let Some(display_name) = payload.display_name {
        if display_name.trim().is_empty() {
            return Err(ServerError::Generic(
                "display_name must not be empty".to_string(),
            ));
        }
        user.display_name = ActiveValue::Set(display_name);
    }
    if let Some(email) = payload.email {
        user.email = ActiveValue::Set(Some(email));
    }
    if let Some(avatar_ref) = payload.avatar_ref {
        user.avatar_ref = ActiveValue::Set(Some(avatar_ref));
    }

    user.update(&state.db)
        .await
        .map_err(|err| ServerError::Generic(err.to_string()))?;

    Ok(StatusCode::OK)
}
