//! Caller profile handler

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::access::Caller;

use crate::infra::http::api::error::{ApiError, auth_to_api};
use crate::infra::http::api::state::ApiState;

pub async fn get_me(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = caller.principal().ok_or_else(ApiError::unauthorized)?;

    let user = state
        .tokens
        .profile(principal)
        .await
        .map_err(auth_to_api)?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::not_found("user not found")),
    }
}
