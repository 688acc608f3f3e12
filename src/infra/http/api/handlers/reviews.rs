//! Review handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::access::Caller;
use crate::application::query::QueryParams;
use crate::application::reviews::CreateReviewCommand;
use crate::domain::resources::ResourceKind;

use super::collections::{list_response, retrieve_response};
use crate::infra::http::api::error::{ApiError, review_to_api};
use crate::infra::http::api::models::ReviewCreateRequest;
use crate::infra::http::api::state::ApiState;

pub async fn list_reviews(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<QueryParams>,
) -> Result<Response, ApiError> {
    list_response(&state, ResourceKind::Reviews, &caller, &params).await
}

pub async fn get_review(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    retrieve_response(&state, ResourceKind::Reviews, &caller, id).await
}

pub async fn create_review(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<ReviewCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateReviewCommand {
        product_id: payload.product_id,
        rating: payload.rating,
        comment: payload.comment,
    };

    let review = state
        .reviews
        .create(&caller, command)
        .await
        .map_err(review_to_api)?;

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn delete_review(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .reviews
        .delete(&caller, id)
        .await
        .map_err(review_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
