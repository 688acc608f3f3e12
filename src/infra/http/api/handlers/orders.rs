//! Order handlers

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::access::Caller;
use crate::application::orders::CreateOrderCommand;
use crate::application::query::QueryParams;
use crate::domain::resources::ResourceKind;

use super::collections::list_response;
use crate::infra::http::api::error::{ApiError, order_to_api};
use crate::infra::http::api::models::OrderCreateRequest;
use crate::infra::http::api::state::ApiState;

pub async fn list_orders(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<QueryParams>,
) -> Result<Response, ApiError> {
    list_response(&state, ResourceKind::Orders, &caller, &params).await
}

pub async fn create_order(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<OrderCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateOrderCommand {
        address_id: payload.address_id,
        payment_method: payload.payment_method,
    };

    let order = state
        .orders
        .create(&caller, command)
        .await
        .map_err(order_to_api)?;

    Ok((StatusCode::CREATED, Json(order)))
}
