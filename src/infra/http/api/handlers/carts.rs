//! Cart and wishlist handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::access::Caller;
use crate::application::carts::AddToCartCommand;
use crate::application::query::QueryParams;
use crate::domain::resources::ResourceKind;

use super::collections::{list_response, retrieve_response};
use crate::infra::http::api::error::{ApiError, cart_to_api};
use crate::infra::http::api::models::{AddToCartRequest, WishlistAddRequest};
use crate::infra::http::api::state::ApiState;

pub async fn list_cart_items(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<QueryParams>,
) -> Result<Response, ApiError> {
    list_response(&state, ResourceKind::CartItems, &caller, &params).await
}

pub async fn get_cart_item(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    retrieve_response(&state, ResourceKind::CartItems, &caller, id).await
}

pub async fn add_cart_item(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = AddToCartCommand {
        variant_id: payload.variant_id,
        quantity: payload.quantity,
    };

    let item = state
        .carts
        .add_to_cart(&caller, command)
        .await
        .map_err(cart_to_api)?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn remove_cart_item(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .carts
        .remove_cart_item(&caller, id)
        .await
        .map_err(cart_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_wishlist_items(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<QueryParams>,
) -> Result<Response, ApiError> {
    list_response(&state, ResourceKind::WishlistItems, &caller, &params).await
}

pub async fn get_wishlist_item(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    retrieve_response(&state, ResourceKind::WishlistItems, &caller, id).await
}

pub async fn add_wishlist_item(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<WishlistAddRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .carts
        .add_to_wishlist(&caller, payload.product_id)
        .await
        .map_err(cart_to_api)?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn remove_wishlist_item(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .carts
        .remove_from_wishlist(&caller, id)
        .await
        .map_err(cart_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
