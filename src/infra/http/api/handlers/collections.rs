//! Generic collection handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::access::Caller;
use crate::application::query::QueryParams;
use crate::domain::resources::ResourceKind;

use crate::infra::http::api::error::{ApiError, list_to_api};
use crate::infra::http::api::state::ApiState;

/// Response header reporting how a collection page was served.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

fn resolve_kind(slug: &str) -> Result<ResourceKind, ApiError> {
    ResourceKind::from_slug(slug).ok_or_else(|| ApiError::unknown_resource(slug))
}

pub(super) async fn list_response(
    state: &ApiState,
    kind: ResourceKind,
    caller: &Caller,
    params: &QueryParams,
) -> Result<Response, ApiError> {
    let outcome = state
        .lists
        .list(kind, caller, params)
        .await
        .map_err(list_to_api)?;

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        outcome.body,
    )
        .into_response();
    response.headers_mut().insert(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(outcome.cache.as_str()),
    );
    Ok(response)
}

pub(super) async fn retrieve_response(
    state: &ApiState,
    kind: ResourceKind,
    caller: &Caller,
    id: i64,
) -> Result<Response, ApiError> {
    let row = state
        .lists
        .retrieve(kind, caller, id)
        .await
        .map_err(list_to_api)?;
    Ok(Json(row).into_response())
}

pub async fn list_collection(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path(resource): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Response, ApiError> {
    let kind = resolve_kind(&resource)?;
    list_response(&state, kind, &caller, &params).await
}

pub async fn retrieve_record(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    Path((resource, id)): Path<(String, i64)>,
) -> Result<Response, ApiError> {
    let kind = resolve_kind(&resource)?;
    retrieve_response(&state, kind, &caller, id).await
}
