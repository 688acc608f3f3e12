pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::error::ErrorReport;
use crate::application::repos::{ReadinessCheck, RepoError};

use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub api: ApiState,
    pub readiness: Arc<dyn ReadinessCheck>,
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn health(State(state): State<RouterState>) -> Response {
    db_health_response(state.readiness.ping().await)
}

/// Full application router: health endpoint plus the versioned API.
pub fn build_router(state: RouterState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health))
        .with_state(state.clone())
        .layer(axum_middleware::from_fn(log_responses));

    Router::new()
        .merge(health_routes)
        .merge(build_api_router(state.clone()).with_state(state))
        .layer(axum_middleware::from_fn(set_request_context))
}
