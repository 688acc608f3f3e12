//! Health monitor handler

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::access::Caller;
use crate::application::policy::{self, Action};
use crate::domain::resources::ResourceKind;

use crate::infra::http::api::error::{ApiError, access_to_api};
use crate::infra::http::api::models::MonitorRunResponse;
use crate::infra::http::api::state::ApiState;

pub async fn run_monitor(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    policy::authorize(&caller, ResourceKind::ServiceChecks, Action::Create)
        .map_err(access_to_api)?;

    let checks = state.monitor.run_all().await;
    Ok(Json(MonitorRunResponse { checks }))
}
