use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::access::Caller;

use super::error::auth_to_api;
use super::state::ApiState;

/// Header set by API documentation tooling when it introspects endpoints.
pub const SCHEMA_PROBE_HEADER: &str = "x-schema-probe";
const API_KEY_HEADER: &str = "x-api-key";

/// Resolve the caller for every API request. Requests without credentials
/// continue anonymously; a credential that fails to authenticate is rejected.
pub async fn resolve_caller(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let caller = if is_schema_probe(request.headers()) {
        Caller::SchemaProbe
    } else {
        match extract_token(request.headers()) {
            None => Caller::Anonymous,
            Some(token) => match state.tokens.authenticate(&token).await {
                Ok(principal) => Caller::User(principal),
                Err(err) => return auth_to_api(err).into_response(),
            },
        }
    };

    request.extensions_mut().insert(caller.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(caller);
    response
}

fn is_schema_probe(headers: &HeaderMap) -> bool {
    headers
        .get(SCHEMA_PROBE_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "1")
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    (!bearer.is_empty()).then(|| bearer.to_string())
}
