use crate::application::auth::AuthError;
use crate::application::carts::CartError;
use crate::application::error::ErrorReport;
use crate::application::listing::ListError;
use crate::application::orders::OrderError;
use crate::application::policy::AccessError;
use crate::application::repos::RepoError;
use crate::application::reviews::ReviewError;
use crate::domain::error::DomainError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const UNKNOWN_RESOURCE: &str = "unknown_resource";
    pub const INVALID_TOKEN: &str = "invalid_token";
    pub const EXPIRED: &str = "expired";
    pub const REVOKED: &str = "revoked";
    pub const VALIDATION: &str = "validation_error";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_CURSOR: &str = "invalid_cursor";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            hint,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Authentication required",
            None,
        )
    }

    pub fn forbidden(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::FORBIDDEN,
            "You do not have permission to perform this action",
            hint,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn unknown_resource(slug: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            codes::UNKNOWN_RESOURCE,
            "Unknown resource",
            Some(slug.to_string()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let detail = format!(
            "{}: {}",
            self.code,
            hint.as_deref().unwrap_or(self.message.as_str())
        );
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message,
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::api", self.status, detail).attach(&mut response);
        response
    }
}

pub fn access_to_api(err: AccessError) -> ApiError {
    match err {
        AccessError::Unauthenticated => ApiError::unauthorized(),
        AccessError::Forbidden(capability) => {
            ApiError::forbidden(Some(format!("missing capability {capability:?}")))
        }
    }
}

pub fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { entity } => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Resource not found",
            Some(entity.to_string()),
        ),
        DomainError::Validation { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION,
            "Validation failed",
            Some(message),
        ),
        DomainError::Conflict { message, .. } => {
            ApiError::new(StatusCode::CONFLICT, codes::DUPLICATE, message, None)
        }
        DomainError::Invariant { message } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Unexpected error occurred",
            Some(message),
        ),
    }
}

pub fn list_to_api(err: ListError) -> ApiError {
    match err {
        ListError::Access(err) => access_to_api(err),
        ListError::Pagination(err) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_CURSOR,
            "Invalid cursor",
            Some(err.to_string()),
        ),
        ListError::Repo(err) => repo_to_api(err),
        ListError::Serialize(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Unexpected error occurred",
            Some(err.to_string()),
        ),
        ListError::NotFound(kind) => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Resource not found",
            Some(kind.slug().to_string()),
        ),
    }
}

pub fn review_to_api(err: ReviewError) -> ApiError {
    match err {
        ReviewError::Access(err) => access_to_api(err),
        ReviewError::Domain(err) => domain_to_api(err),
        ReviewError::Repo(err) => repo_to_api(err),
    }
}

pub fn cart_to_api(err: CartError) -> ApiError {
    match err {
        CartError::Access(err) => access_to_api(err),
        CartError::Domain(err) => domain_to_api(err),
        CartError::Repo(err) => repo_to_api(err),
    }
}

pub fn order_to_api(err: OrderError) -> ApiError {
    match err {
        OrderError::Access(err) => access_to_api(err),
        OrderError::Domain(err) => domain_to_api(err),
        OrderError::Repo(err) => repo_to_api(err),
    }
}

pub fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::Invalid => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::INVALID_TOKEN,
            "Invalid access token",
            None,
        ),
        AuthError::Expired => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::EXPIRED,
            "Access token expired",
            None,
        ),
        AuthError::Revoked => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::REVOKED,
            "Access token revoked",
            None,
        ),
        AuthError::Repo(err) => repo_to_api(err),
    }
}
