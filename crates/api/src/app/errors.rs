use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use clientreg_core::DomainError;
use clientreg_infra::services::ClientServiceError;
use clientreg_infra::store::StoreError;

/// Which status a missing client maps to. Block/unblock report it as a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundAs {
    NotFound,
    BadRequest,
}

pub fn domain_error_to_response(err: &DomainError, not_found: NotFoundAs) -> axum::response::Response {
    let status = match err {
        DomainError::NotFound => match not_found {
            NotFoundAs::NotFound => StatusCode::NOT_FOUND,
            NotFoundAs::BadRequest => StatusCode::BAD_REQUEST,
        },
        DomainError::Validation(_)
        | DomainError::InvalidPartyType(_)
        | DomainError::AlreadyExists
        | DomainError::AlreadyBlocked
        | DomainError::NotBlocked
        | DomainError::EmptyQuery => StatusCode::BAD_REQUEST,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn service_error_to_response(
    err: ClientServiceError,
    not_found: NotFoundAs,
) -> axum::response::Response {
    match err {
        ClientServiceError::Domain(e) => domain_error_to_response(&e, not_found),
        ClientServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    error!(error = %err, "store failure");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
