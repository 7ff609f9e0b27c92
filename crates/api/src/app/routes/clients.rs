use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use crate::app::errors::{self, NotFoundAs};
use crate::app::services::AppServices;
use crate::app::dto;

pub fn router() -> Router {
    Router::new()
        .route("/clients", post(create_client).get(list_clients))
        .route("/clients/document/:document", get(get_client_by_document))
        .route("/clients/name/", get(search_without_name))
        .route("/clients/name/:name", get(get_clients_by_name))
        .route("/clients/:document/block", put(block_client))
        .route("/clients/:document/unblock", put(unblock_client))
}

pub async fn create_client(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateClientRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let new_client = match body.into_new_client() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(&e, NotFoundAs::NotFound),
    };

    match services.clients.create_client(new_client).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(e) => errors::service_error_to_response(e, NotFoundAs::NotFound),
    }
}

pub async fn list_clients(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.clients.list_clients().await {
        Ok(clients) => (StatusCode::OK, Json(clients)).into_response(),
        Err(e) => errors::service_error_to_response(e, NotFoundAs::NotFound),
    }
}

pub async fn get_client_by_document(
    Extension(services): Extension<Arc<AppServices>>,
    Path(document): Path<String>,
) -> axum::response::Response {
    match services.clients.get_client_by_document(&document).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(e) => errors::service_error_to_response(e, NotFoundAs::NotFound),
    }
}

pub async fn get_clients_by_name(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    search(services, &name).await
}

/// `/clients/name/` with nothing after the slash.
pub async fn search_without_name(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    search(services, "").await
}

async fn search(services: Arc<AppServices>, name: &str) -> axum::response::Response {
    match services.clients.get_clients_by_name(name).await {
        Ok(clients) => (StatusCode::OK, Json(clients)).into_response(),
        Err(e) => errors::service_error_to_response(e, NotFoundAs::NotFound),
    }
}

pub async fn block_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(document): Path<String>,
) -> axum::response::Response {
    match services.clients.block_client(&document).await {
        Ok(_) => (StatusCode::OK, Json(dto::MessageResponse::BLOCKED)).into_response(),
        Err(e) => errors::service_error_to_response(e, NotFoundAs::BadRequest),
    }
}

pub async fn unblock_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(document): Path<String>,
) -> axum::response::Response {
    match services.clients.unblock_client(&document).await {
        Ok(_) => (StatusCode::OK, Json(dto::MessageResponse::UNBLOCKED)).into_response(),
        Err(e) => errors::service_error_to_response(e, NotFoundAs::BadRequest),
    }
}
