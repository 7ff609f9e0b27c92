use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/metrics/uptime", get(uptime))
        .route("/metrics/requests", get(request_metrics))
}

pub async fn uptime(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.metrics.uptime())
}

pub async fn request_metrics(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.metrics.request_metrics().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
