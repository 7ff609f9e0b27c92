use axum::{routing::get, Router};

pub mod clients;
pub mod metrics;
pub mod system;

/// Router for every endpoint that expects `AppServices` in its extensions.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(clients::router())
        .merge(metrics::router())
}
