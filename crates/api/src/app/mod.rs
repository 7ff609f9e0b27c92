//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service construction
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use clientreg_infra::{config::AppConfig, db::BootstrapError, workers::RequestCounterHandle};
use clientreg_observability::ProcessClock;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// The returned handle drains the request counter once the router is dropped.
pub async fn build_app(
    config: &AppConfig,
    clock: Arc<ProcessClock>,
) -> Result<(Router, Arc<services::AppServices>, RequestCounterHandle), BootstrapError> {
    let (services, counter_handle) = services::build_services(config, clock).await?;
    let services = Arc::new(services);
    Ok((build_app_with(services.clone()), services, counter_handle))
}

/// Router over already-built services.
pub fn build_app_with(services: Arc<services::AppServices>) -> Router {
    let counter = services.counter.clone();

    routes::router()
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(counter, middleware::count_requests)),
        )
}
