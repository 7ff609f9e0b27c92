//! Infrastructure wiring: picks the store backend and builds the services.

use std::sync::Arc;

use tracing::info;

use clientreg_infra::{
    config::AppConfig,
    db::{self, BootstrapError},
    services::{ClientService, MetricsService},
    store::{
        ClientStore, InMemoryClientStore, InMemoryRequestMetricsStore, PostgresClientStore,
        PostgresRequestMetricsStore, RequestMetricsStore,
    },
    workers::{RequestCounter, RequestCounterHandle},
};
use clientreg_observability::ProcessClock;

pub type DynClientService = ClientService<Arc<dyn ClientStore>>;
pub type DynMetricsService = MetricsService<Arc<dyn RequestMetricsStore>>;

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub clients: DynClientService,
    pub metrics: Arc<DynMetricsService>,
    pub counter: RequestCounter,
}

/// Choose in-memory or Postgres stores from `config.use_persistent_stores`.
///
/// Must run inside a tokio runtime: it spawns the request-counter worker.
pub async fn build_services(
    config: &AppConfig,
    clock: Arc<ProcessClock>,
) -> Result<(AppServices, RequestCounterHandle), BootstrapError> {
    if config.use_persistent_stores {
        return build_persistent_services(config, clock).await;
    }
    Ok(build_in_memory_services(config, clock))
}

pub fn build_in_memory_services(
    config: &AppConfig,
    clock: Arc<ProcessClock>,
) -> (AppServices, RequestCounterHandle) {
    info!("using in-memory stores");
    let clients: Arc<dyn ClientStore> = Arc::new(InMemoryClientStore::new());
    let metrics: Arc<dyn RequestMetricsStore> = Arc::new(InMemoryRequestMetricsStore::new());
    assemble(config, clock, clients, metrics)
}

async fn build_persistent_services(
    config: &AppConfig,
    clock: Arc<ProcessClock>,
) -> Result<(AppServices, RequestCounterHandle), BootstrapError> {
    let pool = db::connect_with_retry(&config.database).await?;
    db::migrate(&pool).await?;

    info!("using postgres stores");
    let clients: Arc<dyn ClientStore> = Arc::new(PostgresClientStore::new(pool.clone()));
    let metrics: Arc<dyn RequestMetricsStore> = Arc::new(PostgresRequestMetricsStore::new(pool));
    Ok(assemble(config, clock, clients, metrics))
}

fn assemble(
    config: &AppConfig,
    clock: Arc<ProcessClock>,
    clients: Arc<dyn ClientStore>,
    metrics: Arc<dyn RequestMetricsStore>,
) -> (AppServices, RequestCounterHandle) {
    let clients = ClientService::new(clients).with_validation_mode(config.document_validation);
    let metrics = Arc::new(MetricsService::new(clock, metrics));
    let (counter, handle) = RequestCounter::spawn(metrics.clone(), config.metrics_queue_capacity);

    (
        AppServices {
            clients,
            metrics,
            counter,
        },
        handle,
    )
}
