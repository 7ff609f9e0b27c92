//! Metrics Service: process uptime plus per-route request counters.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use tracing::instrument;

use clientreg_observability::{ProcessClock, UptimeReport};

use crate::store::{RequestMetric, RequestMetricsStore, StoreError};

/// Uptime and request counting, independent of the client domain.
#[derive(Debug)]
pub struct MetricsService<M> {
    clock: Arc<ProcessClock>,
    store: M,
}

impl<M> MetricsService<M>
where
    M: RequestMetricsStore,
{
    pub fn new(clock: Arc<ProcessClock>, store: M) -> Self {
        Self { clock, store }
    }

    pub fn clock(&self) -> &ProcessClock {
        &self.clock
    }

    pub fn uptime(&self) -> UptimeReport {
        self.clock.report()
    }

    /// Mark a restart of the serving components (reported as `last_restart`).
    pub fn record_restart(&self) -> DateTime<Utc> {
        self.clock.record_restart()
    }

    #[instrument(skip(self), err)]
    pub async fn increment_request_count(
        &self,
        method: &str,
        path: &str,
    ) -> Result<RequestMetric, StoreError> {
        self.store.increment(method, path).await
    }

    pub async fn request_metrics(&self) -> Result<Vec<RequestMetric>, StoreError> {
        self.store.list_all().await
    }
}
