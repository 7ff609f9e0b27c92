//! Fire-and-forget request counting.
//!
//! Observations go through a bounded channel to one worker task that upserts the
//! counter. Delivery is at-most-once:
//! - a full or closed queue drops the observation (logged at `warn`)
//! - a failed upsert is logged and not retried
//! - queued observations are lost if the process dies
//!
//! None of these failures ever reach the request that produced the observation.
//!
//! Counters are keyed by the raw request path, not the route template, and
//! unmatched paths are counted too. Every distinct document in
//! `/clients/{document}/block` and every unknown URL adds a row, so the
//! `request_metrics` table grows with the set of paths clients send.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::services::MetricsService;
use crate::store::RequestMetricsStore;

/// One observed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestObservation {
    pub method: String,
    pub path: String,
}

/// Cheap-to-clone producer side, held by the HTTP middleware.
#[derive(Debug, Clone)]
pub struct RequestCounter {
    tx: mpsc::Sender<RequestObservation>,
}

/// Worker task handle. The worker stops once every [`RequestCounter`] clone is dropped.
#[derive(Debug)]
pub struct RequestCounterHandle {
    join: JoinHandle<u64>,
}

impl RequestCounterHandle {
    /// Wait for the worker to drain and stop; returns how many increments succeeded.
    pub async fn join(self) -> u64 {
        self.join.await.unwrap_or_else(|e| {
            warn!("request counter worker ended abnormally: {e}");
            0
        })
    }
}

impl RequestCounter {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn<M>(metrics: Arc<MetricsService<M>>, capacity: usize) -> (Self, RequestCounterHandle)
    where
        M: RequestMetricsStore + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let join = tokio::spawn(run_worker(metrics, rx));
        (Self { tx }, RequestCounterHandle { join })
    }

    /// Enqueue an observation without waiting. Returns `false` if it was dropped.
    pub fn record(&self, method: impl Into<String>, path: impl Into<String>) -> bool {
        let observation = RequestObservation {
            method: method.into(),
            path: path.into(),
        };

        match self.tx.try_send(observation) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(o)) => {
                warn!(method = %o.method, path = %o.path, "request counter queue full; observation dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(o)) => {
                warn!(method = %o.method, path = %o.path, "request counter stopped; observation dropped");
                false
            }
        }
    }
}

async fn run_worker<M>(
    metrics: Arc<MetricsService<M>>,
    mut rx: mpsc::Receiver<RequestObservation>,
) -> u64
where
    M: RequestMetricsStore,
{
    let mut applied = 0u64;
    while let Some(obs) = rx.recv().await {
        match metrics.increment_request_count(&obs.method, &obs.path).await {
            Ok(row) => {
                applied += 1;
                debug!(method = %row.method, path = %row.path, count = row.count, "request counted");
            }
            Err(e) => {
                warn!(method = %obs.method, path = %obs.path, "failed to increment request counter: {e}");
            }
        }
    }
    applied
}
