//! Tracing, logging, and process-level metrics (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Process clock: start time, last restart, uptime formatting.
pub mod clock;

pub use clock::{ProcessClock, UptimeReport, format_uptime};
pub use tracing::LogFormat;
