//! Application services: business rules on top of the stores.

pub mod clients;
pub mod metrics;

pub use clients::{ClientService, ClientServiceError};
pub use metrics::MetricsService;
