//! HTTP intake service for shipping-label scans.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use pipeline::{Clock, ScanOutcome, ScanPipeline, SystemClock};
pub use routes::{router, AppState};
