//! Command-line client for the mailroom scan service.

pub mod client;
pub mod render;
pub mod session;
pub mod watch;

pub use client::{IntakeClient, IntakeError};
pub use session::{ScanLog, SessionMetrics};
