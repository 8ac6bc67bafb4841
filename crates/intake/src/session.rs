use chrono::{DateTime, Utc};
use mailroom_core::{PackageRecord, ScanResponse};

use crate::client::IntakeError;
use crate::render;

/// Packages scanned during this run, most recent first. Nothing is kept
/// once the process exits.
#[derive(Debug, Default)]
pub struct ScanLog {
    records: Vec<PackageRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetrics {
    pub last_name: Option<String>,
    pub last_time: Option<DateTime<Utc>>,
    pub count: usize,
}

impl ScanLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, package: PackageRecord) {
        self.records.insert(0, package);
    }

    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metrics(&self) -> SessionMetrics {
        let last = self.records.first();
        SessionMetrics {
            last_name: last.and_then(|p| p.recipient_name.clone()),
            last_time: last.map(|p| p.time_received),
            count: self.records.len(),
        }
    }

    /// Fold one scan attempt into the log and return its status line.
    pub fn apply(&mut self, result: Result<ScanResponse, IntakeError>) -> String {
        match result {
            Ok(resp) => {
                let line = render::status_line(&resp);
                if resp.success {
                    if let Some(package) = resp.package {
                        self.record(package);
                    }
                }
                line
            }
            Err(IntakeError::Read { path, source }) => {
                format!("Could not read {}: {source}", path.display())
            }
            Err(_) => render::NETWORK_ERROR.to_string(),
        }
    }
}
