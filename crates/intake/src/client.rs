use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mailroom_core::{ScanRequest, ScanResponse};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response ({status}): {body}")]
    Server { status: u16, body: String },
}

/// Talks to `POST /api/scan` on a running server.
pub struct IntakeClient {
    http: reqwest::Client,
    scan_url: String,
}

impl IntakeClient {
    pub fn new(server: &str, timeout: Duration) -> Result<Self, IntakeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, scan_url: format!("{}/api/scan", server.trim_end_matches('/')) })
    }

    /// Read a label photo and submit it. An unreadable file fails before any
    /// request is made.
    pub async fn scan_file(&self, path: &Path) -> Result<ScanResponse, IntakeError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| IntakeError::Read { path: path.to_path_buf(), source })?;
        self.scan_bytes(&bytes).await
    }

    /// Submit raw image bytes. Error replies from the server come back as
    /// `Ok` with `success: false`; only unreadable replies are errors.
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub async fn scan_bytes(&self, bytes: &[u8]) -> Result<ScanResponse, IntakeError> {
        let request = ScanRequest { image: Some(STANDARD.encode(bytes)) };
        let resp = self.http.post(&self.scan_url).json(&request).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        debug!(status = status.as_u16(), "scan reply received");

        serde_json::from_str(&body).map_err(|_| IntakeError::Server { status: status.as_u16(), body })
    }
}
