//! One scan, start to finish: decode → extract → directory lookup → merge.
//!
//! Each step is a plain function of the previous step's output. The vision
//! provider and the directory are the only I/O and sit behind traits, so the
//! whole pipeline runs against fakes in tests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use mailroom_core::{
    DirectoryOutcome, PackageRecord, RawExtraction, ScanError, ScanRequest, SkipReason,
};
use mailroom_directory::{DirectoryBackend, PostgrestDirectory, PostgrestSettings, StaticDirectory};
use mailroom_vision::{LabelImage, OpenAiVision, VisionBackend};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{DirectorySource, ServiceConfig};

/// Source of `time_received`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub scan_id: Uuid,
    pub package: PackageRecord,
    pub directory: DirectoryOutcome,
}

pub struct ScanPipeline {
    vision: Option<Arc<dyn VisionBackend>>,
    directory: Option<Arc<dyn DirectoryBackend>>,
    directory_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl ScanPipeline {
    pub fn new(
        vision: Option<Arc<dyn VisionBackend>>,
        directory: Option<Arc<dyn DirectoryBackend>>,
        directory_timeout: Duration,
    ) -> Self {
        Self { vision, directory, directory_timeout, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Wire up the real backends. A missing vision key is not an error here;
    /// scans report it per request. A directory file that cannot be read is.
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let vision: Option<Arc<dyn VisionBackend>> = match &config.vision.api_key {
            Some(key) => Some(Arc::new(OpenAiVision::new(
                &config.vision.base_url,
                key.clone(),
                config.vision.model.clone(),
                config.vision.timeout,
            )?)),
            None => {
                warn!("OPENAI_API_KEY is not set; scans will fail until it is configured");
                None
            }
        };

        let settings = &config.directory;
        let directory: Option<Arc<dyn DirectoryBackend>> = match &settings.source {
            DirectorySource::Disabled => None,
            DirectorySource::Postgrest { url, api_key } => {
                let postgrest = PostgrestSettings {
                    base_url: url.clone(),
                    table: settings.table.clone(),
                    name_column: settings.name_column.clone(),
                    email_column: settings.email_column.clone(),
                    policy: settings.policy,
                    candidate_limit: settings.candidate_limit,
                    timeout: settings.timeout,
                };
                Some(Arc::new(PostgrestDirectory::new(postgrest, api_key.clone())?))
            }
            DirectorySource::File(path) => {
                let fixed = StaticDirectory::load(path, settings.policy, settings.candidate_limit)
                    .with_context(|| format!("loading directory file {}", path.display()))?;
                info!(entries = fixed.len(), path = %path.display(), "directory file loaded");
                Some(Arc::new(fixed))
            }
        };

        Ok(Self::new(vision, directory, settings.timeout))
    }

    pub fn vision_configured(&self) -> bool {
        self.vision.is_some()
    }

    pub fn directory_configured(&self) -> bool {
        self.directory.is_some()
    }

    #[instrument(skip_all, fields(scan_id = tracing::field::Empty, fingerprint = tracing::field::Empty))]
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanOutcome, ScanError> {
        let image = decode(&request)?;
        let vision = self
            .vision
            .as_ref()
            .ok_or_else(|| ScanError::Configuration("vision provider API key is not set".into()))?;

        let scan_id = Uuid::new_v4();
        let span = tracing::Span::current();
        span.record("scan_id", tracing::field::display(scan_id));
        span.record("fingerprint", image.fingerprint().as_str());

        let raw = vision.extract(&image).await.map_err(|e| {
            error!(error = %e, "label extraction failed");
            ScanError::from(e)
        })?;

        let directory = self.resolve_directory(&raw).await;
        let package = PackageRecord::merge(&raw, directory.resolved().as_ref(), self.clock.now());
        info!(
            carrier = package.carrier.as_deref().unwrap_or("-"),
            has_email = package.recipient_email.is_some(),
            "package scanned"
        );
        Ok(ScanOutcome { scan_id, package, directory })
    }

    /// Directory problems never fail a scan; they are reported in the outcome.
    async fn resolve_directory(&self, raw: &RawExtraction) -> DirectoryOutcome {
        let Some(name) = raw.lookup_name() else {
            return DirectoryOutcome::Skipped { reason: SkipReason::NoRecipientName };
        };
        let Some(directory) = &self.directory else {
            return DirectoryOutcome::Skipped { reason: SkipReason::NotConfigured };
        };

        match tokio::time::timeout(self.directory_timeout, directory.lookup(name)).await {
            Ok(Ok(found)) => DirectoryOutcome::from_match(found),
            Ok(Err(e)) => {
                warn!(error = %e, "directory lookup failed");
                DirectoryOutcome::Failed { error: e.summary() }
            }
            Err(_) => {
                warn!(timeout_ms = self.directory_timeout.as_millis() as u64, "directory lookup timed out");
                DirectoryOutcome::Failed { error: "directory lookup timed out".into() }
            }
        }
    }
}

fn decode(request: &ScanRequest) -> Result<LabelImage, ScanError> {
    let payload = request
        .image
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ScanError::UserInput("No image provided".into()))?;
    LabelImage::from_base64(payload).map_err(|e| ScanError::UserInput(e.to_string()))
}
