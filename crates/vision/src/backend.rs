use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mailroom_core::{RawExtraction, ScanError};
use serde_json::Value;
use thiserror::Error;

use crate::payload::LabelImage;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("request to vision provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("vision provider returned status {status}")]
    Status { status: u16, body: Value },
    #[error("{reason}")]
    Malformed { reason: String, raw: Value },
}

impl From<VisionError> for ScanError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Transport(e) => ScanError::ExtractionProvider {
                message: format!("request failed: {e}"),
                details: None,
            },
            VisionError::Status { status, body } => ScanError::ExtractionProvider {
                message: format!("provider returned status {status}"),
                details: Some(body),
            },
            VisionError::Malformed { reason, raw } => ScanError::MalformedExtraction { message: reason, raw },
        }
    }
}

/// A service that reads shipping-label fields out of an image.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn extract(&self, image: &LabelImage) -> Result<RawExtraction, VisionError>;
}

// ── Mock backend ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum MockReply {
    Extract(RawExtraction),
    Status(u16, Value),
    Malformed(String),
}

/// Replies with a preset answer and counts how often it was asked.
pub struct MockVision {
    reply: MockReply,
    calls: AtomicUsize,
}

impl MockVision {
    pub fn new(reply: MockReply) -> Self {
        Self { reply, calls: AtomicUsize::new(0) }
    }

    pub fn returning(raw: RawExtraction) -> Self {
        Self::new(MockReply::Extract(raw))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionBackend for MockVision {
    async fn extract(&self, _image: &LabelImage) -> Result<RawExtraction, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Extract(raw) => Ok(raw.clone()),
            MockReply::Status(status, body) => Err(VisionError::Status { status: *status, body: body.clone() }),
            MockReply::Malformed(text) => Err(VisionError::Malformed {
                reason: "model content is not JSON".into(),
                raw: Value::String(text.clone()),
            }),
        }
    }
}
