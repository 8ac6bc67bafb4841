use async_trait::async_trait;
use mailroom_core::DirectoryMatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directory returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read directory file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse directory file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DirectoryError {
    /// Short reason safe to hand back to clients. Response bodies and
    /// transport detail stay in the logs.
    pub fn summary(&self) -> String {
        match self {
            DirectoryError::Http(e) if e.is_timeout() => "directory request timed out".into(),
            DirectoryError::Http(_) => "directory request failed".into(),
            DirectoryError::Server { status, .. } => format!("directory returned status {status}"),
            DirectoryError::Json(_) => "directory returned an unreadable response".into(),
            DirectoryError::Io(_) | DirectoryError::Toml(_) => "directory file unavailable".into(),
        }
    }
}

/// One known person in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: Some(email.into()) }
    }

    /// The entry as a match, if it has a usable email.
    pub fn to_match(&self) -> Option<DirectoryMatch> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        Some(DirectoryMatch { name: self.name.clone(), email: email.to_string() })
    }
}

/// Resolves a recipient name to a contact email.
#[async_trait]
pub trait DirectoryBackend: Send + Sync {
    /// `Ok(None)` means the directory answered but had no usable match.
    async fn lookup(&self, name: &str) -> Result<Option<DirectoryMatch>, DirectoryError>;
}
