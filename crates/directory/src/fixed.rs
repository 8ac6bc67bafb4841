use std::path::Path;

use async_trait::async_trait;
use mailroom_core::DirectoryMatch;
use serde::Deserialize;

use crate::backend::{DirectoryBackend, DirectoryEntry, DirectoryError};
use crate::policy::MatchPolicy;

#[derive(Deserialize)]
struct DirectoryFile {
    #[serde(default, rename = "entry")]
    entries: Vec<DirectoryEntry>,
}

/// In-process directory, typically loaded from a TOML file:
///
/// ```toml
/// [[entry]]
/// name = "Jane Doe"
/// email = "jane@example.com"
/// ```
pub struct StaticDirectory {
    entries: Vec<DirectoryEntry>,
    policy: MatchPolicy,
    candidate_limit: usize,
}

impl StaticDirectory {
    pub fn new(entries: Vec<DirectoryEntry>, policy: MatchPolicy, candidate_limit: usize) -> Self {
        Self { entries, policy, candidate_limit: candidate_limit.max(1) }
    }

    pub fn from_toml(content: &str, policy: MatchPolicy, candidate_limit: usize) -> Result<Self, DirectoryError> {
        let file: DirectoryFile = toml::from_str(content)?;
        Ok(Self::new(file.entries, policy, candidate_limit))
    }

    pub fn load(path: &Path, policy: MatchPolicy, candidate_limit: usize) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content, policy, candidate_limit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DirectoryBackend for StaticDirectory {
    async fn lookup(&self, name: &str) -> Result<Option<DirectoryMatch>, DirectoryError> {
        // Same bound a remote directory applies: only the first few rows that
        // match at all are considered.
        let candidates: Vec<DirectoryEntry> = self
            .entries
            .iter()
            .filter(|e| self.policy.score(name, &e.name).is_some())
            .take(self.candidate_limit)
            .cloned()
            .collect();
        Ok(self.policy.select(name, &candidates).and_then(DirectoryEntry::to_match))
    }
}
