use serde::{Deserialize, Serialize};

use crate::backend::DirectoryEntry;
use crate::util::{levenshtein_distance, normalize_name};

const DEFAULT_FUZZY_THRESHOLD: f32 = 0.8;

/// How an extracted recipient name is compared against directory names.
/// All variants ignore case and extra whitespace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum MatchPolicy {
    /// The directory name contains the recipient name.
    #[default]
    Contains,
    Exact,
    /// Normalised edit-distance similarity at or above `threshold`.
    Fuzzy {
        threshold: f32,
    },
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contains" => Ok(MatchPolicy::Contains),
            "exact" => Ok(MatchPolicy::Exact),
            "fuzzy" => Ok(MatchPolicy::Fuzzy { threshold: DEFAULT_FUZZY_THRESHOLD }),
            s if s.starts_with("fuzzy:") => {
                let threshold = s[6..]
                    .parse::<f32>()
                    .map_err(|_| "Invalid fuzzy threshold".to_string())?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(format!("Fuzzy threshold must be between 0 and 1, got {threshold}"));
                }
                Ok(MatchPolicy::Fuzzy { threshold })
            }
            other => Err(format!("Unknown match policy: '{other}'")),
        }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Contains => write!(f, "contains"),
            MatchPolicy::Exact => write!(f, "exact"),
            MatchPolicy::Fuzzy { threshold } => write!(f, "fuzzy:{threshold}"),
        }
    }
}

impl MatchPolicy {
    /// Similarity of `candidate` to `query`, or `None` if it does not match.
    ///
    /// The query goes through the same cleanup as [`Self::search_patterns`],
    /// so rows a remote directory returns for it are scored on equal terms.
    pub fn score(&self, query: &str, candidate: &str) -> Option<f32> {
        let query = normalize_name(&sanitize(query));
        let candidate = normalize_name(candidate);
        if query.is_empty() {
            return None;
        }
        match self {
            MatchPolicy::Contains => candidate.contains(&query).then_some(1.0),
            MatchPolicy::Exact => (candidate == query).then_some(1.0),
            MatchPolicy::Fuzzy { threshold } => {
                let score = similarity(&query, &candidate);
                (score >= *threshold).then_some(score)
            }
        }
    }

    /// Pick the entry to use for `query`. Entries without an email are
    /// skipped. Ties keep directory order, so for `Contains` and `Exact` the
    /// first matching row wins.
    pub fn select<'a>(&self, query: &str, candidates: &'a [DirectoryEntry]) -> Option<&'a DirectoryEntry> {
        let mut best: Option<(&DirectoryEntry, f32)> = None;
        for entry in candidates.iter().filter(|e| e.to_match().is_some()) {
            let Some(score) = self.score(query, &entry.name) else {
                continue;
            };
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((entry, score)),
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Case-insensitive `ilike` patterns (`*` as wildcard) that narrow the
    /// candidate rows a remote directory has to return. Any row matching one
    /// of them is a candidate.
    pub fn search_patterns(&self, query: &str) -> Vec<String> {
        let cleaned = sanitize(query);
        if cleaned.is_empty() {
            return Vec::new();
        }
        match self {
            MatchPolicy::Contains => vec![format!("*{cleaned}*")],
            MatchPolicy::Exact => vec![cleaned],
            MatchPolicy::Fuzzy { .. } => cleaned.split(' ').map(|token| format!("*{token}*")).collect(),
        }
    }
}

fn similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(a, b) as f32 / max_len as f32)
}

/// Keep only characters that are safe inside a PostgREST filter value.
fn sanitize(query: &str) -> String {
    let kept: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '\'' | '-') { c } else { ' ' })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
