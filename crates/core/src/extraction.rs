use serde::{Deserialize, Serialize};

/// Fields read off a label by the vision provider. Nothing here is trusted:
/// every field may be missing, null or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

impl RawExtraction {
    /// The recipient name, if it carries any non-whitespace text.
    pub fn lookup_name(&self) -> Option<&str> {
        non_blank(self.recipient_name.as_deref())
    }
}

/// A single directory row resolved for a recipient name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMatch {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoRecipientName,
    NotConfigured,
}

/// What happened to the optional directory enrichment step of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DirectoryOutcome {
    Skipped { reason: SkipReason },
    Matched { name: String, email: String },
    NoMatch,
    Failed { error: String },
}

impl DirectoryOutcome {
    pub fn from_match(found: Option<DirectoryMatch>) -> Self {
        match found {
            Some(m) => DirectoryOutcome::Matched { name: m.name, email: m.email },
            None => DirectoryOutcome::NoMatch,
        }
    }

    /// The resolved match, if the lookup produced one.
    pub fn resolved(&self) -> Option<DirectoryMatch> {
        match self {
            DirectoryOutcome::Matched { name, email } => Some(DirectoryMatch {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        }
    }
}

/// Trimmed view of `value`, or `None` when it is absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_none() {
        let raw: RawExtraction = serde_json::from_str(r#"{"carrier": "UPS"}"#).unwrap();
        assert_eq!(raw.carrier.as_deref(), Some("UPS"));
        assert!(raw.recipient_name.is_none());
        assert!(raw.tracking_number.is_none());
    }

    #[test]
    fn lookup_name_ignores_blank() {
        let raw = RawExtraction { recipient_name: Some("   ".into()), ..Default::default() };
        assert_eq!(raw.lookup_name(), None);

        let raw = RawExtraction { recipient_name: Some(" Jane Doe ".into()), ..Default::default() };
        assert_eq!(raw.lookup_name(), Some("Jane Doe"));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(DirectoryOutcome::Skipped {
            reason: SkipReason::NotConfigured,
        })
        .unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "not_configured");

        let json = serde_json::to_value(DirectoryOutcome::NoMatch).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "no_match" }));
    }

    #[test]
    fn only_matched_outcome_resolves() {
        let matched = DirectoryOutcome::Matched {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
        };
        assert_eq!(matched.resolved().unwrap().email, "jane@example.com");
        assert!(DirectoryOutcome::Failed { error: "boom".into() }.resolved().is_none());
        assert!(DirectoryOutcome::NoMatch.resolved().is_none());
    }
}
