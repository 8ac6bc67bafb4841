//! Request and response bodies of `POST /api/scan`, shared by the service and
//! its clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ErrorKind, ScanError};
use crate::extraction::DirectoryOutcome;
use crate::package::PackageRecord;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Base64 image bytes, optionally as a `data:` URL.
    #[serde(default, alias = "image_base64")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageRecord>,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_lookup: Option<DirectoryOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ScanResponse {
    pub fn scanned(scan_id: Uuid, package: PackageRecord, directory_lookup: DirectoryOutcome) -> Self {
        ScanResponse {
            success: true,
            scan_id: Some(scan_id),
            package: Some(package),
            // Notification delivery is not part of intake.
            email_sent: false,
            directory_lookup: Some(directory_lookup),
            error: None,
            kind: None,
            details: None,
        }
    }

    pub fn failed(kind: ErrorKind, error: impl Into<String>, details: Option<Value>) -> Self {
        ScanResponse {
            success: false,
            scan_id: None,
            package: None,
            email_sent: false,
            directory_lookup: None,
            error: Some(error.into()),
            kind: Some(kind),
            details,
        }
    }
}

impl From<&ScanError> for ScanResponse {
    fn from(err: &ScanError) -> Self {
        ScanResponse::failed(err.kind(), err.to_string(), err.details().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::RawExtraction;
    use chrono::Utc;

    #[test]
    fn request_accepts_alias() {
        let req: ScanRequest = serde_json::from_str(r#"{"image_base64": "aGk="}"#).unwrap();
        assert_eq!(req.image.as_deref(), Some("aGk="));
        let req: ScanRequest = serde_json::from_str("{}").unwrap();
        assert!(req.image.is_none());
    }

    #[test]
    fn success_body_shape() {
        let package = PackageRecord::merge(&RawExtraction::default(), None, Utc::now());
        let body = ScanResponse::scanned(Uuid::new_v4(), package, DirectoryOutcome::NoMatch);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["email_sent"], false);
        assert_eq!(json["package"]["status"], "Waiting for pickup");
        assert_eq!(json["directory_lookup"]["outcome"], "no_match");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_body_carries_details() {
        let err = ScanError::MalformedExtraction {
            message: "not an object".into(),
            raw: Value::String("I could not read the label".into()),
        };
        let json = serde_json::to_value(ScanResponse::from(&err)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "malformed_extraction");
        assert_eq!(json["details"], "I could not read the label");
        assert!(json.get("package").is_none());
    }
}
