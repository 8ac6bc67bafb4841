use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extraction::{non_blank, DirectoryMatch, RawExtraction};

/// Lifecycle state of a logged package. Intake only ever creates packages
/// waiting for pickup; later transitions belong to whatever persists them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageStatus {
    #[default]
    #[serde(rename = "Waiting for pickup")]
    WaitingForPickup,
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageStatus::WaitingForPickup => write!(f, "Waiting for pickup"),
        }
    }
}

impl std::str::FromStr for PackageStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Waiting for pickup" => Ok(PackageStatus::WaitingForPickup),
            other => Err(format!("Unknown package status: '{other}'")),
        }
    }
}

/// The canonical record produced by one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub time_received: DateTime<Utc>,
    pub status: PackageStatus,
}

impl PackageRecord {
    /// Merge a raw extraction with an optional directory match.
    ///
    /// An email printed on the label always beats the directory; the
    /// directory only fills in labels with no usable email. Every other field
    /// passes through, with blank strings collapsing to `None`.
    pub fn merge(
        raw: &RawExtraction,
        directory: Option<&DirectoryMatch>,
        received_at: DateTime<Utc>,
    ) -> Self {
        let label_email = non_blank(raw.recipient_email.as_deref());
        let directory_email = directory.and_then(|m| non_blank(Some(m.email.as_str())));

        PackageRecord {
            recipient_name: owned(raw.recipient_name.as_deref()),
            recipient_email: label_email.or(directory_email).map(str::to_string),
            carrier: owned(raw.carrier.as_deref()),
            tracking_number: owned(raw.tracking_number.as_deref()),
            time_received: received_at,
            status: PackageStatus::WaitingForPickup,
        }
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}
