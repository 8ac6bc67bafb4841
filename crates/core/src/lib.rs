pub mod api;
pub mod carrier;
pub mod error;
pub mod extraction;
pub mod package;

pub use api::{ScanRequest, ScanResponse};
pub use carrier::{CarrierHint, CARRIER_HINTS};
pub use error::{ErrorKind, ScanError};
pub use extraction::{DirectoryMatch, DirectoryOutcome, RawExtraction, SkipReason};
pub use package::{PackageRecord, PackageStatus};
