use sha2::{Digest, Sha256};

/// Compute SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex SHA-256 (64 chars) identifying a label image in logs.
pub fn fingerprint(data: &[u8]) -> String {
    hex::encode(sha256_bytes(data))
}
