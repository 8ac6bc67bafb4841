use std::sync::OnceLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use regex::Regex;
use thiserror::Error;

use crate::hash;

/// Standard alphabet; accepts payloads with or without trailing `=`.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const FALLBACK_MIME: &str = "image/jpeg";

fn re_data_url() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"(?i)^data:([a-z0-9.+-]+/[a-z0-9.+-]+)?[^,]*;base64,").expect("invalid regex"))
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("No image provided")]
    Empty,
    #[error("Image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A decoded label photo ready to hand to a vision backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelImage {
    bytes: Vec<u8>,
    mime_type: String,
}

impl LabelImage {
    /// Decode a base64 payload, with or without a `data:<mime>;base64,` prefix.
    pub fn from_base64(payload: &str) -> Result<Self, PayloadError> {
        let payload = payload.trim();
        let (declared, encoded) = match re_data_url().captures(payload) {
            Some(c) => {
                let prefix_len = c.get(0).map_or(0, |m| m.end());
                (c.get(1).map(|m| m.as_str().to_lowercase()), &payload[prefix_len..])
            }
            None => (None, payload),
        };

        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if compact.is_empty() {
            return Err(PayloadError::Empty);
        }
        let bytes = LENIENT.decode(compact.as_bytes())?;
        Self::with_declared_type(bytes, declared)
    }

    /// Wrap raw file bytes (e.g. read from disk by a client).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PayloadError> {
        Self::with_declared_type(bytes, None)
    }

    fn with_declared_type(bytes: Vec<u8>, declared: Option<String>) -> Result<Self, PayloadError> {
        if bytes.is_empty() {
            return Err(PayloadError::Empty);
        }
        // Magic bytes beat whatever the client claimed.
        let mime_type = image::guess_format(&bytes)
            .ok()
            .map(|f| f.to_mime_type().to_string())
            .or(declared.filter(|m| m.starts_with("image/")))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());
        Ok(Self { bytes, mime_type })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_base64(&self) -> String {
        LENIENT.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn fingerprint(&self) -> String {
        hash::fingerprint(&self.bytes)
    }
}
