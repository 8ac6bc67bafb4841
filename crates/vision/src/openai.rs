use std::time::Duration;

use async_trait::async_trait;
use mailroom_core::RawExtraction;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::backend::{VisionBackend, VisionError};
use crate::parse;
use crate::payload::LabelImage;
use crate::prompt;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Vision backend for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAiVision {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiVision {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, VisionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, image: &LabelImage) -> Value {
        json!({
            "model": self.model,
            "temperature": 0,
            "response_format": prompt::response_format(),
            "messages": [
                { "role": "system", "content": prompt::system_prompt() },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt::USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": image.to_data_url() } }
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl VisionBackend for OpenAiVision {
    #[instrument(skip_all, fields(model = %self.model, mime = image.mime_type()))]
    async fn extract(&self, image: &LabelImage) -> Result<RawExtraction, VisionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "vision provider responded");

        if !status.is_success() {
            return Err(VisionError::Status {
                status: status.as_u16(),
                body: parse::payload_value(&body),
            });
        }
        parse::parse_completion(&body)
    }
}
