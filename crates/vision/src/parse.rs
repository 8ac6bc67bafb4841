use std::sync::OnceLock;

use mailroom_core::RawExtraction;
use regex::Regex;
use serde_json::{Map, Value};

use crate::backend::VisionError;

fn re_code_fence() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("invalid regex"))
}

/// Provider body as JSON when it is JSON, otherwise as a plain string, so
/// diagnostics are passed on exactly as received.
pub fn payload_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Parse a chat-completions response body into a raw extraction.
pub fn parse_completion(body: &str) -> Result<RawExtraction, VisionError> {
    let parsed: Value = serde_json::from_str(body).map_err(|e| VisionError::Malformed {
        reason: format!("response body is not JSON: {e}"),
        raw: Value::String(body.to_string()),
    })?;

    let message = &parsed["choices"][0]["message"];
    let Some(content) = message["content"].as_str() else {
        let reason = match message["refusal"].as_str() {
            Some(refusal) => format!("model declined to answer: {refusal}"),
            None => "response has no message content".to_string(),
        };
        return Err(VisionError::Malformed { reason, raw: parsed });
    };

    parse_extraction(content).map_err(|reason| VisionError::Malformed { reason, raw: parsed.clone() })
}

/// Parse the model's message content. Tolerates a surrounding Markdown code
/// fence; anything that is not a JSON object is rejected.
pub fn parse_extraction(content: &str) -> Result<RawExtraction, String> {
    let unwrapped = re_code_fence()
        .captures(content)
        .and_then(|c| c.get(1))
        .map_or(content, |m| m.as_str());

    let value: Value = serde_json::from_str(unwrapped.trim())
        .map_err(|e| format!("model content is not JSON: {e}"))?;
    let Value::Object(fields) = value else {
        return Err("model content is not a JSON object".to_string());
    };

    Ok(RawExtraction {
        recipient_name: text_field(&fields, "recipient_name"),
        recipient_email: text_field(&fields, "recipient_email"),
        carrier: text_field(&fields, "carrier"),
        tracking_number: text_field(&fields, "tracking_number"),
    })
}

/// Strings pass through, numbers become their decimal text, everything else
/// (null, missing, bool, array, object) is absent.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completion(content: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
        .to_string()
    }

    #[test]
    fn parses_plain_json_content() {
        let body = completion(
            r#"{"recipient_name":"Jane Doe","recipient_email":null,"carrier":"UPS","tracking_number":"1Z9990000"}"#,
        );
        let raw = parse_completion(&body).unwrap();
        assert_eq!(raw.recipient_name.as_deref(), Some("Jane Doe"));
        assert!(raw.recipient_email.is_none());
        assert_eq!(raw.carrier.as_deref(), Some("UPS"));
        assert_eq!(raw.tracking_number.as_deref(), Some("1Z9990000"));
    }

    #[test]
    fn unwraps_code_fence() {
        let raw = parse_extraction("```json\n{\"carrier\": \"USPS\"}\n```").unwrap();
        assert_eq!(raw.carrier.as_deref(), Some("USPS"));
        assert!(raw.recipient_name.is_none());
    }

    #[test]
    fn numeric_tracking_number_becomes_text() {
        let raw = parse_extraction(r#"{"tracking_number": 940011189922}"#).unwrap();
        assert_eq!(raw.tracking_number.as_deref(), Some("940011189922"));
    }

    #[test]
    fn odd_types_are_absent() {
        let raw = parse_extraction(r#"{"recipient_name": ["Jane"], "carrier": false, "recipient_email": {}}"#)
            .unwrap();
        assert_eq!(raw, RawExtraction::default());
    }

    #[test]
    fn prose_content_is_malformed() {
        let body = completion("Sorry, I can't read this label.");
        match parse_completion(&body) {
            Err(VisionError::Malformed { reason, raw }) => {
                assert!(reason.contains("not JSON"), "{reason}");
                assert_eq!(raw["choices"][0]["message"]["content"], "Sorry, I can't read this label.");
            }
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn array_content_is_malformed() {
        assert!(parse_extraction("[1, 2]").is_err());
    }

    #[test]
    fn non_json_body_is_malformed_with_raw_text() {
        match parse_completion("<html>bad gateway</html>") {
            Err(VisionError::Malformed { raw, .. }) => {
                assert_eq!(raw, Value::String("<html>bad gateway</html>".into()));
            }
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn refusal_is_reported() {
        let body = json!({
            "choices": [{ "message": { "content": null, "refusal": "cannot help" } }]
        })
        .to_string();
        match parse_completion(&body) {
            Err(VisionError::Malformed { reason, .. }) => assert!(reason.contains("cannot help")),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn payload_value_keeps_non_json_text() {
        assert_eq!(payload_value(r#"{"error":"x"}"#), json!({ "error": "x" }));
        assert_eq!(payload_value("oops"), Value::String("oops".into()));
    }
}
