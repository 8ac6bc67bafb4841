use mailroom_core::CARRIER_HINTS;
use serde_json::{json, Value};

/// The four fields every extraction must contain, in schema order.
pub const FIELDS: [&str; 4] = ["recipient_name", "recipient_email", "carrier", "tracking_number"];

pub const SCHEMA_NAME: &str = "shipping_label";

pub const USER_PROMPT: &str =
    "Read this shipping label and return the recipient and shipment details as JSON.";

/// Instructions sent as the system message of every extraction call.
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You extract data from photos of shipping labels in a mailroom.\n\
         Respond with ONLY a JSON object, no prose and no code fences, with exactly these keys:\n",
    );
    for field in FIELDS {
        prompt.push_str(&format!("- \"{field}\": string or null\n"));
    }
    prompt.push_str("\nIdentify the carrier from the label:\n");
    for hint in CARRIER_HINTS {
        prompt.push_str(&format!("- \"{}\": {}\n", hint.name, hint.cues));
    }
    prompt.push_str(
        "If none of these match, \"carrier\" is null.\n\
         Use null for any field you cannot read with confidence. Never omit a key.",
    );
    prompt
}

/// Strict `response_format` mirroring [`FIELDS`]: four nullable strings,
/// all required, nothing else allowed.
pub fn response_format() -> Value {
    let properties: serde_json::Map<String, Value> = FIELDS
        .iter()
        .map(|f| (f.to_string(), json!({ "type": ["string", "null"] })))
        .collect();

    json!({
        "type": "json_schema",
        "json_schema": {
            "name": SCHEMA_NAME,
            "strict": true,
            "schema": {
                "type": "object",
                "properties": properties,
                "required": FIELDS,
                "additionalProperties": false,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_fields_and_carriers() {
        let prompt = system_prompt();
        for field in FIELDS {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("1Z"));
        assert!(prompt.contains("United States Postal Service"));
        assert!(prompt.contains("AMZL"));
        assert!(prompt.contains("ONLY a JSON object"));
    }

    #[test]
    fn schema_requires_all_fields() {
        let format = response_format();
        let schema = &format["json_schema"]["schema"];
        assert_eq!(format["json_schema"]["strict"], true);
        assert_eq!(schema["required"].as_array().unwrap().len(), 4);
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["properties"]["carrier"]["type"], json!(["string", "null"]));
    }
}
