use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::errors::AppError;

/// Name of the intent slot holding the spoken account name.
pub const ACCOUNT_SLOT: &str = "Account";

/// Inbound voice-assistant request. Only the account slot is interpreted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SkillRequest {
    #[serde(default)]
    pub request: Option<SkillRequestBody>,

    /// Session, context and version fields, kept opaque
    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SkillRequestBody {
    /// Request type (e.g., "IntentRequest", "LaunchRequest")
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub intent: Option<Intent>,

    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Intent {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Slot {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub value: Option<String>,
}

impl SkillRequest {
    /// Parses a request body; any decoding failure is a malformed request.
    pub fn from_slice(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body)
            .map_err(|e| AppError::MalformedRequest(format!("Invalid request body: {}", e)))
    }

    /// Spoken account name from `request.intent.slots.Account.value`.
    ///
    /// A blank value counts as missing.
    pub fn keyword(&self) -> Option<&str> {
        self.request
            .as_ref()?
            .intent
            .as_ref()?
            .slots
            .get(ACCOUNT_SLOT)?
            .value
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

/// Outbound speech envelope. Every response ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpeechResponse {
    pub response: SpeechBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechBody {
    pub output_speech: OutputSpeech,
    pub should_end_session: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl SpeechResponse {
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self {
            response: SpeechBody {
                output_speech: OutputSpeech {
                    kind: "PlainText".to_string(),
                    text: text.into(),
                },
                should_end_session: true,
            },
        }
    }

    pub fn text(&self) -> &str {
        &self.response.output_speech.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_account_slot() {
        let request: SkillRequest = serde_json::from_value(json!({
            "version": "1.0",
            "session": {"new": true},
            "request": {
                "type": "IntentRequest",
                "requestId": "amzn1.echo-api.request.1",
                "intent": {
                    "name": "GetBalance",
                    "slots": {"Account": {"name": "Account", "value": "checking"}}
                }
            }
        }))
        .unwrap();

        assert_eq!(request.keyword(), Some("checking"));
        assert!(request.raw.contains_key("session"));
        assert_eq!(
            request.request.as_ref().unwrap().kind.as_deref(),
            Some("IntentRequest")
        );
    }

    #[test]
    fn test_missing_slot_value_is_none() {
        let cases = vec![
            json!({}),
            json!({"request": {"type": "LaunchRequest"}}),
            json!({"request": {"intent": {"name": "GetBalance"}}}),
            json!({"request": {"intent": {"slots": {"Account": {"name": "Account"}}}}}),
            json!({"request": {"intent": {"slots": {"Account": {"value": "   "}}}}}),
            json!({"request": {"intent": {"slots": {"Bank": {"value": "chase"}}}}}),
        ];

        for case in cases {
            let request: SkillRequest = serde_json::from_value(case.clone()).unwrap();
            assert_eq!(request.keyword(), None, "payload: {}", case);
        }
    }

    #[test]
    fn test_invalid_body_is_malformed_request() {
        assert!(matches!(
            SkillRequest::from_slice(b"not json"),
            Err(AppError::MalformedRequest(_))
        ));
        assert!(matches!(
            SkillRequest::from_slice(br#"{"request": "oops"}"#),
            Err(AppError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_response_wire_format() {
        let response = SpeechResponse::plain_text("Your Checking account is empty.");

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "response": {
                    "outputSpeech": {
                        "type": "PlainText",
                        "text": "Your Checking account is empty."
                    },
                    "shouldEndSession": true
                }
            })
        );
    }
}
