//! Normalized inbound request

use crate::error::HybridError;
use crate::types::{RequestKind, Urgency};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const TEXT_ALIASES: [&str; 6] = ["query", "user_query", "prompt", "command", "transcript", "text"];
const MEDIA_ALIASES: [&str; 3] = ["image", "image_data", "image_uri"];

/// Reference to binary media held elsewhere (URI, file path or inline base64)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Query, command or transcript text
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media: Option<MediaRef>,
    /// Extra context captured alongside audio
    #[serde(default)]
    pub auxiliary_context: Option<String>,
}

impl Payload {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }
}

/// An inbound event. Shared behind `Arc` once submitted and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub kind: RequestKind,
    pub payload: Payload,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Caller-supplied identifier echoed in every emission
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl Request {
    /// Create a request with a generated id
    pub fn new(kind: RequestKind, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            payload: Payload {
                text: text.into(),
                ..Payload::default()
            },
            urgency: Urgency::Normal,
            context: BTreeMap::new(),
            correlation_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.payload.media = Some(MediaRef(media.into()));
        self
    }

    pub fn with_auxiliary_context(mut self, aux: impl Into<String>) -> Self {
        self.payload.auxiliary_context = Some(aux.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Reject requests that carry nothing a backend could act on
    pub fn validate(&self) -> Result<(), HybridError> {
        if self.id.trim().is_empty() {
            return Err(HybridError::MalformedRequest("empty request id".to_string()));
        }
        if !self.payload.has_text() && !self.payload.has_media() {
            return Err(HybridError::MalformedRequest(format!(
                "{} request has neither text nor media",
                self.kind
            )));
        }
        Ok(())
    }

    /// Parse the wire schema sent by the wearable
    pub fn from_json(value: &Value) -> Result<Self, HybridError> {
        let obj = value
            .as_object()
            .ok_or_else(|| HybridError::MalformedRequest("request is not a JSON object".into()))?;

        let tag = ["type", "message_type"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .filter(|tag| !tag.trim().is_empty())
            .ok_or_else(|| HybridError::MalformedRequest("missing type tag".into()))?;

        let text = first_string(obj, &TEXT_ALIASES).unwrap_or_default();
        let media = first_string(obj, &MEDIA_ALIASES).map(MediaRef);
        let auxiliary_context = first_string(obj, &["audio_context"]);

        let urgency = obj
            .get("urgency")
            .and_then(Value::as_str)
            .map(Urgency::parse)
            .unwrap_or_default();

        let context = match obj.get("context") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| {
                    let rendered = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), rendered)
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        let correlation_id = first_string(obj, &["correlationId", "messageId"]);

        let request = Request {
            id: uuid::Uuid::new_v4().to_string(),
            kind: RequestKind::from_tag(tag),
            payload: Payload {
                text,
                media,
                auxiliary_context,
            },
            urgency,
            context,
            correlation_id,
        };
        request.validate()?;
        Ok(request)
    }
}

fn first_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_image_query() {
        let value = json!({
            "type": "pov_image_query",
            "user_query": "describe this scene",
            "image_data": "aGVsbG8=",
            "context": {"location": "kitchen", "timestamp": 1700000000},
            "messageId": "m-1"
        });
        let request = Request::from_json(&value).unwrap();
        assert_eq!(request.kind, RequestKind::ImageQuery);
        assert_eq!(request.payload.text, "describe this scene");
        assert!(request.payload.has_media());
        assert_eq!(request.context.get("location").unwrap(), "kitchen");
        assert_eq!(request.context.get("timestamp").unwrap(), "1700000000");
        assert_eq!(request.correlation_id.as_deref(), Some("m-1"));
    }

    #[test]
    fn test_correlation_id_preferred_over_message_id() {
        let value = json!({
            "type": "text_query",
            "query": "hello",
            "correlationId": "c-9",
            "messageId": "m-9"
        });
        let request = Request::from_json(&value).unwrap();
        assert_eq!(request.correlation_id.as_deref(), Some("c-9"));
    }

    #[test]
    fn test_missing_type_is_malformed() {
        let err = Request::from_json(&json!({"query": "hi"})).unwrap_err();
        assert!(matches!(err, HybridError::MalformedRequest(_)));
    }

    #[test]
    fn test_empty_payload_is_malformed() {
        let err = Request::from_json(&json!({"type": "voice_command", "command": "  "})).unwrap_err();
        assert!(matches!(err, HybridError::MalformedRequest(_)));
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(Request::from_json(&json!(["voice_command"])).is_err());
    }

    #[test]
    fn test_urgency_alias() {
        let value = json!({"type": "voice_command", "command": "help", "urgency": "urgent"});
        let request = Request::from_json(&value).unwrap();
        assert_eq!(request.urgency, Urgency::High);
    }
}
