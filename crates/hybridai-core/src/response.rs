//! Backend results and the aggregated response sent to the presentation layer

use crate::error::BackendError;
use crate::request::Request;
use crate::types::{Priority, ProcessingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of the fast local processor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalResult {
    pub request_id: String,
    pub text: String,
    /// Structured detail such as `detection_results` or `face_recognition`
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Set when the local processor detected an emergency condition
    #[serde(default)]
    pub emergency: bool,
}

impl LocalResult {
    pub fn new(request_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_emergency(mut self, emergency: bool) -> Self {
        self.emergency = emergency;
        self
    }
}

/// Output of the generative backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteResult {
    pub request_id: String,
    pub text: String,
    pub confidence: f32,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    #[serde(default)]
    pub insights: Vec<String>,
}

impl RemoteResult {
    pub fn new(request_id: impl Into<String>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            request_id: request_id.into(),
            text: text.into(),
            confidence,
            ..Self::default()
        }
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.suggested_actions = actions;
        self
    }

    pub fn with_insights(mut self, insights: Vec<String>) -> Self {
        self.insights = insights;
        self
    }
}

/// Which collaborator produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendSource {
    Local,
    Remote,
}

/// One observed backend outcome, always tagged with the originating request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum BackendResult {
    Local(LocalResult),
    Remote(RemoteResult),
    Error {
        request_id: String,
        source: BackendSource,
        error: BackendError,
    },
}

impl BackendResult {
    pub fn request_id(&self) -> &str {
        match self {
            BackendResult::Local(r) => &r.request_id,
            BackendResult::Remote(r) => &r.request_id,
            BackendResult::Error { request_id, .. } => request_id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BackendResult::Error { .. })
    }
}

/// Named slices of a response, one per presentation tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayLayers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actionable: Option<Vec<String>>,
}

impl DisplayLayers {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_none()
            && self.contextual.is_none()
            && self.smart.is_none()
            && self.actionable.is_none()
    }
}

pub const AGGREGATION_ERROR_KIND: &str = "aggregation_error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "error_kind")]
    pub kind: String,
    #[serde(rename = "error_message")]
    pub message: String,
}

/// One emission on the response stream. Built fresh for every emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "correlationId", default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub message_kind: String,
    #[serde(rename = "wis_text", default, skip_serializing_if = "Option::is_none")]
    pub local_text: Option<String>,
    #[serde(rename = "llm_text", default, skip_serializing_if = "Option::is_none")]
    pub remote_text: Option<String>,
    #[serde(rename = "display_text")]
    pub combined_display_text: String,
    pub display_layers: DisplayLayers,
    pub priority: Priority,
    #[serde(rename = "isFinal")]
    pub is_final: bool,
    #[serde(default)]
    pub enhancement_pending: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ProcessingStrategy>,
    #[serde(flatten)]
    pub error: Option<ErrorDetails>,
}

impl AggregatedResponse {
    /// A valid response with nothing to show
    pub fn empty() -> Self {
        Self {
            request_id: String::new(),
            correlation_id: None,
            message_kind: "empty_response".to_string(),
            local_text: None,
            remote_text: None,
            combined_display_text: String::new(),
            display_layers: DisplayLayers::default(),
            priority: Priority::Normal,
            is_final: true,
            enhancement_pending: false,
            insights: Vec::new(),
            strategy: None,
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Stamp the request identity onto a freshly built response
    pub fn for_request(mut self, request: &Request) -> Self {
        self.request_id = request.id.clone();
        self.correlation_id = request.correlation_id.clone();
        self
    }

    pub fn with_strategy(mut self, strategy: ProcessingStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Mark as the immediate emission that an enhanced one will follow
    pub fn provisional(mut self) -> Self {
        self.is_final = false;
        self.enhancement_pending = true;
        self.message_kind = "hybrid_immediate_response".to_string();
        self
    }
}
