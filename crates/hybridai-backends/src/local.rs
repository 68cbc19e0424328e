//! Fast local processor contract and a simulated implementation

use async_trait::async_trait;
use hybridai_core::{BackendError, LocalResult, Request, RequestKind};
use std::time::Duration;

/// Fast, best-effort processor. Expected to answer within tens to low
/// hundreds of milliseconds and to always be present, even if degraded.
#[async_trait]
pub trait LocalBackend: Send + Sync {
    /// Backend name (for logs)
    fn name(&self) -> &str;

    /// Process a request. May block briefly; never waits on the remote backend.
    async fn process(&self, request: &Request) -> Result<LocalResult, BackendError>;
}

/// Stand-in for the on-device recognition pipeline
#[derive(Debug, Clone)]
pub struct SimulatedLocalBackend {
    latency: Duration,
    known_face: Option<String>,
    failure: Option<String>,
}

impl SimulatedLocalBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            known_face: None,
            failure: None,
        }
    }

    /// Report this identity on every image
    pub fn with_known_face(mut self, name: impl Into<String>) -> Self {
        self.known_face = Some(name.into());
        self
    }

    /// Fail every call with this message
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn simulate(&self, request: &Request) -> LocalResult {
        let text = request.payload.text.trim();
        let result = match request.kind {
            RequestKind::ImageQuery | RequestKind::Recognition => {
                let mut result = LocalResult::new(&request.id, "Object detected: person")
                    .with_field("detection_results", "Object detected: person, confidence: 0.95");
                if let Some(face) = &self.known_face {
                    result = result.with_field("face_recognition", format!("Known person: {face}"));
                }
                result
            }
            RequestKind::Transcript => LocalResult::new(&request.id, format!("Transcribed: {text}"))
                .with_field("transcription", text)
                .with_field("voice_command", "No specific command detected"),
            RequestKind::VoiceCommand => {
                LocalResult::new(&request.id, format!("Command executed: {}", text.to_lowercase()))
            }
            _ => LocalResult::new(&request.id, format!("Processed locally: {}", request.kind)),
        };

        let emergency = text.to_lowercase().contains("emergency");
        result.with_emergency(emergency)
    }
}

impl Default for SimulatedLocalBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(150))
    }
}

#[async_trait]
impl LocalBackend for SimulatedLocalBackend {
    fn name(&self) -> &str {
        "simulated-local"
    }

    async fn process(&self, request: &Request) -> Result<LocalResult, BackendError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(message) = &self.failure {
            return Err(BackendError::unavailable(message.clone()));
        }
        Ok(self.simulate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridai_core::BackendErrorKind;

    #[tokio::test]
    async fn test_image_detection() {
        let backend = SimulatedLocalBackend::new(Duration::ZERO).with_known_face("Ada");
        let request = Request::new(RequestKind::ImageQuery, "").with_media("x.jpg");
        let result = backend.process(&request).await.unwrap();

        assert_eq!(result.request_id, request.id);
        assert_eq!(result.text, "Object detected: person");
        assert_eq!(result.fields["face_recognition"], "Known person: Ada");
        assert!(!result.emergency);
    }

    #[tokio::test]
    async fn test_emergency_flag() {
        let backend = SimulatedLocalBackend::new(Duration::ZERO);
        let request = Request::new(RequestKind::VoiceCommand, "Emergency call");
        let result = backend.process(&request).await.unwrap();
        assert!(result.emergency);
    }

    #[tokio::test]
    async fn test_failure() {
        let backend = SimulatedLocalBackend::new(Duration::ZERO).failing("camera offline");
        let request = Request::new(RequestKind::VoiceCommand, "take picture");
        let err = backend.process(&request).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Unavailable);
        assert_eq!(err.message, "camera offline");
    }
}
