//! Generative backend contract and a simulated implementation

use crate::prompt::AnalysisType;
use crate::sink::ResultSink;
use async_trait::async_trait;
use hybridai_core::{BackendError, MediaRef, RemoteResult, Request, Token};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One outbound remote call
#[derive(Debug, Clone)]
pub struct RemoteCall {
    pub token: Token,
    pub request: Arc<Request>,
    pub prompt: String,
    pub media: Option<MediaRef>,
    pub analysis: AnalysisType,
}

/// Slow generative backend, possibly out of process.
///
/// `submit` only issues the call. The outcome arrives later through
/// [`ResultSink::deliver`] keyed by `call.token`, possibly from another thread.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Backend name (for logs)
    fn name(&self) -> &str;

    /// Cheap availability probe
    fn is_available(&self) -> bool {
        true
    }

    /// Issue a call; an `Err` here means nothing will be delivered for the token
    async fn submit(&self, call: RemoteCall, sink: ResultSink) -> Result<(), BackendError>;
}

/// What the simulated backend does with each call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteBehavior {
    Respond,
    /// Deliver an error after the latency
    Fail(String),
    /// Never deliver anything
    Silent,
}

/// Stand-in for the on-phone generative model
#[derive(Debug)]
pub struct SimulatedRemoteBackend {
    latency: Duration,
    behavior: RemoteBehavior,
    available: AtomicBool,
    submitted: AtomicUsize,
}

impl SimulatedRemoteBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            behavior: RemoteBehavior::Respond,
            available: AtomicBool::new(true),
            submitted: AtomicUsize::new(0),
        }
    }

    pub fn with_behavior(mut self, behavior: RemoteBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Calls accepted so far
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Acquire)
    }

    /// Canned analysis per analysis type
    pub fn mock_result(request_id: &str, analysis: AnalysisType) -> RemoteResult {
        let (text, confidence, actions, insights): (&str, f32, &[&str], &[&str]) = match analysis {
            AnalysisType::Image => (
                "I can see a scene with various objects and possibly people. The lighting and composition suggest an indoor or outdoor environment.",
                0.85,
                &["Take notes", "Identify objects", "Analyze context"],
                &["This appears to be a common scene type", "Similar images analyzed recently"],
            ),
            AnalysisType::Audio => (
                "The transcribed audio contains conversational content that suggests a discussion or meeting context.",
                0.75,
                &["Follow up on topics discussed", "Schedule next meeting"],
                &[],
            ),
            AnalysisType::Generic => (
                "This appears to be a general information request that can be addressed with available knowledge.",
                0.80,
                &["Provide detailed response", "Offer additional resources"],
                &[],
            ),
        };

        RemoteResult::new(request_id, text, confidence)
            .with_actions(actions.iter().map(|s| s.to_string()).collect())
            .with_insights(insights.iter().map(|s| s.to_string()).collect())
    }
}

impl Default for SimulatedRemoteBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl RemoteBackend for SimulatedRemoteBackend {
    fn name(&self) -> &str {
        "simulated-remote"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    async fn submit(&self, call: RemoteCall, sink: ResultSink) -> Result<(), BackendError> {
        if !self.is_available() {
            return Err(BackendError::unavailable("generative model not loaded"));
        }
        self.submitted.fetch_add(1, Ordering::AcqRel);

        tracing::debug!(
            token = %call.token,
            analysis = ?call.analysis,
            prompt_chars = call.prompt.chars().count(),
            "simulated remote call issued"
        );

        let behavior = self.behavior.clone();
        let latency = self.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            match behavior {
                RemoteBehavior::Respond => {
                    let result = Self::mock_result(&call.request.id, call.analysis);
                    sink.deliver_result(call.token, result);
                }
                RemoteBehavior::Fail(message) => {
                    sink.deliver_error(call.token, BackendError::failed(message));
                }
                RemoteBehavior::Silent => {}
            }
        });

        Ok(())
    }
}
