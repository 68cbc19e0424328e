//! Merges backend results into one presentation-ready response.
//!
//! Every entry point returns a valid [`AggregatedResponse`]; construction
//! problems become error-tagged responses instead of propagating.

use hybridai_core::{
    AggregatedResponse, AggregatorConfig, BackendError, BackendErrorKind, BackendResult,
    BackendSource, DisplayLayers, ErrorDetails, HybridError, LocalResult, Priority, RemoteResult,
    AGGREGATION_ERROR_KIND,
};

const LOCAL_LABEL: &str = "Local:";
const REMOTE_LABEL: &str = "Model:";

#[derive(Debug, Clone, Default)]
pub struct ResponseAggregator {
    config: AggregatorConfig,
}

impl ResponseAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Merge whatever results are available. Both absent yields an empty
    /// response; mismatched request ids yield an aggregation fault response.
    pub fn combine(
        &self,
        local: Option<&LocalResult>,
        remote: Option<&RemoteResult>,
    ) -> AggregatedResponse {
        if let (Some(l), Some(r)) = (local, remote) {
            if l.request_id != r.request_id {
                let fault = HybridError::AggregationFault(format!(
                    "local result for {} paired with remote result for {}",
                    l.request_id, r.request_id
                ));
                tracing::error!(error = %fault, "refusing to merge results");
                return self.error_response(&fault, Some(l));
            }
        }

        let local_text = local.map(|l| l.text.trim()).filter(|t| !t.is_empty());
        let remote_text = remote.map(|r| r.text.trim()).filter(|t| !t.is_empty());

        let message_kind = match (local.is_some(), remote.is_some()) {
            (true, true) => "hybrid_enhanced_response",
            (true, false) => "local_response",
            (false, true) => "remote_response",
            (false, false) => return AggregatedResponse::empty(),
        };

        let mut response = AggregatedResponse::empty();
        response.message_kind = message_kind.to_string();
        response.local_text = local_text.map(str::to_string);
        response.remote_text = remote_text.map(str::to_string);
        response.combined_display_text = combine_text(local_text, remote_text);
        response.display_layers = self.layers(local, remote);
        response.priority = self.priority(local, remote);
        response.insights = remote.map(|r| r.insights.clone()).unwrap_or_default();
        response
    }

    /// Fold a set of observed outcomes for one request into a final response.
    ///
    /// A failed remote branch makes the response error-tagged even when the
    /// local branch succeeded; the local layer is kept. A failed local branch
    /// next to a successful remote one degrades to the remote result alone.
    pub fn from_results(&self, results: &[BackendResult]) -> AggregatedResponse {
        if let Some(first) = results.first() {
            if let Some(stray) = results.iter().find(|r| r.request_id() != first.request_id()) {
                let fault = HybridError::AggregationFault(format!(
                    "results for {} and {} in one aggregation",
                    first.request_id(),
                    stray.request_id()
                ));
                tracing::error!(error = %fault, "refusing to merge results");
                return self.error_response(&fault, None);
            }
        }

        let mut local = None;
        let mut remote = None;
        let mut failures = Vec::new();
        for result in results {
            match result {
                BackendResult::Local(l) => local = local.or(Some(l)),
                BackendResult::Remote(r) => remote = remote.or(Some(r)),
                BackendResult::Error { source, error, .. } => failures.push((*source, error)),
            }
        }

        let remote_failure = failures.iter().find(|(source, _)| *source == BackendSource::Remote);
        match (remote_failure, failures.first()) {
            (Some((source, error)), _) if remote.is_none() => self.failure_response(*source, error, local),
            (_, Some((source, error))) if local.is_none() && remote.is_none() => {
                self.failure_response(*source, error, None)
            }
            _ => self.combine(local, remote),
        }
    }

    /// Final, error-tagged response that still renders something
    pub fn error_response(&self, error: &HybridError, local: Option<&LocalResult>) -> AggregatedResponse {
        self.build_error(error.code(), error.to_string(), local)
    }

    fn failure_response(
        &self,
        source: BackendSource,
        error: &BackendError,
        local: Option<&LocalResult>,
    ) -> AggregatedResponse {
        match (source, error.kind) {
            // Already rendered from a RemoteTimeout
            (BackendSource::Remote, BackendErrorKind::Timeout) => {
                self.build_error("remote_timeout", error.message.clone(), local)
            }
            (_, BackendErrorKind::InvalidInput) => {
                self.error_response(&HybridError::MalformedRequest(error.message.clone()), local)
            }
            _ => {
                let unavailable = HybridError::BackendUnavailable {
                    backend: source_name(source).to_string(),
                    message: error.message.clone(),
                };
                self.error_response(&unavailable, local)
            }
        }
    }

    fn build_error(&self, code: &str, message: String, local: Option<&LocalResult>) -> AggregatedResponse {
        let local_text = local.map(|l| l.text.trim()).filter(|t| !t.is_empty());

        let mut response = AggregatedResponse::empty();
        response.message_kind = AGGREGATION_ERROR_KIND.to_string();
        response.local_text = local_text.map(str::to_string);
        response.combined_display_text = match local_text {
            Some(text) => format!("{text}\nEnhancement unavailable: {message}"),
            None => format!("Processing failed: {message}"),
        };
        response.display_layers = DisplayLayers {
            immediate: Some(local_text.map(str::to_string).unwrap_or_else(|| "Processing failed".to_string())),
            contextual: local.and_then(contextual_text).or_else(|| Some(message.clone())),
            smart: None,
            actionable: None,
        };
        response.priority = self.priority(local, None);
        response.error = Some(ErrorDetails {
            kind: code.to_string(),
            message,
        });
        response
    }

    /// First match wins: emergency, identity, then remote confidence
    pub fn priority(&self, local: Option<&LocalResult>, remote: Option<&RemoteResult>) -> Priority {
        if let Some(local) = local {
            let text = local.text.to_lowercase();
            if local.emergency || contains_any(&text, &self.config.emergency_markers) {
                return Priority::Urgent;
            }

            let has_identity = self
                .config
                .identity_fields
                .iter()
                .any(|f| local.fields.get(f).is_some_and(|v| !v.trim().is_empty()));
            if has_identity || contains_any(&text, &self.config.identity_markers) {
                return Priority::High;
            }
        }

        match remote.map(|r| r.confidence) {
            Some(c) if c > self.config.high_confidence => Priority::High,
            Some(c) if c > self.config.medium_confidence => Priority::Medium,
            _ => Priority::Normal,
        }
    }

    fn layers(&self, local: Option<&LocalResult>, remote: Option<&RemoteResult>) -> DisplayLayers {
        DisplayLayers {
            immediate: local
                .map(|l| l.text.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            contextual: local.and_then(contextual_text),
            smart: remote
                .map(|r| r.text.trim())
                .filter(|t| !t.is_empty())
                .map(|t| truncate_chars(t, self.config.smart_layer_chars)),
            actionable: remote
                .filter(|r| !r.suggested_actions.is_empty())
                .map(|r| r.suggested_actions.clone()),
        }
    }
}

fn combine_text(local: Option<&str>, remote: Option<&str>) -> String {
    match (local, remote) {
        (Some(l), Some(r)) => format!("{LOCAL_LABEL} {l}\n{REMOTE_LABEL} {r}"),
        (Some(text), None) | (None, Some(text)) => text.to_string(),
        (None, None) => String::new(),
    }
}

fn contextual_text(local: &LocalResult) -> Option<String> {
    let lines: Vec<String> = local
        .fields
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| format!("{k}: {}", v.trim()))
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn contains_any(haystack_lower: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|m| !m.is_empty() && haystack_lower.contains(&m.to_lowercase()))
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn source_name(source: BackendSource) -> &'static str {
    match source {
        BackendSource::Local => "local",
        BackendSource::Remote => "remote",
    }
}
