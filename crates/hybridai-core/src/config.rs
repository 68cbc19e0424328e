//! Configuration for routing, aggregation and dispatch

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Strategy router policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Voice commands the local processor handles on its own
    pub simple_commands: Vec<String>,

    /// Keywords that ask for deep analysis (-> Parallel)
    pub analysis_keywords: Vec<String>,

    /// Phrases that ask for open-ended reasoning (-> RemoteOnly)
    pub reasoning_keywords: Vec<String>,

    /// Keywords that raise the diagnostic complexity score
    pub complexity_keywords: Vec<String>,

    /// Transcripts longer than this (in chars) benefit from enhancement
    pub transcript_min_chars: usize,

    /// Complexity score ceiling
    pub max_complexity: u8,
}

impl RouterConfig {
    pub fn new() -> Self {
        Self {
            simple_commands: strings(&["take picture", "start recording", "stop recording", "navigate"]),
            analysis_keywords: strings(&["analyze", "explain", "summarize", "describe", "understand"]),
            reasoning_keywords: strings(&[
                "tell me about",
                "help me understand",
                "what should i",
                "recommend",
            ]),
            complexity_keywords: strings(&["analyze", "explain", "what is", "describe"]),
            transcript_min_chars: 20,
            max_complexity: 5,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Priority and display-layer policy for the response aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Remote confidence above this -> high priority
    pub high_confidence: f32,

    /// Remote confidence above this -> medium priority
    pub medium_confidence: f32,

    /// Character budget of the smart layer
    pub smart_layer_chars: usize,

    /// Local text markers that flag an emergency
    pub emergency_markers: Vec<String>,

    /// Local fields that carry an identity or recognition result
    pub identity_fields: Vec<String>,

    /// Local text markers that indicate a recognized identity
    pub identity_markers: Vec<String>,
}

impl AggregatorConfig {
    pub fn new() -> Self {
        Self {
            high_confidence: 0.9,
            medium_confidence: 0.7,
            smart_layer_chars: 100,
            emergency_markers: strings(&["emergency"]),
            identity_fields: strings(&["face_recognition", "identity", "recognized_person"]),
            identity_markers: strings(&["known person:", "recognized:"]),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch timing and degraded-mode policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Remote calls still pending after this are expired
    pub remote_timeout_ms: u64,

    /// Local calls taking longer than this count as failed
    pub local_timeout_ms: u64,

    /// Buffered emissions per subscriber before it lags
    pub stream_capacity: usize,

    /// Consecutive remote failures before the remote backend is bypassed
    pub remote_failure_threshold: u32,

    /// How long the remote backend is bypassed once degraded
    pub remote_cooldown_ms: u64,
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self {
            remote_timeout_ms: 30_000,
            local_timeout_ms: 2_000,
            stream_capacity: 256,
            remote_failure_threshold: 3,
            remote_cooldown_ms: 30_000,
        }
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn local_timeout(&self) -> Duration {
        Duration::from_millis(self.local_timeout_ms)
    }

    pub fn remote_cooldown(&self) -> Duration {
        Duration::from_millis(self.remote_cooldown_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level configuration file (`hybridai.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub router: RouterConfig,
    pub aggregator: AggregatorConfig,
    pub coordinator: CoordinatorConfig,
}
