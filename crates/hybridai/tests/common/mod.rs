#![allow(dead_code)]

use hybridai_core::{HybridConfig, Request, RequestKind, Urgency};

pub fn sample_config() -> HybridConfig {
    let mut config = HybridConfig::default();
    config.coordinator.remote_timeout_ms = 2_000;
    config.coordinator.local_timeout_ms = 500;
    config
}

/// One request of every kind the wearable sends, with text
pub fn sample_requests() -> Vec<Request> {
    vec![
        Request::new(RequestKind::VoiceCommand, "start recording"),
        Request::new(RequestKind::VoiceCommand, "call mom"),
        Request::new(RequestKind::ImageQuery, "what am I looking at").with_media("f1.jpg"),
        Request::new(RequestKind::TextQuery, "summarize my notes"),
        Request::new(RequestKind::Transcript, "ok see you at noon"),
        Request::new(RequestKind::Transcript, "we agreed to move the launch to next thursday"),
        Request::new(RequestKind::Recognition, "").with_media("f2.jpg"),
        Request::new(RequestKind::NaturalLanguageQuery, "what should i cook tonight"),
        Request::new(RequestKind::AnalysisRequest, "compare these two offers"),
    ]
}

pub fn with_urgency(requests: Vec<Request>, urgency: Urgency) -> Vec<Request> {
    requests.into_iter().map(|r| r.with_urgency(urgency)).collect()
}
