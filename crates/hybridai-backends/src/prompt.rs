//! Remote prompt construction

use hybridai_core::{LocalResult, Request, RequestKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_IMAGE_PROMPT: &str = "Describe this image.";
const DEFAULT_PROMPT: &str = "Analyze the provided information.";
const DISPLAY_INSTRUCTION: &str =
    "Provide a clear, actionable response suitable for smart glasses display. Keep it concise but comprehensive.";

/// Context snapshot keys rendered into the prompt, with their labels
const CONTEXT_LABELS: [(&str, &str); 5] = [
    ("timestamp", "Time"),
    ("location", "Location"),
    ("timeOfDay", "Time of day"),
    ("recentActivity", "Recent activity"),
    ("environmentType", "Environment"),
];

/// Kind of analysis the remote backend is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Image,
    Audio,
    Generic,
}

impl AnalysisType {
    pub fn for_request(request: &Request) -> Self {
        match request.kind {
            RequestKind::ImageQuery | RequestKind::Recognition => AnalysisType::Image,
            _ if request.payload.has_media() => AnalysisType::Image,
            RequestKind::Transcript => AnalysisType::Audio,
            _ => AnalysisType::Generic,
        }
    }
}

/// Build the prompt for a request, optionally grounded in local output
pub fn build_prompt(request: &Request, local: Option<&LocalResult>) -> String {
    let query = request.payload.text.trim();
    let mut prompt = match AnalysisType::for_request(request) {
        AnalysisType::Image => {
            let query = if query.is_empty() { DEFAULT_IMAGE_PROMPT } else { query };
            format!("Analyze this image captured by the wearer's camera.\nUser query: {query}\n")
        }
        AnalysisType::Audio => {
            let mut p = format!("Analyze this conversation transcript.\nTranscript: {query}\n");
            if let Some(aux) = request.payload.auxiliary_context.as_deref().filter(|a| !a.trim().is_empty()) {
                p.push_str(&format!("Audio context: {}\n", aux.trim()));
            }
            p.push_str("Identify intent, sentiment and any action items.\n");
            p
        }
        AnalysisType::Generic => {
            let query = if query.is_empty() { DEFAULT_PROMPT } else { query };
            format!("Answer this {} request.\nQuery: {query}\n", request.kind)
        }
    };

    prompt.push_str(&format!("Context: {}\n", context_line(&request.context)));

    if let Some(local) = local.filter(|l| !l.text.trim().is_empty()) {
        prompt.push_str(&format!("Local observations: {}\n", local.text.trim()));
        for (key, value) in &local.fields {
            prompt.push_str(&format!("- {key}: {value}\n"));
        }
    }

    prompt.push_str(DISPLAY_INSTRUCTION);
    prompt
}

/// Render the known context keys, "No additional context" when none are set
pub fn context_line(context: &BTreeMap<String, String>) -> String {
    let parts: Vec<String> = CONTEXT_LABELS
        .iter()
        .filter_map(|(key, label)| {
            context
                .get(*key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{label}: {v}"))
        })
        .collect();

    if parts.is_empty() {
        "No additional context".to_string()
    } else {
        parts.join(", ")
    }
}
