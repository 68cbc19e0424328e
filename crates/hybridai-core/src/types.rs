//! Core value types shared by routing, dispatch and aggregation

use serde::{Deserialize, Serialize};
use std::fmt;

/// How urgently the wearer needs an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    High,
    Emergency,
}

impl Urgency {
    /// Lenient parse: `urgent` is an alias for `high`, unknown values are normal
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "urgent" => Urgency::High,
            "emergency" => Urgency::Emergency,
            _ => Urgency::Normal,
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, Urgency::High | Urgency::Emergency)
    }
}

/// Kind of inbound event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    VoiceCommand,
    ImageQuery,
    TextQuery,
    Transcript,
    /// Bare face recognition or object detection
    Recognition,
    NaturalLanguageQuery,
    /// Explicit request for generative analysis
    AnalysisRequest,
    Other(String),
}

impl RequestKind {
    /// Map a wire type tag onto a kind. Case and `-`/`_` are ignored.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "voice_command" | "llm_voice_command" => RequestKind::VoiceCommand,
            "image_query" | "pov_image_query" | "contextual_image_query" | "pov_image" => {
                RequestKind::ImageQuery
            }
            "text_query" => RequestKind::TextQuery,
            "transcript" | "audio_chunk_decrypted" | "final_transcript" => RequestKind::Transcript,
            "face_recognition_request" | "object_detection_request" | "recognition" => {
                RequestKind::Recognition
            }
            "natural_language_query" => RequestKind::NaturalLanguageQuery,
            "llm_analysis_request" | "analysis_request" => RequestKind::AnalysisRequest,
            _ => RequestKind::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestKind::VoiceCommand => "voice_command",
            RequestKind::ImageQuery => "image_query",
            RequestKind::TextQuery => "text_query",
            RequestKind::Transcript => "transcript",
            RequestKind::Recognition => "recognition",
            RequestKind::NaturalLanguageQuery => "natural_language_query",
            RequestKind::AnalysisRequest => "analysis_request",
            RequestKind::Other(tag) => tag,
        }
    }

    /// Kinds that only make sense for the generative backend
    pub fn is_llm_oriented(&self) -> bool {
        matches!(
            self,
            RequestKind::NaturalLanguageQuery | RequestKind::AnalysisRequest
        )
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combination and order of backend invocations for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStrategy {
    LocalOnly,
    RemoteOnly,
    Parallel,
    SequentialLocalFirst,
    SequentialRemoteFirst,
}

impl ProcessingStrategy {
    pub fn uses_local(&self) -> bool {
        !matches!(self, ProcessingStrategy::RemoteOnly)
    }

    pub fn uses_remote(&self) -> bool {
        !matches!(self, ProcessingStrategy::LocalOnly)
    }

    /// Accepts the snake_case names, plus `local`/`remote` shorthands
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "local_only" | "local" => Some(ProcessingStrategy::LocalOnly),
            "remote_only" | "remote" => Some(ProcessingStrategy::RemoteOnly),
            "parallel" => Some(ProcessingStrategy::Parallel),
            "sequential_local_first" => Some(ProcessingStrategy::SequentialLocalFirst),
            "sequential_remote_first" => Some(ProcessingStrategy::SequentialRemoteFirst),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStrategy::LocalOnly => "local_only",
            ProcessingStrategy::RemoteOnly => "remote_only",
            ProcessingStrategy::Parallel => "parallel",
            ProcessingStrategy::SequentialLocalFirst => "sequential_local_first",
            ProcessingStrategy::SequentialRemoteFirst => "sequential_remote_first",
        }
    }
}

impl fmt::Display for ProcessingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque correlation key for one outstanding remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(u64);

impl Token {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tok-{:08x}", self.0)
    }
}

/// Display priority of an aggregated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    Medium,
    High,
    Urgent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_parse() {
        assert_eq!(Urgency::parse("Emergency"), Urgency::Emergency);
        assert_eq!(Urgency::parse("urgent"), Urgency::High);
        assert_eq!(Urgency::parse("high"), Urgency::High);
        assert_eq!(Urgency::parse("whenever"), Urgency::Normal);
        assert!(!Urgency::Normal.is_elevated());
    }

    #[test]
    fn test_kind_from_tag_aliases() {
        assert_eq!(RequestKind::from_tag("pov_image_query"), RequestKind::ImageQuery);
        assert_eq!(RequestKind::from_tag("VOICE-COMMAND"), RequestKind::VoiceCommand);
        assert_eq!(
            RequestKind::from_tag("audio_chunk_decrypted"),
            RequestKind::Transcript
        );
        assert_eq!(
            RequestKind::from_tag("face_recognition_request"),
            RequestKind::Recognition
        );
        assert_eq!(
            RequestKind::from_tag("sms_request_send"),
            RequestKind::Other("sms_request_send".to_string())
        );
    }

    #[test]
    fn test_strategy_backend_usage() {
        assert!(!ProcessingStrategy::LocalOnly.uses_remote());
        assert!(!ProcessingStrategy::RemoteOnly.uses_local());
        assert!(ProcessingStrategy::Parallel.uses_local());
        assert!(ProcessingStrategy::Parallel.uses_remote());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            ProcessingStrategy::parse("Sequential-Local-First"),
            Some(ProcessingStrategy::SequentialLocalFirst)
        );
        assert_eq!(ProcessingStrategy::parse("local"), Some(ProcessingStrategy::LocalOnly));
        assert_eq!(ProcessingStrategy::parse("both"), None);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::Medium > Priority::Normal);
        assert_eq!(serde_json::to_string(&Priority::Urgent).unwrap(), "\"urgent\"");
    }
}
