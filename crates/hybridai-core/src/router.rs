//! Strategy router: decides which backends serve a request

use crate::config::RouterConfig;
use crate::request::Request;
use crate::types::{ProcessingStrategy, RequestKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which routing rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    Urgent,
    Simple,
    DeepAnalysis,
    LlmSpecific,
    Default,
    FailSafe,
    /// Strategy chosen by the caller instead of the rules
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub strategy: ProcessingStrategy,
    /// Diagnostic score in `1..=max_complexity`; never drives the decision
    pub complexity: u8,
    pub reason: RouteReason,
}

/// Case-insensitive alternation over a keyword list
#[derive(Debug)]
struct KeywordSet {
    pattern: Option<Regex>,
}

impl KeywordSet {
    fn compile(words: &[String]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    fn matches(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }
}

#[derive(Debug)]
struct Matchers {
    analysis: KeywordSet,
    reasoning: KeywordSet,
    complexity: KeywordSet,
}

impl Matchers {
    fn compile(config: &RouterConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            analysis: KeywordSet::compile(&config.analysis_keywords)?,
            reasoning: KeywordSet::compile(&config.reasoning_keywords)?,
            complexity: KeywordSet::compile(&config.complexity_keywords)?,
        })
    }
}

#[derive(Debug)]
pub struct StrategyRouter {
    config: RouterConfig,
    simple_commands: Vec<String>,
    matchers: Result<Matchers, String>,
}

impl StrategyRouter {
    pub fn new(config: RouterConfig) -> Self {
        let matchers = Matchers::compile(&config).map_err(|e| {
            tracing::warn!(error = %e, "keyword patterns failed to compile, routing fails safe");
            e.to_string()
        });
        let simple_commands = config
            .simple_commands
            .iter()
            .map(|c| normalize_command(c))
            .collect();

        Self {
            config,
            simple_commands,
            matchers,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Pure decision, never fails. Falls back to LocalOnly when inconsistent.
    pub fn determine_strategy(&self, request: &Request) -> ProcessingStrategy {
        self.route(request).strategy
    }

    /// Decide a strategy, first matching rule wins
    pub fn route(&self, request: &Request) -> RoutingDecision {
        let complexity = self.complexity(request);
        let (strategy, reason) = self.decide(request);

        tracing::debug!(
            request_id = %request.id,
            kind = %request.kind,
            urgency = ?request.urgency,
            complexity,
            strategy = %strategy,
            reason = ?reason,
            "routed request"
        );

        RoutingDecision {
            strategy,
            complexity,
            reason,
        }
    }

    fn decide(&self, request: &Request) -> (ProcessingStrategy, RouteReason) {
        let matchers = match &self.matchers {
            Ok(m) => m,
            Err(_) => return (ProcessingStrategy::LocalOnly, RouteReason::FailSafe),
        };

        // Rule 1: elevated urgency takes the fast path only
        if request.urgency.is_elevated() {
            return (ProcessingStrategy::LocalOnly, RouteReason::Urgent);
        }

        // Rule 2: closed list of simple requests
        if self.is_simple(request) {
            return (ProcessingStrategy::LocalOnly, RouteReason::Simple);
        }

        // Rule 3: deep analysis benefits from both layers
        if self.requires_deep_analysis(request, matchers) {
            return (ProcessingStrategy::Parallel, RouteReason::DeepAnalysis);
        }

        // Rule 4: generative-only requests
        if request.kind.is_llm_oriented() || matchers.reasoning.matches(&request.payload.text) {
            return (ProcessingStrategy::RemoteOnly, RouteReason::LlmSpecific);
        }

        (ProcessingStrategy::Parallel, RouteReason::Default)
    }

    fn is_simple(&self, request: &Request) -> bool {
        match request.kind {
            RequestKind::Recognition => !request.payload.has_text(),
            RequestKind::VoiceCommand => {
                let command = normalize_command(&request.payload.text);
                self.simple_commands.iter().any(|c| *c == command)
            }
            _ => false,
        }
    }

    fn requires_deep_analysis(&self, request: &Request, matchers: &Matchers) -> bool {
        let payload = &request.payload;
        if request.kind == RequestKind::ImageQuery && payload.has_text() {
            return true;
        }
        if request.kind == RequestKind::Transcript
            && payload.text.trim().chars().count() > self.config.transcript_min_chars
        {
            return true;
        }
        matchers.analysis.matches(&payload.text)
    }

    /// Diagnostic complexity score, capped at `max_complexity`
    pub fn complexity(&self, request: &Request) -> u8 {
        let payload = &request.payload;
        let mut score: u8 = 1;

        if payload.has_media() {
            score += 2;
        }
        if request.kind == RequestKind::Transcript
            && payload.has_text()
            && payload.auxiliary_context.as_deref().is_some_and(|c| !c.trim().is_empty())
        {
            score += 1;
        }
        if let Ok(m) = &self.matchers {
            if m.complexity.matches(&payload.text) {
                score += 2;
            }
        }
        if !request.context.is_empty() {
            score += 1;
        }

        score.min(self.config.max_complexity.max(1))
    }
}

impl Default for StrategyRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

/// Lowercase, drop trailing punctuation and collapse whitespace
fn normalize_command(command: &str) -> String {
    command
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
