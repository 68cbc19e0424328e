//! Dispatch telemetry records

use chrono::{DateTime, Utc};
use hybridai_core::{ProcessingStrategy, RouteReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Final emission carried backend content
    Completed,
    /// Final emission was error-tagged
    Failed,
    /// Rejected before dispatch
    Malformed,
}

/// One line per request reaching its final emission. Carries no request or
/// response text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub request_id: String,
    #[serde(default)]
    pub correlation_id: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub strategy: Option<ProcessingStrategy>,
    #[serde(default)]
    pub route_reason: Option<RouteReason>,
    #[serde(default)]
    pub complexity: u8,
    pub emissions: usize,
    pub outcome: DispatchOutcome,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Per-strategy counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyStats {
    pub requests: usize,
    pub failed: usize,
    pub avg_elapsed_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchStats {
    pub total: usize,
    pub malformed: usize,
    pub by_strategy: BTreeMap<String, StrategyStats>,
}

impl DispatchStats {
    pub fn from_records(records: &[DispatchRecord]) -> Self {
        let mut stats = DispatchStats {
            total: records.len(),
            ..Default::default()
        };
        let mut elapsed: BTreeMap<String, u64> = BTreeMap::new();

        for record in records {
            if record.outcome == DispatchOutcome::Malformed {
                stats.malformed += 1;
                continue;
            }
            let key = record
                .strategy
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "unrouted".to_string());
            let entry = stats.by_strategy.entry(key.clone()).or_default();
            entry.requests += 1;
            if record.outcome == DispatchOutcome::Failed {
                entry.failed += 1;
            }
            *elapsed.entry(key).or_default() += record.elapsed_ms;
        }

        for (key, entry) in stats.by_strategy.iter_mut() {
            let total_ms = elapsed.get(key).copied().unwrap_or(0);
            entry.avg_elapsed_ms = total_ms as f64 / entry.requests.max(1) as f64;
        }

        stats
    }

    /// Failed share of routed requests, 0.0 when nothing was routed
    pub fn error_rate(&self) -> f64 {
        let routed: usize = self.by_strategy.values().map(|s| s.requests).sum();
        if routed == 0 {
            return 0.0;
        }
        let failed: usize = self.by_strategy.values().map(|s| s.failed).sum();
        failed as f64 / routed as f64
    }
}
