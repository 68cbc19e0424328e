use chrono::Utc;
use hybridai_core::{ProcessingStrategy, RouteReason};
use hybridai_telemetry::{append_jsonl, read_jsonl, DispatchOutcome, DispatchRecord, DispatchStats, Paths};
use tempfile::TempDir;

fn record(id: &str, strategy: ProcessingStrategy, outcome: DispatchOutcome) -> DispatchRecord {
    DispatchRecord {
        request_id: id.to_string(),
        correlation_id: Some(format!("corr-{id}")),
        kind: "image_query".to_string(),
        strategy: Some(strategy),
        route_reason: Some(RouteReason::DeepAnalysis),
        complexity: 3,
        emissions: 2,
        outcome,
        elapsed_ms: 40,
        timestamp: Utc::now(),
    }
}

#[test]
fn test_dispatch_log_accumulates_across_runs() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::at(temp.path());
    let log = paths.dispatch_file();

    append_jsonl(&log, &record("a", ProcessingStrategy::Parallel, DispatchOutcome::Completed)).unwrap();
    append_jsonl(&log, &record("b", ProcessingStrategy::Parallel, DispatchOutcome::Failed)).unwrap();
    append_jsonl(&log, &record("c", ProcessingStrategy::LocalOnly, DispatchOutcome::Completed)).unwrap();

    let records: Vec<DispatchRecord> = read_jsonl(&log).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].correlation_id.as_deref(), Some("corr-b"));
    assert_eq!(records[1].route_reason, Some(RouteReason::DeepAnalysis));

    let stats = DispatchStats::from_records(&records);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_strategy["parallel"].requests, 2);
    assert_eq!(stats.by_strategy["parallel"].failed, 1);
    assert!((stats.error_rate() - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_dispatch_log_holds_no_text() {
    let temp = TempDir::new().unwrap();
    let log = Paths::at(temp.path()).dispatch_file();
    append_jsonl(&log, &record("a", ProcessingStrategy::RemoteOnly, DispatchOutcome::Completed)).unwrap();

    let raw = std::fs::read_to_string(&log).unwrap();
    let value: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    for forbidden in ["text", "display_text", "query", "prompt"] {
        assert!(!keys.contains(&forbidden));
    }
}
