use super::config::load_config;
use crate::cli::RunArgs;
use anyhow::Context;
use hybridai_backends::{SimulatedLocalBackend, SimulatedRemoteBackend};
use hybridai_core::{
    AggregatedResponse, HybridConfig, Request, RouteReason, RoutingDecision, StrategyRouter,
};
use hybridai_coordinator::HybridCoordinator;
use hybridai_telemetry::{append_jsonl, DispatchOutcome, DispatchRecord, Paths};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Bookkeeping for one submitted request until its final emission
struct Tracker {
    correlation_id: Option<String>,
    kind: String,
    decision: Option<RoutingDecision>,
    started: Instant,
    emissions: usize,
}

impl Tracker {
    fn finish(self, request_id: String, last: &AggregatedResponse) -> DispatchRecord {
        let outcome = match (&self.decision, last.is_error()) {
            (None, _) => DispatchOutcome::Malformed,
            (Some(_), true) => DispatchOutcome::Failed,
            (Some(_), false) => DispatchOutcome::Completed,
        };

        DispatchRecord {
            request_id,
            correlation_id: self.correlation_id,
            kind: self.kind,
            strategy: last.strategy,
            route_reason: self.decision.map(|d| d.reason),
            complexity: self.decision.map(|d| d.complexity).unwrap_or(0),
            emissions: self.emissions,
            outcome,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            timestamp: chrono::Utc::now(),
        }
    }
}

pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = load_config(&paths);

    let mut requests = Vec::new();
    for (number, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        // Unparseable lines still get an error emission
        let value = serde_json::from_str(&line).unwrap_or_else(|err| {
            tracing::warn!(line = number + 1, error = %err, "input line is not JSON");
            Value::Null
        });
        requests.push(value);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let records = runtime.block_on(drive(config, args, &requests, &mut out))?;
    out.flush()?;

    if args.record {
        let dispatch_file = paths.dispatch_file();
        for record in &records {
            append_jsonl(&dispatch_file, record)?;
        }
        tracing::info!(records = records.len(), path = %dispatch_file.display(), "recorded dispatch telemetry");
    }
    Ok(())
}

/// Submit every request, then print emissions as JSON lines until each one
/// has reached its final emission
async fn drive<W: Write>(
    mut config: HybridConfig,
    args: &RunArgs,
    requests: &[Value],
    out: &mut W,
) -> anyhow::Result<Vec<DispatchRecord>> {
    if let Some(ms) = args.remote_timeout_ms {
        config.coordinator.remote_timeout_ms = ms;
    }
    // Everything is submitted before the first read; leave room for two emissions each.
    config.coordinator.stream_capacity = config
        .coordinator
        .stream_capacity
        .max(requests.len() * 2 + 16);

    let mut local = SimulatedLocalBackend::new(Duration::from_millis(args.local_latency_ms));
    if let Some(face) = &args.known_face {
        local = local.with_known_face(face.clone());
    }
    let remote = Arc::new(SimulatedRemoteBackend::new(Duration::from_millis(args.remote_latency_ms)));
    remote.set_available(!args.remote_offline);

    let router = StrategyRouter::new(config.router.clone());
    let coordinator = HybridCoordinator::new(config, Arc::new(local), remote);
    let mut responses = coordinator.subscribe();

    let mut open: HashMap<String, Tracker> = HashMap::new();
    for value in requests {
        let started = Instant::now();
        let (id, tracker) = match Request::from_json(value) {
            Ok(request) => {
                let mut decision = router.route(&request);
                if let Some(strategy) = args.strategy {
                    decision.strategy = strategy;
                    decision.reason = RouteReason::Forced;
                }
                let tracker = Tracker {
                    correlation_id: request.correlation_id.clone(),
                    kind: request.kind.as_str().to_string(),
                    decision: Some(decision),
                    started,
                    emissions: 0,
                };
                let id = match args.strategy {
                    Some(strategy) => coordinator.submit_with(request, strategy),
                    None => coordinator.submit(request),
                };
                (id, tracker)
            }
            Err(_) => {
                let tracker = Tracker {
                    correlation_id: None,
                    kind: "malformed".to_string(),
                    decision: None,
                    started,
                    emissions: 0,
                };
                (coordinator.submit_json(value), tracker)
            }
        };
        open.insert(id, tracker);
    }

    let mut records = Vec::with_capacity(open.len());
    while !open.is_empty() {
        let Some(response) = responses.recv().await else {
            anyhow::bail!("response stream closed with {} requests outstanding", open.len());
        };
        serde_json::to_writer(&mut *out, response.as_ref())?;
        writeln!(out)?;

        let Some(tracker) = open.get_mut(&response.request_id) else {
            continue;
        };
        tracker.emissions += 1;
        if response.is_final {
            if let Some((request_id, tracker)) = open.remove_entry(&response.request_id) {
                let mut record = tracker.finish(request_id, &response);
                if record.correlation_id.is_none() {
                    record.correlation_id = response.correlation_id.clone();
                }
                records.push(record);
            }
        }
    }

    Ok(records)
}
