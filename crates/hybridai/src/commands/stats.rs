use hybridai_telemetry::{read_jsonl, DispatchRecord, DispatchStats, Paths};

fn render(stats: &DispatchStats) -> String {
    let mut lines = vec![
        format!("Total requests: {}", stats.total),
        format!("Malformed: {}", stats.malformed),
        format!("Error rate: {:.1}%", stats.error_rate() * 100.0),
    ];

    if !stats.by_strategy.is_empty() {
        lines.push(String::new());
        lines.push(format!("{:<26} {:>8} {:>8} {:>10}", "strategy", "requests", "failed", "avg ms"));
        for (strategy, s) in &stats.by_strategy {
            lines.push(format!(
                "{:<26} {:>8} {:>8} {:>10.1}",
                strategy, s.requests, s.failed, s.avg_elapsed_ms
            ));
        }
    }

    lines.join("\n")
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let records: Vec<DispatchRecord> = read_jsonl(&paths.dispatch_file())?;

    if records.is_empty() {
        println!("No dispatch history");
        return Ok(());
    }

    let stats = DispatchStats::from_records(&records);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", render(&stats));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hybridai_core::ProcessingStrategy;
    use hybridai_telemetry::DispatchOutcome;

    fn record(strategy: ProcessingStrategy, outcome: DispatchOutcome, elapsed_ms: u64) -> DispatchRecord {
        DispatchRecord {
            request_id: "r".to_string(),
            correlation_id: None,
            kind: "image_query".to_string(),
            strategy: Some(strategy),
            route_reason: None,
            complexity: 3,
            emissions: 2,
            outcome,
            elapsed_ms,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_render_table() {
        let records = vec![
            record(ProcessingStrategy::Parallel, DispatchOutcome::Completed, 100),
            record(ProcessingStrategy::Parallel, DispatchOutcome::Failed, 300),
            record(ProcessingStrategy::LocalOnly, DispatchOutcome::Completed, 10),
        ];
        let text = render(&DispatchStats::from_records(&records));

        assert!(text.contains("Total requests: 3"));
        assert!(text.contains("Error rate: 33.3%"));
        assert!(text.lines().any(|l| l.starts_with("parallel") && l.ends_with("200.0")));
        assert!(text.lines().any(|l| l.starts_with("local_only")));
    }

    #[test]
    fn test_render_empty_stats() {
        let text = render(&DispatchStats::default());
        assert!(text.contains("Total requests: 0"));
        assert!(!text.contains("strategy"));
    }
}
