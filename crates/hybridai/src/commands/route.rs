use super::config::load_config;
use anyhow::Context;
use hybridai_core::{Request, StrategyRouter};
use hybridai_telemetry::Paths;
use serde_json::{json, Value};
use std::io::{self, Read};

pub fn run() -> anyhow::Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let value: Value = serde_json::from_str(&input).context("request is not valid JSON")?;

    let paths = Paths::new()?;
    let router = StrategyRouter::new(load_config(&paths).router);

    let output = route_value(&router, &value)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn route_value(router: &StrategyRouter, value: &Value) -> anyhow::Result<Value> {
    let request = Request::from_json(value)?;
    let decision = router.route(&request);

    Ok(json!({
        "request_id": request.id,
        "correlationId": request.correlation_id,
        "kind": request.kind.as_str(),
        "urgency": request.urgency,
        "strategy": decision.strategy,
        "reason": decision.reason,
        "complexity": decision.complexity,
    }))
}
