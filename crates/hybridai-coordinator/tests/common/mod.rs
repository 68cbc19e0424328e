#![allow(dead_code)]

use async_trait::async_trait;
use hybridai_backends::{RemoteBackend, RemoteCall, ResultSink};
use hybridai_core::{AggregatedResponse, BackendError, HybridConfig, RemoteResult, Token};
use hybridai_coordinator::ResponseSubscriber;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Remote backend that records calls and lets the test deliver outcomes
#[derive(Default)]
pub struct ManualRemote {
    calls: Mutex<Vec<(RemoteCall, ResultSink)>>,
}

impl ManualRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call(&self, index: usize) -> RemoteCall {
        self.calls.lock().unwrap()[index].0.clone()
    }

    pub fn deliver(&self, index: usize, outcome: Result<RemoteResult, BackendError>) -> bool {
        let calls = self.calls.lock().unwrap();
        let (call, sink) = &calls[index];
        sink.deliver(call.token, outcome)
    }

    /// Deliver through call `index`'s sink under some other token
    pub fn deliver_as(&self, index: usize, token: Token, outcome: Result<RemoteResult, BackendError>) -> bool {
        let calls = self.calls.lock().unwrap();
        calls[index].1.deliver(token, outcome)
    }

    /// Answer call `index` with a result for its own request
    pub fn respond(&self, index: usize, text: &str, confidence: f32) -> bool {
        let request_id = self.call(index).request.id.clone();
        self.deliver(index, Ok(RemoteResult::new(request_id, text, confidence)))
    }

    /// Yield until `count` calls have been issued
    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait]
impl RemoteBackend for ManualRemote {
    fn name(&self) -> &str {
        "manual-remote"
    }

    async fn submit(&self, call: RemoteCall, sink: ResultSink) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push((call, sink));
        Ok(())
    }
}

/// Remote backend whose `submit` never returns
pub struct StalledRemote;

#[async_trait]
impl RemoteBackend for StalledRemote {
    fn name(&self) -> &str {
        "stalled-remote"
    }

    async fn submit(&self, _call: RemoteCall, _sink: ResultSink) -> Result<(), BackendError> {
        std::future::pending().await
    }
}

pub fn test_config() -> HybridConfig {
    let mut config = HybridConfig::default();
    config.coordinator.remote_timeout_ms = 1_000;
    config.coordinator.local_timeout_ms = 500;
    config
}

/// Collect emissions for `request_id` up to and including its final one
pub async fn until_final(
    sub: &mut ResponseSubscriber,
    request_id: &str,
) -> Vec<Arc<AggregatedResponse>> {
    let mut seen = Vec::new();
    loop {
        let response = sub.recv().await.expect("stream closed");
        if response.request_id != request_id {
            continue;
        }
        let done = response.is_final;
        seen.push(response);
        if done {
            return seen;
        }
    }
}

/// Let timers and late deliveries run, then report anything still queued
pub async fn drain_after(sub: &mut ResponseSubscriber, wait: Duration) -> Vec<Arc<AggregatedResponse>> {
    tokio::time::sleep(wait).await;
    let mut rest = Vec::new();
    while let Some(response) = sub.try_recv() {
        rest.push(response);
    }
    rest
}
