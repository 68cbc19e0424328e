//! Request dispatch across the local and remote backends.
//!
//! `submit` returns immediately; every request ends in exactly one final
//! emission on the response stream, optionally preceded by one provisional
//! emission. Remote outcomes re-enter through the [`ResultSink`] handed to
//! the remote backend, or through the per-call timeout, and are matched to
//! their request via the [`PendingRequestRegistry`].

use crate::aggregator::ResponseAggregator;
use crate::health::{HealthStatus, RemoteHealth};
use crate::pending::{PendingEntry, PendingRequestRegistry, RegistryStats};
use crate::stream::{ResponseStream, ResponseSubscriber};
use hybridai_backends::{
    build_prompt, AnalysisType, LocalBackend, RemoteBackend, RemoteCall, RemoteDelivery, ResultSink,
};
use hybridai_core::{
    AggregatedResponse, BackendError, BackendResult, BackendSource, CoordinatorConfig,
    HybridConfig, HybridError, LocalResult, ProcessingStrategy, RemoteResult, Request,
    RequestKind, RouteReason, RoutingDecision, StrategyRouter, Token,
};
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

type LocalOutcome = Result<LocalResult, BackendError>;

/// Where the final emission gets its local half from
#[derive(Debug)]
enum LocalBranch {
    /// Not part of the strategy
    Skipped,
    /// Runs concurrently; `None` until it settles
    Running(watch::Receiver<Option<LocalOutcome>>),
    /// Already observed before the remote call was issued
    Settled(LocalOutcome),
    /// Runs once the remote call settles
    Deferred,
}

/// Per-call state carried through the registry
#[derive(Debug)]
pub(crate) struct ProcessingContext {
    decision: RoutingDecision,
    local: LocalBranch,
    issued_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Delivered,
    Expired,
}

struct Inner {
    router: StrategyRouter,
    aggregator: ResponseAggregator,
    local: Arc<dyn LocalBackend>,
    remote: Arc<dyn RemoteBackend>,
    registry: PendingRequestRegistry<ProcessingContext>,
    stream: ResponseStream,
    health: RemoteHealth,
    sink: ResultSink,
    config: CoordinatorConfig,
}

/// Cheap to clone; all clones share one registry and one response stream.
#[derive(Clone)]
pub struct HybridCoordinator {
    inner: Arc<Inner>,
}

impl HybridCoordinator {
    /// Build a coordinator and start its delivery loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: HybridConfig, local: Arc<dyn LocalBackend>, remote: Arc<dyn RemoteBackend>) -> Self {
        let (sink, deliveries) = ResultSink::channel();
        let inner = Arc::new(Inner {
            router: StrategyRouter::new(config.router),
            aggregator: ResponseAggregator::new(config.aggregator),
            health: RemoteHealth::new(
                config.coordinator.remote_failure_threshold,
                config.coordinator.remote_cooldown(),
            ),
            stream: ResponseStream::new(config.coordinator.stream_capacity),
            registry: PendingRequestRegistry::new(),
            config: config.coordinator,
            local,
            remote,
            sink,
        });

        tracing::info!(
            local = inner.local.name(),
            remote = inner.remote.name(),
            remote_timeout_ms = inner.config.remote_timeout_ms,
            "hybrid coordinator started"
        );

        tokio::spawn(delivery_loop(Arc::downgrade(&inner), deliveries));
        Self { inner }
    }

    /// Dispatch a request in the background; returns its id
    pub fn submit(&self, request: Request) -> String {
        self.spawn_dispatch(request, None)
    }

    /// Like [`submit`](Self::submit), bypassing the routing rules
    pub fn submit_with(&self, request: Request, strategy: ProcessingStrategy) -> String {
        self.spawn_dispatch(request, Some(strategy))
    }

    fn spawn_dispatch(&self, request: Request, forced: Option<ProcessingStrategy>) -> String {
        let id = request.id.clone();
        let this = self.clone();
        tokio::spawn(async move { this.dispatch(Arc::new(request), forced).await });
        id
    }

    /// Parse and dispatch a wire request. Unparseable input still produces
    /// one final error emission, under a freshly generated id.
    pub fn submit_json(&self, value: &Value) -> String {
        match Request::from_json(value) {
            Ok(request) => self.submit(request),
            Err(err) => {
                let mut shell = Request::new(RequestKind::Other("malformed".to_string()), "");
                shell.correlation_id = ["correlationId", "messageId"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(Value::as_str))
                    .map(str::to_string);

                tracing::warn!(request_id = %shell.id, error = %err, "rejecting malformed request");
                let response = self.inner.aggregator.error_response(&err, None).for_request(&shell);
                self.emit(response);
                shell.id
            }
        }
    }

    pub fn subscribe(&self) -> ResponseSubscriber {
        self.inner.stream.subscribe()
    }

    pub fn router(&self) -> &StrategyRouter {
        &self.inner.router
    }

    /// Remote calls still waiting for a result or a timeout
    pub fn pending_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.inner.registry.stats()
    }

    pub fn remote_health(&self) -> HealthStatus {
        self.inner.health.status()
    }

    async fn dispatch(&self, request: Arc<Request>, forced: Option<ProcessingStrategy>) {
        if let Err(err) = request.validate() {
            tracing::warn!(request_id = %request.id, error = %err, "rejecting malformed request");
            self.emit(self.inner.aggregator.error_response(&err, None).for_request(&request));
            return;
        }

        let mut decision = self.inner.router.route(&request);
        if let Some(strategy) = forced {
            decision.strategy = strategy;
            decision.reason = RouteReason::Forced;
        }
        if decision.strategy.uses_remote() && !self.remote_ready() {
            if !decision.strategy.uses_local() {
                let err = HybridError::BackendUnavailable {
                    backend: "remote".to_string(),
                    message: format!("{} is offline or cooling down", self.inner.remote.name()),
                };
                tracing::warn!(request_id = %request.id, error = %err, "remote-only request cannot be served");
                let response = self.inner.aggregator.error_response(&err, None);
                self.emit(response.for_request(&request).with_strategy(decision.strategy));
                return;
            }

            tracing::info!(
                request_id = %request.id,
                from = %decision.strategy,
                "remote backend unavailable, degrading to local only"
            );
            decision.strategy = ProcessingStrategy::LocalOnly;
        }

        match decision.strategy {
            ProcessingStrategy::LocalOnly => {
                let results = [self.local_result(&request, self.run_local(&request).await)];
                let response = self.inner.aggregator.from_results(&results);
                self.emit(response.for_request(&request).with_strategy(decision.strategy));
            }
            ProcessingStrategy::RemoteOnly => {
                self.issue_remote(request, decision, LocalBranch::Skipped, None).await;
            }
            ProcessingStrategy::Parallel => {
                let (settled_tx, settled_rx) = watch::channel(None);
                let branch = LocalBranch::Running(settled_rx);
                let Some(call) = self.track_remote(&request, decision, branch, None) else {
                    return;
                };

                let local_branch = async {
                    let outcome = self.run_local(&request).await;
                    if let Ok(local) = &outcome {
                        self.emit_provisional(&request, local, decision.strategy);
                    }
                    // Provisional goes out before the final can observe the local outcome.
                    settled_tx.send_replace(Some(outcome));
                };
                // A submit that never returns must not hold back the local half.
                tokio::join!(self.send_remote(call), local_branch);
            }
            ProcessingStrategy::SequentialLocalFirst => {
                let outcome = self.run_local(&request).await;
                if let Ok(local) = &outcome {
                    self.emit_provisional(&request, local, decision.strategy);
                }
                let grounding = outcome.as_ref().ok().cloned();
                self.issue_remote(request, decision, LocalBranch::Settled(outcome), grounding.as_ref())
                    .await;
            }
            ProcessingStrategy::SequentialRemoteFirst => {
                self.issue_remote(request, decision, LocalBranch::Deferred, None).await;
            }
        }
    }

    fn remote_ready(&self) -> bool {
        !self.inner.health.is_degraded() && self.inner.remote.is_available()
    }

    async fn run_local(&self, request: &Request) -> LocalOutcome {
        let started = Instant::now();
        let budget = self.inner.config.local_timeout();
        let outcome = match tokio::time::timeout(budget, self.inner.local.process(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BackendError::timeout(format!(
                "{} gave no result within {}ms",
                self.inner.local.name(),
                budget.as_millis()
            ))),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => tracing::debug!(request_id = %request.id, elapsed_ms, "local backend finished"),
            Err(err) => tracing::warn!(request_id = %request.id, elapsed_ms, error = %err, "local backend failed"),
        }
        outcome
    }

    fn local_result(&self, request: &Request, outcome: LocalOutcome) -> BackendResult {
        match outcome {
            Ok(local) => BackendResult::Local(local),
            Err(error) => BackendResult::Error {
                request_id: request.id.clone(),
                source: BackendSource::Local,
                error,
            },
        }
    }

    async fn issue_remote(
        &self,
        request: Arc<Request>,
        decision: RoutingDecision,
        local: LocalBranch,
        grounding: Option<&LocalResult>,
    ) {
        if let Some(call) = self.track_remote(&request, decision, local, grounding) {
            self.send_remote(call).await;
        }
    }

    /// Register a remote call and arm its deadline. `None` means an error
    /// emission already went out and the request is finished.
    fn track_remote(
        &self,
        request: &Arc<Request>,
        decision: RoutingDecision,
        local: LocalBranch,
        grounding: Option<&LocalResult>,
    ) -> Option<RemoteCall> {
        let token = self.inner.registry.issue();
        let call = RemoteCall {
            token,
            prompt: build_prompt(request, grounding),
            media: request.payload.media.clone(),
            analysis: AnalysisType::for_request(request),
            request: request.clone(),
        };

        let context = ProcessingContext {
            decision,
            local,
            issued_at: Instant::now(),
        };
        if let Err(err) = self
            .inner
            .registry
            .register(token, request.clone(), decision.strategy, context)
        {
            tracing::error!(request_id = %request.id, error = %err, "could not track remote call");
            let fault = HybridError::AggregationFault(err.to_string());
            let response = self.inner.aggregator.error_response(&fault, None);
            self.emit(response.for_request(request).with_strategy(decision.strategy));
            return None;
        }

        tracing::debug!(
            request_id = %request.id,
            %token,
            strategy = %decision.strategy,
            analysis = ?call.analysis,
            "issuing remote call"
        );
        self.arm_timeout(token);
        Some(call)
    }

    async fn send_remote(&self, call: RemoteCall) {
        let token = call.token;
        let request_id = call.request.id.clone();
        if let Err(err) = self.inner.remote.submit(call, self.inner.sink.clone()).await {
            tracing::warn!(%request_id, %token, error = %err, "remote submit rejected");
            // Settling may wait on this task's local branch, so it cannot run inline.
            let this = self.clone();
            tokio::spawn(async move { this.settle(token, Err(err), Settlement::Delivered).await });
        }
    }

    fn arm_timeout(&self, token: Token) {
        let this = self.clone();
        let after = self.inner.config.remote_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let error = BackendError::from(HybridError::RemoteTimeout { token, after });
            this.settle(token, Err(error), Settlement::Expired).await;
        });
    }

    /// Finish a remote call exactly once, whichever of delivery or timeout
    /// gets there first
    async fn settle(&self, token: Token, outcome: Result<RemoteResult, BackendError>, how: Settlement) {
        let taken = match how {
            Settlement::Delivered => self.inner.registry.resolve(token),
            Settlement::Expired => self.inner.registry.expire(token),
        };
        let entry = match taken {
            Ok(entry) => entry,
            // Timers fire for every call, including ones that already finished
            Err(_) if how == Settlement::Expired => return,
            Err(err) => {
                if self.inner.registry.was_issued(token) {
                    let duplicate = HybridError::DuplicateResolution(token);
                    tracing::warn!(error = %duplicate, "ignoring late or duplicate remote result");
                } else {
                    tracing::warn!(error = %err, "ignoring remote result for unknown token");
                }
                return;
            }
        };

        let PendingEntry {
            request,
            strategy,
            context,
            ..
        } = entry;
        let remote_ms = context.issued_at.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => {
                self.inner.health.record_success();
                tracing::debug!(request_id = %request.id, %token, remote_ms, "remote result received");
            }
            Err(err) => {
                self.inner.health.record_failure();
                tracing::warn!(request_id = %request.id, %token, remote_ms, error = %err, "remote call failed");
            }
        }

        let local = match context.local {
            LocalBranch::Skipped => None,
            LocalBranch::Settled(outcome) => Some(outcome),
            LocalBranch::Running(mut settled) => Some(wait_local(&mut settled).await),
            LocalBranch::Deferred => Some(self.run_local(&request).await),
        };

        let mut results = Vec::with_capacity(2);
        if let Some(local) = local {
            results.push(self.local_result(&request, local));
        }
        results.push(match outcome {
            Ok(remote) => BackendResult::Remote(remote),
            Err(error) => BackendResult::Error {
                request_id: request.id.clone(),
                source: BackendSource::Remote,
                error,
            },
        });

        tracing::trace!(
            request_id = %request.id,
            complexity = context.decision.complexity,
            reason = ?context.decision.reason,
            "aggregating final response"
        );
        let response = self.inner.aggregator.from_results(&results);
        self.emit(response.for_request(&request).with_strategy(strategy));
    }

    fn emit_provisional(&self, request: &Request, local: &LocalResult, strategy: ProcessingStrategy) {
        let response = self.inner.aggregator.combine(Some(local), None).provisional();
        self.emit(response.for_request(request).with_strategy(strategy));
    }

    fn emit(&self, response: AggregatedResponse) {
        tracing::info!(
            request_id = %response.request_id,
            message_kind = %response.message_kind,
            priority = ?response.priority,
            is_final = response.is_final,
            is_error = response.is_error(),
            "emitting response"
        );
        self.inner.stream.publish(response);
    }
}

async fn wait_local(settled: &mut watch::Receiver<Option<LocalOutcome>>) -> LocalOutcome {
    let observed = settled
        .wait_for(Option::is_some)
        .await
        .map(|outcome| (*outcome).clone());
    match observed {
        Ok(Some(outcome)) => outcome,
        _ => Err(BackendError::failed("local branch ended without a result")),
    }
}

async fn delivery_loop(inner: Weak<Inner>, mut deliveries: mpsc::UnboundedReceiver<RemoteDelivery>) {
    while let Some(RemoteDelivery { token, outcome }) = deliveries.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let coordinator = HybridCoordinator { inner };
        tokio::spawn(async move { coordinator.settle(token, outcome, Settlement::Delivered).await });
    }
    tracing::debug!("delivery loop stopped");
}
