//! Hybrid local/remote dispatch: pending-call registry, aggregation and the response stream

mod aggregator;
mod coordinator;
mod health;
mod pending;
mod stream;

pub use aggregator::ResponseAggregator;
pub use coordinator::HybridCoordinator;
pub use health::{HealthStatus, RemoteHealth};
pub use pending::{PendingEntry, PendingRequestRegistry, RegistryStats};
pub use stream::{ResponseStream, ResponseSubscriber};
