//! Data model, configuration and strategy routing for hybrid local/remote inference

mod config;
mod error;
mod request;
mod response;
mod router;
mod types;

pub use config::{AggregatorConfig, CoordinatorConfig, HybridConfig, RouterConfig};
pub use error::{BackendError, BackendErrorKind, HybridError, RegistryError};
pub use request::{MediaRef, Payload, Request};
pub use response::{
    AggregatedResponse, BackendResult, BackendSource, DisplayLayers, ErrorDetails, LocalResult,
    RemoteResult, AGGREGATION_ERROR_KIND,
};
pub use router::{RouteReason, RoutingDecision, StrategyRouter};
pub use types::{Priority, ProcessingStrategy, RequestKind, Token, Urgency};
