//! Backend collaborator contracts, remote result delivery and prompt construction

pub mod local;
pub mod prompt;
pub mod remote;
pub mod sink;

pub use local::{LocalBackend, SimulatedLocalBackend};
pub use prompt::{build_prompt, context_line, AnalysisType};
pub use remote::{RemoteBackend, RemoteBehavior, RemoteCall, SimulatedRemoteBackend};
pub use sink::{RemoteDelivery, ResultSink};
