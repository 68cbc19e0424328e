//! Result delivery from the remote backend back into the coordinator

use hybridai_core::{BackendError, RemoteResult, Token};
use tokio::sync::mpsc;

/// A remote outcome keyed by the token it was issued under
#[derive(Debug, Clone)]
pub struct RemoteDelivery {
    pub token: Token,
    pub outcome: Result<RemoteResult, BackendError>,
}

/// `deliver(token, result)` handle given to the remote backend.
///
/// Cloneable and usable from any thread or task; delivery is fire-and-forget.
/// Duplicate or late deliveries are tolerated by the receiving side.
#[derive(Debug, Clone)]
pub struct ResultSink {
    tx: mpsc::UnboundedSender<RemoteDelivery>,
}

impl ResultSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RemoteDelivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns false when the receiving coordinator has shut down
    pub fn deliver(&self, token: Token, outcome: Result<RemoteResult, BackendError>) -> bool {
        let delivered = self.tx.send(RemoteDelivery { token, outcome }).is_ok();
        if !delivered {
            tracing::debug!(%token, "remote result dropped, coordinator gone");
        }
        delivered
    }

    pub fn deliver_result(&self, token: Token, result: RemoteResult) -> bool {
        self.deliver(token, Ok(result))
    }

    pub fn deliver_error(&self, token: Token, error: BackendError) -> bool {
        self.deliver(token, Err(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_roundtrip() {
        let (sink, mut rx) = ResultSink::channel();
        assert!(sink.deliver_result(Token::new(3), RemoteResult::new("r", "ok", 0.5)));

        let delivery = rx.recv().await.unwrap();
        assert_eq!(delivery.token, Token::new(3));
        assert_eq!(delivery.outcome.unwrap().text, "ok");
    }

    #[tokio::test]
    async fn test_deliver_after_close() {
        let (sink, rx) = ResultSink::channel();
        drop(rx);
        assert!(!sink.deliver_error(Token::new(1), BackendError::failed("x")));
    }
}
