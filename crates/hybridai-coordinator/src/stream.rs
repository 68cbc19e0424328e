//! Multi-consumer fan-out of aggregated responses

use hybridai_core::AggregatedResponse;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Publishing side, owned by the coordinator.
///
/// Emissions are shared as `Arc` so every subscriber sees the same immutable
/// value. A subscriber that falls more than `capacity` emissions behind skips
/// the oldest ones.
#[derive(Debug, Clone)]
pub struct ResponseStream {
    tx: broadcast::Sender<Arc<AggregatedResponse>>,
}

impl ResponseStream {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> ResponseSubscriber {
        ResponseSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    /// Returns how many subscribers will see the emission
    pub fn publish(&self, response: AggregatedResponse) -> usize {
        match self.tx.send(Arc::new(response)) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(dropped)) => {
                tracing::debug!(request_id = %dropped.request_id, "no subscribers for emission");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving side; sees every emission published after it subscribed
#[derive(Debug)]
pub struct ResponseSubscriber {
    rx: broadcast::Receiver<Arc<AggregatedResponse>>,
}

impl ResponseSubscriber {
    /// Next emission, or `None` once the coordinator is gone.
    ///
    /// A subscriber that falls more than the stream capacity behind skips
    /// the oldest emissions, which can include a request's final one.
    /// Consumers that must see every final should size the capacity for
    /// their burst (see `CoordinatorConfig::stream_capacity`).
    pub async fn recv(&mut self) -> Option<Arc<AggregatedResponse>> {
        loop {
            match self.rx.recv().await {
                Ok(response) => return Some(response),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "response subscriber lagged, emissions dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<Arc<AggregatedResponse>> {
        loop {
            match self.rx.try_recv() {
                Ok(response) => return Some(response),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "response subscriber lagged, emissions dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(id: &str) -> AggregatedResponse {
        let mut response = AggregatedResponse::empty();
        response.request_id = id.to_string();
        response
    }

    #[tokio::test]
    async fn test_fan_out() {
        let stream = ResponseStream::new(8);
        let mut a = stream.subscribe();
        let mut b = stream.subscribe();

        assert_eq!(stream.publish(response("r1")), 2);
        assert_eq!(a.recv().await.unwrap().request_id, "r1");
        assert_eq!(b.recv().await.unwrap().request_id, "r1");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let stream = ResponseStream::new(8);
        assert_eq!(stream.publish(response("r1")), 0);

        let mut late = stream.subscribe();
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_oldest() {
        let stream = ResponseStream::new(2);
        let mut sub = stream.subscribe();
        for id in ["r1", "r2", "r3", "r4"] {
            stream.publish(response(id));
        }

        assert_eq!(sub.recv().await.unwrap().request_id, "r3");
        assert_eq!(sub.recv().await.unwrap().request_id, "r4");
    }

    #[tokio::test]
    async fn test_closed_after_drop() {
        let stream = ResponseStream::new(2);
        let mut sub = stream.subscribe();
        drop(stream);
        assert!(sub.recv().await.is_none());
    }
}
