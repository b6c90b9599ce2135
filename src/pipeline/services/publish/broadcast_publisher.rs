use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::broadcast;
use tower::Service;

use crate::error::AppError;
use crate::pipeline::services::publish::PublishRequest;

/// Publishes to in-process subscribers over a broadcast channel.
#[derive(Clone)]
pub struct BroadcastPublisher {
    publish_tx: broadcast::Sender<PublishRequest>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<PublishRequest>) {
        let (publish_tx, publish_rx) = broadcast::channel(capacity.max(1));
        (Self { publish_tx }, publish_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishRequest> {
        self.publish_tx.subscribe()
    }
}

impl Service<PublishRequest> for BroadcastPublisher {
    type Response = ();
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: PublishRequest) -> Self::Future {
        // no subscribers is not a failure, there is simply nobody listening
        if self.publish_tx.send(request).is_err() {
            tracing::trace!("No subscribers for published color");
        }
        Box::pin(async move { Ok(()) })
    }
}
