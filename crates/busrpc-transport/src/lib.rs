//! # Publish/Subscribe Transport
//!
//! The messaging seam busrpc runs on. A transport delivers raw payloads to
//! subscribers along with the subject replies should be published to, and
//! offers a request/reply round trip bounded by a caller-supplied timeout.
//!
//! Connection management, reconnects and delivery guarantees belong to the
//! transport implementation. [`MemoryBus`] is an in-process implementation
//! used by tests and demos.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;

pub mod error;
pub mod memory;

pub use error::{TransportError, TransportResult};
pub use memory::MemoryBus;

/// A message delivered to a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Subject the message was published on
    pub subject: String,
    /// Raw payload bytes
    pub payload: Bytes,
    /// Where a reply should be published, if the sender expects one
    pub reply_to: Option<String>,
}

/// Subscription options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Subscribers sharing a queue group split the messages between them
    pub queue_group: Option<String>,
}

impl SubscribeOptions {
    pub fn queue_group(group: impl Into<String>) -> Self {
        Self {
            queue_group: Some(group.into()),
        }
    }
}

/// Stream of messages for one subscription; dropping it unsubscribes
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<InboundMessage>,
    on_drop: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<InboundMessage>,
        on_drop: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            receiver,
            on_drop: Some(Box::new(on_drop)),
        }
    }
}

impl Stream for Subscription {
    type Item = InboundMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Publishes payloads to a subject
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: Bytes) -> TransportResult<()>;
}

/// Registers interest in a subject
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn subscribe(
        &self,
        subject: &str,
        options: SubscribeOptions,
    ) -> TransportResult<Subscription>;
}

/// Request/reply round trip: publish with a private reply subject and await
/// exactly one reply
#[async_trait]
pub trait Requester: Send + Sync {
    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> TransportResult<Bytes>;
}
