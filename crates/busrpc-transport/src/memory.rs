//! In-process publish/subscribe bus
//!
//! Subjects match exactly (no wildcards). Plain subscribers each receive every
//! message; within a queue group each message goes to one member, chosen
//! round-robin.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    InboundMessage, Publisher, Requester, SubscribeOptions, Subscriber, Subscription,
    TransportError, TransportResult,
};

/// Prefix of the private reply subjects created by [`MemoryBus::request`]
pub const INBOX_PREFIX: &str = "_INBOX.";

struct SubscriptionEntry {
    id: u64,
    queue_group: Option<String>,
    sender: mpsc::UnboundedSender<InboundMessage>,
}

#[derive(Default)]
struct BusInner {
    subjects: Mutex<HashMap<String, Vec<SubscriptionEntry>>>,
    next_id: AtomicU64,
    cursor: AtomicUsize,
}

impl BusInner {
    fn unsubscribe(&self, subject: &str, id: u64) {
        let mut subjects = self.subjects.lock();
        if let Some(entries) = subjects.get_mut(subject) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                subjects.remove(subject);
            }
        }
        trace!("Unsubscribed {} from '{}'", id, subject);
    }

    /// Returns the number of subscribers the message was handed to
    fn deliver(&self, subject: &str, payload: Bytes, reply_to: Option<String>) -> usize {
        let subjects = self.subjects.lock();
        let Some(entries) = subjects.get(subject) else {
            return 0;
        };

        let mut groups: BTreeMap<&str, Vec<&SubscriptionEntry>> = BTreeMap::new();
        let mut targets = Vec::new();
        for entry in entries {
            match entry.queue_group.as_deref() {
                Some(group) => groups.entry(group).or_default().push(entry),
                None => targets.push(entry),
            }
        }
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        targets.extend(groups.values().map(|members| members[turn % members.len()]));

        let message = InboundMessage {
            subject: subject.to_string(),
            payload,
            reply_to,
        };
        targets
            .into_iter()
            .filter(|entry| entry.sender.send(message.clone()).is_ok())
            .count()
    }
}

/// In-process bus implementing every transport trait
#[derive(Clone, Default)]
pub struct MemoryBus {
    inner: Arc<BusInner>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on a subject
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.inner
            .subjects
            .lock()
            .get(subject)
            .map_or(0, |entries| entries.len())
    }
}

fn validate_subject(subject: &str) -> TransportResult<()> {
    if subject.is_empty() || subject.chars().any(char::is_whitespace) {
        return Err(TransportError::InvalidSubject(subject.to_string()));
    }
    Ok(())
}

#[async_trait]
impl Publisher for MemoryBus {
    async fn publish(&self, subject: &str, payload: Bytes) -> TransportResult<()> {
        validate_subject(subject)?;
        let delivered = self.inner.deliver(subject, payload, None);
        trace!("Published to '{}' ({} receivers)", subject, delivered);
        Ok(())
    }
}

#[async_trait]
impl Subscriber for MemoryBus {
    async fn subscribe(
        &self,
        subject: &str,
        options: SubscribeOptions,
    ) -> TransportResult<Subscription> {
        validate_subject(subject)?;
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        self.inner
            .subjects
            .lock()
            .entry(subject.to_string())
            .or_default()
            .push(SubscriptionEntry {
                id,
                queue_group: options.queue_group,
                sender,
            });
        debug!("Subscribed {} to '{}'", id, subject);

        let weak: Weak<BusInner> = Arc::downgrade(&self.inner);
        let subject = subject.to_string();
        Ok(Subscription::new(receiver, move || {
            if let Some(inner) = weak.upgrade() {
                inner.unsubscribe(&subject, id);
            }
        }))
    }
}

#[async_trait]
impl Requester for MemoryBus {
    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> TransportResult<Bytes> {
        validate_subject(subject)?;
        let inbox = format!("{}{}", INBOX_PREFIX, Uuid::new_v4().simple());
        let mut replies = self.subscribe(&inbox, SubscribeOptions::default()).await?;

        if self.inner.deliver(subject, payload, Some(inbox)) == 0 {
            return Err(TransportError::NoResponders(subject.to_string()));
        }

        match tokio::time::timeout(timeout, replies.next()).await {
            Ok(Some(reply)) => Ok(reply.payload),
            Ok(None) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }
}
