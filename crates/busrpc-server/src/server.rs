//! Subscription lifecycle: subscribe, handle each message in its own task,
//! publish the reply to the message's reply subject.

use std::sync::Arc;

use busrpc_transport::{InboundMessage, Publisher, SubscribeOptions, Subscriber, Subscription};
use bytes::Bytes;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::batch::BatchCoordinator;
use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::observer::{DispatchObserver, NoopObserver};
use crate::registry::{ApplicationError, MethodRegistry, ToJsonRpcError};
use crate::{Result, ServerError};

/// Builder for [`JsonRpcServer`]
pub struct JsonRpcServerBuilder<E = ApplicationError>
where
    E: ToJsonRpcError,
{
    config: ServerConfig,
    registry: MethodRegistry<E>,
    observer: Arc<dyn DispatchObserver>,
}

impl JsonRpcServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: MethodRegistry::new(),
            observer: Arc::new(NoopObserver),
        }
    }
}

impl Default for JsonRpcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> JsonRpcServerBuilder<E>
where
    E: ToJsonRpcError,
{
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.config.subject = subject.into();
        self
    }

    pub fn queue_group(mut self, group: impl Into<String>) -> Self {
        self.config.queue_group = Some(group.into());
        self
    }

    /// Observe each dispatch, e.g. to feed metrics
    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the method registry; it cannot be changed once the server starts
    pub fn registry<F>(self, registry: MethodRegistry<F>) -> JsonRpcServerBuilder<F>
    where
        F: ToJsonRpcError,
    {
        JsonRpcServerBuilder {
            config: self.config,
            registry,
            observer: self.observer,
        }
    }

    /// Subscribe on `transport` and start answering requests
    pub async fn start<T>(self, transport: Arc<T>) -> Result<JsonRpcServer<E>>
    where
        T: Subscriber + Publisher + 'static,
    {
        let config = self.config;
        if config.subject.trim().is_empty() {
            return Err(ServerError::Config("subject must not be empty".to_string()));
        }

        let options = SubscribeOptions {
            queue_group: config.queue_group.clone(),
        };
        let subscription = transport.subscribe(&config.subject, options).await?;

        let method_count = self.registry.len();
        let dispatcher = Dispatcher::with_observer(Arc::new(self.registry), self.observer);
        let coordinator = Arc::new(BatchCoordinator::new(dispatcher));
        let publisher: Arc<dyn Publisher> = transport;

        info!(
            "JSON-RPC server listening on '{}' (queue group: {:?}, {} methods)",
            config.subject, config.queue_group, method_count
        );
        let task = tokio::spawn(serve(
            subscription,
            Arc::clone(&coordinator),
            publisher,
            config.subject.clone(),
        ));

        Ok(JsonRpcServer {
            config,
            coordinator,
            task: Some(task),
        })
    }
}

/// A running server. Dropping it stops the subscription loop.
pub struct JsonRpcServer<E = ApplicationError>
where
    E: ToJsonRpcError,
{
    config: ServerConfig,
    coordinator: Arc<BatchCoordinator<E>>,
    task: Option<JoinHandle<()>>,
}

impl JsonRpcServer {
    pub fn builder() -> JsonRpcServerBuilder {
        JsonRpcServerBuilder::new()
    }
}

impl<E> JsonRpcServer<E>
where
    E: ToJsonRpcError,
{
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn subject(&self) -> &str {
        &self.config.subject
    }

    pub fn registered_methods(&self) -> Vec<String> {
        self.coordinator.dispatcher().registry().registered_methods()
    }

    /// False once the transport has closed the subscription
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop listening. Replies already being computed may still be published.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        info!("JSON-RPC server on '{}' stopped", self.config.subject);
    }
}

impl<E> Drop for JsonRpcServer<E>
where
    E: ToJsonRpcError,
{
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn serve<E>(
    mut subscription: Subscription,
    coordinator: Arc<BatchCoordinator<E>>,
    publisher: Arc<dyn Publisher>,
    subject: String,
) where
    E: ToJsonRpcError,
{
    while let Some(message) = subscription.next().await {
        let coordinator = Arc::clone(&coordinator);
        let publisher = Arc::clone(&publisher);
        tokio::spawn(async move {
            respond(&coordinator, publisher.as_ref(), message).await;
        });
    }
    debug!("Subscription to '{}' closed", subject);
}

async fn respond<E>(
    coordinator: &BatchCoordinator<E>,
    publisher: &dyn Publisher,
    message: InboundMessage,
) where
    E: ToJsonRpcError,
{
    debug!(
        "Received message on '{}' ({} bytes)",
        message.subject,
        message.payload.len()
    );

    let Some(reply) = coordinator.handle_message(&message.payload).await else {
        return;
    };
    let Some(reply_to) = message.reply_to else {
        warn!(
            "Dropping reply for message on '{}': no reply subject",
            message.subject
        );
        return;
    };
    if let Err(err) = publisher.publish(&reply_to, Bytes::from(reply)).await {
        error!("Failed to publish reply to '{}': {}", reply_to, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::CountingObserver;
    use busrpc_transport::{MemoryBus, Requester};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn registry() -> MethodRegistry {
        MethodRegistry::new()
            .with_fn("echo", |params: Value| async move { Ok(params["value"].clone()) })
    }

    async fn request_json(bus: &MemoryBus, subject: &str, raw: &str) -> Value {
        let reply = bus
            .request(subject, Bytes::from(raw.to_string()), Duration::from_secs(1))
            .await
            .unwrap();
        serde_json::from_slice(&reply).unwrap()
    }

    #[tokio::test]
    async fn test_request_reply_over_bus() {
        let bus = Arc::new(MemoryBus::new());
        let server = JsonRpcServer::builder()
            .subject("svc.echo")
            .registry(registry())
            .start(Arc::clone(&bus))
            .await
            .unwrap();

        assert!(server.is_running());
        assert_eq!(server.registered_methods(), vec!["echo"]);

        let reply = request_json(
            &bus,
            "svc.echo",
            r#"{"jsonrpc":"2.0","method":"echo","params":{"value":"hi"},"id":1}"#,
        )
        .await;
        assert_eq!(reply, json!({"jsonrpc": "2.0", "result": "hi", "id": 1}));
    }

    #[tokio::test]
    async fn test_parse_error_is_published() {
        let bus = Arc::new(MemoryBus::new());
        let _server = JsonRpcServer::builder()
            .subject("svc")
            .registry(registry())
            .start(Arc::clone(&bus))
            .await
            .unwrap();

        let reply = request_json(&bus, "svc", "{oops").await;
        assert_eq!(reply["error"]["code"], json!(-32700));
        assert_eq!(reply["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_queue_group_answers_once() {
        let bus = Arc::new(MemoryBus::new());
        let observer = Arc::new(CountingObserver::new());
        let mut servers = Vec::new();
        for _ in 0..2 {
            let server = JsonRpcServer::builder()
                .subject("svc")
                .queue_group("workers")
                .observer(observer.clone())
                .registry(registry())
                .start(Arc::clone(&bus))
                .await
                .unwrap();
            servers.push(server);
        }

        for id in 0..4 {
            let raw = format!(
                r#"{{"jsonrpc":"2.0","method":"echo","params":{{"value":{}}},"id":{}}}"#,
                id, id
            );
            let reply = request_json(&bus, "svc", &raw).await;
            assert_eq!(reply["result"], json!(id));
        }
        assert_eq!(observer.stats().succeeded, 4);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_missing_reply_subject_still_dispatches() {
        let bus = Arc::new(MemoryBus::new());
        let observer = Arc::new(CountingObserver::new());
        let _server = JsonRpcServer::builder()
            .subject("svc")
            .observer(observer.clone())
            .registry(registry())
            .start(Arc::clone(&bus))
            .await
            .unwrap();

        bus.publish(
            "svc",
            Bytes::from_static(br#"{"jsonrpc":"2.0","method":"echo","params":{"value":1},"id":1}"#),
        )
        .await
        .unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while observer.stats().succeeded == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(logs_contain("no reply subject"));
    }

    #[tokio::test]
    async fn test_empty_subject_rejected() {
        let result = JsonRpcServer::builder()
            .subject(" ")
            .start(Arc::new(MemoryBus::new()))
            .await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_shutdown_unsubscribes() {
        let bus = Arc::new(MemoryBus::new());
        let server = JsonRpcServer::builder()
            .subject("svc")
            .registry(registry())
            .start(Arc::clone(&bus))
            .await
            .unwrap();
        assert_eq!(bus.subscriber_count("svc"), 1);

        server.shutdown().await;
        assert_eq!(bus.subscriber_count("svc"), 0);
    }
}
