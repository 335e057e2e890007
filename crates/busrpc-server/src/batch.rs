//! Message-level pipeline: decode, fan out, collect, filter, shape.

use std::panic::AssertUnwindSafe;

use busrpc_json_rpc::codec::{self, Reply};
use busrpc_json_rpc::{JsonRpcError, JsonRpcMessage, RequestId};
use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, error, warn};

use crate::dispatch::{Dispatcher, Outcome};
use crate::registry::{ApplicationError, ToJsonRpcError};

/// Turns one raw inbound message into at most one outbound payload
pub struct BatchCoordinator<E = ApplicationError>
where
    E: ToJsonRpcError,
{
    dispatcher: Dispatcher<E>,
}

impl<E> BatchCoordinator<E>
where
    E: ToJsonRpcError,
{
    pub fn new(dispatcher: Dispatcher<E>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<E> {
        &self.dispatcher
    }

    /// Handle a raw message and return the reply to publish, if any.
    ///
    /// Malformed input yields a `-32700` error with a `null` id. Messages made
    /// only of notifications, and empty batches, yield `None`.
    pub async fn handle(&self, raw: &[u8]) -> Option<Reply> {
        let payload = match codec::decode(raw) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("JSON-RPC parse error: {}", err);
                return Some(Reply::Single(err.to_json_rpc_error().into()));
            }
        };

        let is_batch = payload.is_batch();
        let requests = payload.into_requests();
        debug!(
            "Dispatching {} request(s), batch={}",
            requests.len(),
            is_batch
        );

        // Every dispatch is issued before any is awaited; join_all keeps input order.
        let dispatches = requests
            .into_iter()
            .map(|request| self.dispatcher.dispatch(request));
        let outcomes = match AssertUnwindSafe(join_all(dispatches)).catch_unwind().await {
            Ok(outcomes) => outcomes,
            Err(_) => {
                error!("Handler panicked while dispatching message");
                return Some(internal_error("Handler panicked"));
            }
        };

        let results: Vec<JsonRpcMessage> = outcomes
            .into_iter()
            .filter_map(Outcome::into_response)
            .collect();
        shape_reply(results, is_batch)
    }

    /// Handle a raw message and return the encoded reply bytes, if any
    pub async fn handle_message(&self, raw: &[u8]) -> Option<Vec<u8>> {
        let reply = self.handle(raw).await?;
        match codec::encode_reply(&reply) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                error!("Failed to encode reply: {}", err);
                codec::encode_reply(&internal_error("Failed to encode reply")).ok()
            }
        }
    }
}

/// Single object for one answer to a non-batch message; array whenever the
/// message was a batch; nothing when every request was a notification.
fn shape_reply(mut results: Vec<JsonRpcMessage>, is_batch: bool) -> Option<Reply> {
    match results.len() {
        0 => None,
        1 if !is_batch => results.pop().map(Reply::Single),
        _ => Some(Reply::Batch(results)),
    }
}

fn internal_error(message: &str) -> Reply {
    Reply::Single(JsonRpcError::internal_error(RequestId::Null, Some(message.to_string())).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodRegistry;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;

    fn coordinator() -> BatchCoordinator {
        let registry: MethodRegistry = MethodRegistry::new()
            .with_fn("echo", |params: Value| async move { Ok(params["value"].clone()) })
            .with_fn("slow_echo", |params: Value| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(params["value"].clone())
            })
            .with_fn("fail", |_params: Value| async move {
                Err(ApplicationError::with_code(1234, "X"))
            })
            .with_fn("panic", |_params: Value| async move {
                if true {
                    panic!("handler bug");
                }
                Ok(Value::Null)
            });
        BatchCoordinator::new(Dispatcher::new(Arc::new(registry)))
    }

    async fn reply_json(raw: &str) -> Option<Value> {
        coordinator()
            .handle_message(raw.as_bytes())
            .await
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_single_call() {
        let reply = reply_json(
            r#"{"jsonrpc":"2.0","method":"echo","params":{"value":"hi"},"id":1}"#,
        )
        .await;
        assert_eq!(reply, Some(json!({"jsonrpc": "2.0", "result": "hi", "id": 1})));
    }

    #[tokio::test]
    async fn test_single_call_exact_bytes() {
        let bytes = coordinator()
            .handle_message(br#"{"jsonrpc":"2.0","method":"echo","params":{"value":"hi"},"id":1}"#)
            .await
            .unwrap();
        assert_eq!(bytes, br#"{"jsonrpc":"2.0","result":"hi","id":1}"#.to_vec());
    }

    #[tokio::test]
    async fn test_single_handler_error() {
        let reply = reply_json(r#"{"jsonrpc":"2.0","method":"fail","params":{},"id":"req-7"}"#).await;
        assert_eq!(
            reply,
            Some(json!({"jsonrpc": "2.0", "error": {"code": 1234, "message": "X"}, "id": "req-7"}))
        );
    }

    #[tokio::test]
    async fn test_single_notification_is_silent() {
        assert_eq!(reply_json(r#"{"jsonrpc":"2.0","method":"echo","params":{"value":1}}"#).await, None);
        assert_eq!(reply_json(r#"{"jsonrpc":"2.0","method":"fail","params":{}}"#).await, None);
        assert_eq!(reply_json(r#"{"jsonrpc":"2.0","method":"ghost"}"#).await, None);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        for raw in [r#"{"jsonrpc": "2.0", "method""#, "", "17", "[1, 2]"] {
            let reply = reply_json(raw).await;
            assert_eq!(
                reply,
                Some(json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}, "id": null})),
                "input: {:?}",
                raw
            );
        }
    }

    #[tokio::test]
    async fn test_batch_with_unknown_method() {
        let reply = reply_json(
            r#"[{"jsonrpc":"2.0","method":"echo","params":{"value":1},"id":1},{"jsonrpc":"2.0","method":"ghost","params":{},"id":2}]"#,
        )
        .await
        .unwrap();

        let responses = reply.as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses.contains(&json!({"jsonrpc": "2.0", "result": 1, "id": 1})));
        assert!(responses.contains(&json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": "Method not found"},
            "id": 2
        })));
    }

    #[tokio::test]
    async fn test_unusual_id_does_not_spoil_batch() {
        let reply = reply_json(
            r#"[{"method":"echo","params":{"value":1},"id":1},{"method":"echo","params":{"value":2},"id":true}]"#,
        )
        .await;
        assert_eq!(
            reply,
            Some(json!([
                {"jsonrpc": "2.0", "result": 1, "id": 1},
                {"jsonrpc": "2.0", "result": 2, "id": true}
            ]))
        );
    }

    #[tokio::test]
    async fn test_batch_drops_notifications() {
        let reply = reply_json(
            r#"[{"jsonrpc":"2.0","method":"echo","params":{"value":"a"}},{"jsonrpc":"2.0","method":"echo","params":{"value":"b"},"id":"b"},{"jsonrpc":"2.0","method":"fail"}]"#,
        )
        .await;
        assert_eq!(reply, Some(json!([{"jsonrpc": "2.0", "result": "b", "id": "b"}])));
    }

    #[tokio::test]
    async fn test_batch_of_notifications_is_silent() {
        let reply = reply_json(
            r#"[{"jsonrpc":"2.0","method":"echo","params":{"value":1}},{"jsonrpc":"2.0","method":"ghost"}]"#,
        )
        .await;
        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn test_empty_batch_is_silent() {
        assert_eq!(reply_json("[]").await, None);
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let reply = reply_json(
            r#"[{"jsonrpc":"2.0","method":"slow_echo","params":{"value":1},"id":1},{"jsonrpc":"2.0","method":"echo","params":{"value":2},"id":2},{"jsonrpc":"2.0","method":"fail","id":3}]"#,
        )
        .await
        .unwrap();

        let ids: Vec<_> = reply
            .as_array()
            .unwrap()
            .iter()
            .map(|response| response["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_dispatches_concurrently() {
        let raw = r#"[
            {"jsonrpc":"2.0","method":"slow_echo","params":{"value":1},"id":1},
            {"jsonrpc":"2.0","method":"slow_echo","params":{"value":2},"id":2},
            {"jsonrpc":"2.0","method":"slow_echo","params":{"value":3},"id":3}
        ]"#;

        let started = tokio::time::Instant::now();
        let reply = reply_json(raw).await.unwrap();
        assert_eq!(reply.as_array().unwrap().len(), 3);
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let reply = reply_json(
            r#"[{"jsonrpc":"2.0","method":"echo","params":{"value":1},"id":1},{"jsonrpc":"2.0","method":"panic","id":2}]"#,
        )
        .await;
        assert_eq!(
            reply,
            Some(json!({"jsonrpc": "2.0", "error": {"code": -32603, "message": "Handler panicked"}, "id": null}))
        );
    }

    #[test]
    fn test_shape_reply() {
        let one = || vec![JsonRpcMessage::success(RequestId::from(1), json!(1))];

        assert_eq!(shape_reply(vec![], false), None);
        assert_eq!(shape_reply(vec![], true), None);
        assert!(matches!(shape_reply(one(), false), Some(Reply::Single(_))));
        assert!(matches!(shape_reply(one(), true), Some(Reply::Batch(ref v)) if v.len() == 1));
    }
}
