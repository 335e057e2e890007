use std::sync::Arc;

use busrpc_json_rpc::{JsonRpcError, JsonRpcErrorObject, JsonRpcMessage, JsonRpcRequest};
use tracing::debug;

use crate::observer::{DispatchObserver, NoopObserver};
use crate::registry::{ApplicationError, MethodRegistry, ToJsonRpcError};

/// Result of dispatching one request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A response to put on the wire
    Response(JsonRpcMessage),
    /// The request was a notification; nothing is sent, success or failure
    Suppressed,
}

impl Outcome {
    pub fn into_response(self) -> Option<JsonRpcMessage> {
        match self {
            Outcome::Response(message) => Some(message),
            Outcome::Suppressed => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Outcome::Suppressed)
    }
}

/// Routes single requests to their registered handler
pub struct Dispatcher<E = ApplicationError>
where
    E: ToJsonRpcError,
{
    registry: Arc<MethodRegistry<E>>,
    observer: Arc<dyn DispatchObserver>,
}

impl<E> Dispatcher<E>
where
    E: ToJsonRpcError,
{
    pub fn new(registry: Arc<MethodRegistry<E>>) -> Self {
        Self::with_observer(registry, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        registry: Arc<MethodRegistry<E>>,
        observer: Arc<dyn DispatchObserver>,
    ) -> Self {
        Self { registry, observer }
    }

    pub fn registry(&self) -> &MethodRegistry<E> {
        &self.registry
    }

    /// Invoke the handler for `request` at most once and classify the result.
    ///
    /// Unknown methods and handler failures become error responses, but only
    /// when the request carried an `id`; notifications always yield
    /// [`Outcome::Suppressed`].
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Outcome {
        let JsonRpcRequest {
            method, params, id, ..
        } = request;

        let result: Result<_, JsonRpcErrorObject> = match self.registry.get(&method) {
            Some(handler) => handler
                .handle(&method, params)
                .await
                .map_err(|domain_error| domain_error.to_error_object()),
            None => {
                debug!("Method not found: '{}'", method);
                Err(JsonRpcErrorObject::method_not_found())
            }
        };

        match &result {
            Ok(_) => self.observer.on_success(&method, id.as_ref()),
            Err(error) => self.observer.on_error(&method, id.as_ref(), error),
        }

        let Some(id) = id else {
            return Outcome::Suppressed;
        };
        match result {
            Ok(value) => Outcome::Response(JsonRpcMessage::success(id, value)),
            Err(error) => Outcome::Response(JsonRpcMessage::error(JsonRpcError::new(id, error))),
        }
    }
}
