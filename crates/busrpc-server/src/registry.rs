use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use busrpc_json_rpc::JsonRpcErrorObject;
use busrpc_json_rpc::error_codes::APPLICATION_DEFAULT;
use serde_json::Value;

/// Trait for errors that can be converted to JSON-RPC error objects
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    /// Convert this error to a JSON-RPC error object
    fn to_error_object(&self) -> JsonRpcErrorObject;
}

/// Error a handler reports back to the caller: a code (0 when the handler
/// does not declare one), a message and optional structured data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApplicationError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: APPLICATION_DEFAULT,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl ToJsonRpcError for ApplicationError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject::application(self.code, self.message.clone(), self.data.clone())
    }
}

/// Trait for handling JSON-RPC method calls
#[async_trait]
pub trait JsonRpcHandler: Send + Sync {
    /// The error type returned by this handler
    type Error: ToJsonRpcError;

    /// Handle a call to `method` with the request's `params` (`null` when absent).
    /// Returns domain errors only; the dispatcher converts them to JSON-RPC errors
    async fn handle(&self, method: &str, params: Value) -> Result<Value, Self::Error>;

    /// List supported methods (optional - used for introspection)
    fn supported_methods(&self) -> Vec<String> {
        vec![]
    }
}

/// A handler backed by an async closure over the params
pub struct FunctionHandler<F, Fut, E> {
    handler_fn: F,
    _marker: PhantomData<fn() -> (Fut, E)>,
}

impl<F, Fut, E> FunctionHandler<F, Fut, E>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
    E: ToJsonRpcError,
{
    pub fn new(handler_fn: F) -> Self {
        Self {
            handler_fn,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, E> JsonRpcHandler for FunctionHandler<F, Fut, E>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
    E: ToJsonRpcError,
{
    type Error = E;

    async fn handle(&self, _method: &str, params: Value) -> Result<Value, Self::Error> {
        (self.handler_fn)(params).await
    }
}

/// Mapping from method name to handler.
///
/// Built up front and handed to the server, which shares it read-only across
/// every concurrent dispatch for its whole lifetime.
pub struct MethodRegistry<E = ApplicationError>
where
    E: ToJsonRpcError,
{
    handlers: HashMap<String, Arc<dyn JsonRpcHandler<Error = E>>>,
}

impl<E> MethodRegistry<E>
where
    E: ToJsonRpcError,
{
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a specific method
    pub fn register_method<H>(&mut self, method: impl Into<String>, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        self.handlers.insert(method.into(), Arc::new(handler));
    }

    /// Register a handler for multiple methods
    pub fn register_methods<H>(&mut self, methods: Vec<String>, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        let handler_arc: Arc<dyn JsonRpcHandler<Error = E>> = Arc::new(handler);
        for method in methods {
            self.handlers.insert(method, Arc::clone(&handler_arc));
        }
    }

    /// Register an async closure for a method
    pub fn register_fn<F, Fut>(&mut self, method: impl Into<String>, handler_fn: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
    {
        self.register_method(method, FunctionHandler::new(handler_fn));
    }

    /// Builder-style [`register_fn`](Self::register_fn)
    pub fn with_fn<F, Fut>(mut self, method: impl Into<String>, handler_fn: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
    {
        self.register_fn(method, handler_fn);
        self
    }

    /// Look up the handler for a method
    pub fn get(&self, method: &str) -> Option<&Arc<dyn JsonRpcHandler<Error = E>>> {
        self.handlers.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.handlers.keys().cloned().collect();
        methods.sort();
        methods
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> Default for MethodRegistry<E>
where
    E: ToJsonRpcError,
{
    fn default() -> Self {
        Self::new()
    }
}
