//! # busrpc Server
//!
//! Answers JSON-RPC 2.0 requests published on a pub/sub subject.
//!
//! Each inbound message is decoded as a single request or a batch, every
//! request is dispatched concurrently to its registered handler, notification
//! outcomes are dropped, and the remaining responses are published to the
//! message's reply subject as one object or one array.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use busrpc_server::prelude::*;
//! use busrpc_transport::MemoryBus;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry: MethodRegistry = MethodRegistry::new()
//!         .with_fn("echo", |params: Value| async move { Ok(params["value"].clone()) });
//!
//!     let server = JsonRpcServer::builder()
//!         .subject("demo")
//!         .registry(registry)
//!         .start(Arc::new(MemoryBus::new()))
//!         .await?;
//!
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod dispatch;
pub mod observer;
pub mod prelude;
pub mod registry;
pub mod server;

// Re-export main types
pub use batch::BatchCoordinator;
pub use config::ServerConfig;
pub use dispatch::{Dispatcher, Outcome};
pub use observer::{CountingObserver, DispatchObserver, DispatchStats, NoopObserver, TracingObserver};
pub use registry::{ApplicationError, FunctionHandler, JsonRpcHandler, MethodRegistry, ToJsonRpcError};
pub use server::{JsonRpcServer, JsonRpcServerBuilder};

// Re-export foundational types
pub use busrpc_json_rpc::{JsonRpcErrorObject, RequestId};

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Transport error: {0}")]
    Transport(#[from] busrpc_transport::TransportError),

    #[error("Configuration error: {0}")]
    Config(String),
}
