//! # busrpc Client
//!
//! Issues JSON-RPC 2.0 calls as request/reply round trips on a pub/sub
//! transport. Every call carries `"id": null` and awaits exactly one reply,
//! bounded by a per-call or default timeout (1000 ms).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use busrpc_client::{ClientConfig, JsonRpcClient};
//! use busrpc_transport::MemoryBus;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JsonRpcClient::new(Arc::new(MemoryBus::new()), ClientConfig::new("demo"));
//!     let result = client.request("echo", json!({"value": "hi"})).await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod prelude;

// Re-export main types
pub use client::JsonRpcClient;
pub use config::{ClientConfig, RequestOptions};
pub use error::{ClientError, ClientResult};
