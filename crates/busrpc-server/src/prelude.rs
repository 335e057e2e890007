//! # Server Prelude
//!
//! ```rust
//! use busrpc_server::prelude::*;
//! ```

pub use crate::config::ServerConfig;
pub use crate::observer::{CountingObserver, DispatchObserver, TracingObserver};
pub use crate::registry::{ApplicationError, JsonRpcHandler, MethodRegistry, ToJsonRpcError};
pub use crate::server::{JsonRpcServer, JsonRpcServerBuilder};
pub use crate::ServerError;

pub use busrpc_json_rpc::prelude::*;
