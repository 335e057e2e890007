//! # JSON-RPC Prelude
//!
//! Convenient re-exports of the most commonly used wire types.
//!
//! ```rust
//! use busrpc_json_rpc::prelude::*;
//! ```

pub use crate::codec::{CodecError, Payload, Reply};
pub use crate::error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use crate::request::JsonRpcRequest;
pub use crate::response::{JsonRpcMessage, JsonRpcResponse};
pub use crate::types::{JsonRpcVersion, RequestId};

// Standard error codes
pub use crate::error_codes::*;
