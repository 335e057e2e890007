//! # JSON-RPC 2.0 Wire Types
//!
//! Transport-agnostic JSON-RPC 2.0 types and the codec used to move them
//! across a publish/subscribe bus.
//!
//! ## Features
//! - Requests, notifications and batches with a single `JsonRpcRequest` type
//! - Success and error responses with the exact member order peers expect
//! - Permissive inbound decoding: well-formedness only, no schema validation

pub mod codec;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

pub mod prelude;

// Re-export main types
pub use codec::{CodecError, Payload, Reply};
pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use request::JsonRpcRequest;
pub use response::{JsonRpcMessage, JsonRpcResponse};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Code used for handler errors that do not declare one
    pub const APPLICATION_DEFAULT: i64 = 0;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
