//! Error types for client operations

use busrpc_json_rpc::{CodecError, JsonRpcErrorCode, JsonRpcErrorObject};
use busrpc_transport::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Timeout, no responders or connectivity; never a wire error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with an error response
    #[error("RPC error: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The reply was not a decodable JSON-RPC response
    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] CodecError),

    /// Params could not be serialized or the result deserialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Get the error code if this is a remote error
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Classification of a remote error code
    pub fn rpc_kind(&self) -> Option<JsonRpcErrorCode> {
        self.error_code().map(JsonRpcErrorCode::from_code)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }
}

impl From<JsonRpcErrorObject> for ClientError {
    fn from(error: JsonRpcErrorObject) -> Self {
        Self::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}
