//! # Client Prelude
//!
//! ```rust
//! use busrpc_client::prelude::*;
//! ```

pub use crate::client::JsonRpcClient;
pub use crate::config::{ClientConfig, RequestOptions};
pub use crate::error::{ClientError, ClientResult};

pub use busrpc_transport::TransportError;
