use std::sync::Arc;

use busrpc_json_rpc::{JsonRpcRequest, RequestId, codec};
use busrpc_transport::Requester;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, RequestOptions};
use crate::error::{ClientError, ClientResult};

/// JSON-RPC client bound to one server subject
#[derive(Clone)]
pub struct JsonRpcClient {
    transport: Arc<dyn Requester>,
    config: ClientConfig,
}

impl JsonRpcClient {
    pub fn new(transport: Arc<dyn Requester>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call `method` with the default timeout
    pub async fn request(&self, method: &str, params: Value) -> ClientResult<Value> {
        self.request_with_options(method, params, RequestOptions::default())
            .await
    }

    /// Call `method` and resolve with the response's `result`.
    ///
    /// The request always carries `"id": null`, so the server always answers.
    /// Transport failures (including timeouts) and error responses are both
    /// returned as errors; nothing is retried.
    pub async fn request_with_options(
        &self,
        method: &str,
        params: Value,
        options: RequestOptions,
    ) -> ClientResult<Value> {
        let request = JsonRpcRequest::call(method, params, RequestId::Null);
        let payload = serde_json::to_vec(&request)?;
        let timeout = self.config.timeout_for(&options);

        debug!(
            "Sending '{}' to '{}' (timeout {:?})",
            method, self.config.subject, timeout
        );
        let reply = self
            .transport
            .request(&self.config.subject, Bytes::from(payload), timeout)
            .await
            .map_err(|err| {
                warn!("Request '{}' failed: {}", method, err);
                ClientError::from(err)
            })?;

        let response = codec::decode_response(&reply)?;
        response.into_result().map_err(ClientError::from)
    }

    /// Typed variant of [`request`](Self::request)
    pub async fn call<P, R>(&self, method: &str, params: &P) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        let result = self.request(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }
}
