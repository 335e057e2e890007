use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC request or notification
///
/// Inbound decoding is deliberately permissive: the `jsonrpc` member is not
/// checked, a missing or non-string `method` reads as the empty method name
/// and a missing `params` reads as `null`. The `id` is kept as given, whatever
/// its JSON type, because it has to be echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc", default, deserialize_with = "any_version")]
    pub version: JsonRpcVersion,
    #[serde(default, deserialize_with = "method_or_empty")]
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_id"
    )]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Value, id: Option<RequestId>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id,
        }
    }

    /// Create a call, which is always answered
    pub fn call(method: impl Into<String>, params: Value, id: RequestId) -> Self {
        Self::new(method, params, Some(id))
    }

    /// Create a notification, which is never answered
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self::new(method, params, None)
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Get a parameter by name (if params are an object)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_object()?.get(name)
    }

    /// Get a parameter by index (if params are an array)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_array()?.get(index)
    }
}

fn any_version<'de, D>(deserializer: D) -> Result<JsonRpcVersion, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer)?;
    Ok(JsonRpcVersion::V2_0)
}

fn method_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(method) => Ok(method),
        _ => Ok(String::new()),
    }
}

// Only called when the member exists, so `"id": null` becomes `Some(Null)`.
fn present_id<'de, D>(deserializer: D) -> Result<Option<RequestId>, D::Error>
where
    D: Deserializer<'de>,
{
    RequestId::deserialize(deserializer).map(Some)
}
