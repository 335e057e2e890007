//! Byte-level codec between bus payloads and JSON-RPC structures.
//!
//! Decoding checks well-formedness only: the payload must be JSON whose top
//! level is an object, or an array whose every element is an object. Member
//! level schema is intentionally not validated (see [`JsonRpcRequest`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::JsonRpcError;
use crate::request::JsonRpcRequest;
use crate::response::JsonRpcMessage;

/// Errors produced while decoding or encoding payloads
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid payload structure: {0}")]
    InvalidStructure(String),
}

impl CodecError {
    /// Every inbound decode failure is reported to peers as a parse error.
    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        JsonRpcError::parse_error()
    }
}

/// An inbound payload: exactly one request object, or a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(JsonRpcRequest),
    Batch(Vec<JsonRpcRequest>),
}

impl Payload {
    pub fn is_batch(&self) -> bool {
        matches!(self, Payload::Batch(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Single(_) => 1,
            Payload::Batch(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize to an ordered sequence of requests
    pub fn into_requests(self) -> Vec<JsonRpcRequest> {
        match self {
            Payload::Single(request) => vec![request],
            Payload::Batch(requests) => requests,
        }
    }
}

/// An outbound payload: one response object, or an array of responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Single(JsonRpcMessage),
    Batch(Vec<JsonRpcMessage>),
}

impl Reply {
    pub fn is_batch(&self) -> bool {
        matches!(self, Reply::Batch(_))
    }

    pub fn into_messages(self) -> Vec<JsonRpcMessage> {
        match self {
            Reply::Single(message) => vec![message],
            Reply::Batch(messages) => messages,
        }
    }
}

impl From<JsonRpcMessage> for Reply {
    fn from(message: JsonRpcMessage) -> Self {
        Reply::Single(message)
    }
}

/// Decode an inbound payload into a single request or a batch
pub fn decode(raw: &[u8]) -> Result<Payload, CodecError> {
    match serde_json::from_slice::<Value>(raw)? {
        value @ Value::Object(_) => Ok(Payload::Single(serde_json::from_value(value)?)),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                if item.is_object() {
                    serde_json::from_value(item).map_err(CodecError::from)
                } else {
                    Err(CodecError::InvalidStructure(format!(
                        "batch element {} is not an object",
                        index
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Payload::Batch),
        other => Err(CodecError::InvalidStructure(format!(
            "expected an object or an array, found {}",
            json_type_name(&other)
        ))),
    }
}

/// Encode any wire structure as compact JSON
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(Into::into)
}

/// Encode an outbound reply
pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>, CodecError> {
    encode(reply)
}

/// Decode an outbound reply (one response object or an array of them)
pub fn decode_reply(raw: &[u8]) -> Result<Reply, CodecError> {
    serde_json::from_slice(raw).map_err(Into::into)
}

/// Decode a single response, as a client awaiting one call does
pub fn decode_response(raw: &[u8]) -> Result<JsonRpcMessage, CodecError> {
    serde_json::from_slice(raw).map_err(Into::into)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestId;
    use serde_json::json;

    #[test]
    fn test_decode_single() {
        let payload =
            decode(br#"{"jsonrpc":"2.0","method":"echo","params":{"value":"hi"},"id":1}"#).unwrap();

        assert!(!payload.is_batch());
        let requests = payload.into_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "echo");
        assert_eq!(requests[0].id, Some(RequestId::from(1)));
    }

    #[test]
    fn test_decode_batch_preserves_order() {
        let payload = decode(
            br#"[{"jsonrpc":"2.0","method":"a","id":1},{"jsonrpc":"2.0","method":"b"},{"jsonrpc":"2.0","method":"c","id":"x"}]"#,
        )
        .unwrap();

        assert!(payload.is_batch());
        let methods: Vec<_> = payload
            .into_requests()
            .into_iter()
            .map(|r| r.method)
            .collect();
        assert_eq!(methods, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_decode_empty_batch() {
        let payload = decode(b"[]").unwrap();
        assert!(payload.is_batch());
        assert!(payload.is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        let cases: [&[u8]; 6] = [
            br#"{"jsonrpc": "2.0", "method": "test""#,
            b"not json",
            b"",
            b"42",
            br#""a string""#,
            br#"[{"method":"a","id":1}, 7]"#,
        ];
        for raw in cases {
            let err = decode(raw).unwrap_err();
            assert_eq!(err.to_json_rpc_error().error.code, -32700);
        }
    }

    #[test]
    fn test_encode_single_and_batch() {
        let single = Reply::Single(JsonRpcMessage::success(RequestId::from(1), json!("hi")));
        assert_eq!(
            String::from_utf8(encode_reply(&single).unwrap()).unwrap(),
            r#"{"jsonrpc":"2.0","result":"hi","id":1}"#
        );

        let batch = Reply::Batch(vec![
            JsonRpcMessage::success(RequestId::from(1), json!(1)),
            JsonRpcMessage::error(JsonRpcError::method_not_found(RequestId::from(2))),
        ]);
        assert_eq!(
            String::from_utf8(encode_reply(&batch).unwrap()).unwrap(),
            r#"[{"jsonrpc":"2.0","result":1,"id":1},{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":2}]"#
        );
    }

    #[test]
    fn test_reply_round_trip() {
        let replies = [
            Reply::Single(JsonRpcMessage::success(RequestId::Null, json!({"nested": [1, 2]}))),
            Reply::Single(JsonRpcMessage::error(JsonRpcError::parse_error())),
            Reply::Batch(vec![
                JsonRpcMessage::success(RequestId::from("a"), Value::Null),
                JsonRpcMessage::error(JsonRpcError::new(
                    RequestId::from(9),
                    crate::JsonRpcErrorObject::application(1234, "X", None),
                )),
            ]),
        ];

        for reply in replies {
            let bytes = encode_reply(&reply).unwrap();
            assert_eq!(decode_reply(&bytes).unwrap(), reply);
        }
    }

    #[test]
    fn test_decode_response() {
        let message = decode_response(br#"{"jsonrpc":"2.0","result":{"k":"v"},"id":null}"#).unwrap();
        assert_eq!(message.into_result().unwrap(), json!({"k": "v"}));

        assert!(decode_response(b"[]").is_err());
    }
}
