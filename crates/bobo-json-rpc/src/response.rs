use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JsonRpcErrorObject, RpcError};
use crate::types::JsonRpcVersion;

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn new(id: Option<&Value>, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            id: id.cloned().unwrap_or(Value::Null),
        }
    }
}

/// A JSON-RPC error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub error: JsonRpcErrorObject,
    pub id: Value,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<&Value>, error: &RpcError) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            error: error.to_error_object(),
            id: id.cloned().unwrap_or(Value::Null),
        }
    }
}

/// Either response shape; keeps `result` and `error` mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Response(JsonRpcResponse),
    Error(JsonRpcErrorResponse),
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcErrorResponse> for JsonRpcMessage {
    fn from(error: JsonRpcErrorResponse) -> Self {
        Self::Error(error)
    }
}

/// Body of an HTTP reply: one response object or a batch array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Single(JsonRpcMessage),
    Batch(Vec<JsonRpcMessage>),
}

/// What the transport sends back: a status code and an optional body.
///
/// The body is absent only for 204 replies.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub status: u16,
    pub body: Option<ReplyBody>,
}

impl RpcReply {
    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    pub fn single(status: u16, message: JsonRpcMessage) -> Self {
        Self {
            status,
            body: Some(ReplyBody::Single(message)),
        }
    }

    pub fn batch(messages: Vec<JsonRpcMessage>) -> Self {
        Self {
            status: 200,
            body: Some(ReplyBody::Batch(messages)),
        }
    }

    /// Error reply not tied to any message, e.g. a parse error.
    pub fn top_level_error(error: &RpcError) -> Self {
        Self::single(
            error.http_status(),
            JsonRpcErrorResponse::new(None, error).into(),
        )
    }

    pub fn to_value(&self) -> Option<Value> {
        self.body
            .as_ref()
            .map(|body| serde_json::to_value(body).unwrap_or(Value::Null))
    }

    /// Encoded body; empty for 204 replies.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match &self.body {
            Some(body) => serde_json::to_vec(body),
            None => Ok(Vec::new()),
        }
    }
}
