//! Request handling for JSON-RPC over HTTP.
//!
//! One call to [`RequestHandler::handle`] takes a raw request body through
//! decode, validation, dispatch and collection, and yields the status and
//! body the transport should send. Messages of a batch run one after the
//! other in payload order.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::RpcError;
use crate::message::{Outcome, RpcMessage};
use crate::registry::MethodRegistry;
use crate::response::{JsonRpcErrorResponse, JsonRpcMessage, JsonRpcResponse, RpcReply};

/// Decoded payload: the messages and whether they arrived as a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub messages: Vec<RpcMessage>,
    pub is_batch: bool,
}

/// Entry point used by transports
#[derive(Debug, Clone)]
pub struct RequestHandler {
    registry: Arc<MethodRegistry>,
}

impl RequestHandler {
    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_shared_registry(Arc::new(registry))
    }

    pub fn with_shared_registry(registry: Arc<MethodRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Process one raw request body.
    pub async fn handle(&self, body: &[u8]) -> RpcReply {
        let mut batch = match decode_body(body) {
            Ok(batch) => batch,
            Err(err) => {
                info!("{}", err);
                return RpcReply::top_level_error(&err);
            }
        };

        debug!(
            "Processing {} message(s), batch={}",
            batch.messages.len(),
            batch.is_batch
        );
        for message in &mut batch.messages {
            self.registry.dispatch(message).await;
        }

        respond(&batch).unwrap_or_else(|err| {
            error!("Inconsistent response state: {}", err);
            RpcReply::top_level_error(&err)
        })
    }
}

/// Decode the body into messages.
///
/// Malformed JSON is a parse error and an empty array an invalid request;
/// both apply to the whole request.
pub fn decode_body(body: &[u8]) -> Result<Batch, RpcError> {
    let json: Value = serde_json::from_slice(body).map_err(|_| RpcError::parse_error())?;

    match json {
        Value::Array(values) => {
            if values.is_empty() {
                return Err(RpcError::invalid_request("Received an empty batch message."));
            }
            Ok(Batch {
                messages: values.into_iter().map(RpcMessage::from_value).collect(),
                is_batch: true,
            })
        }
        other => Ok(Batch {
            messages: vec![RpcMessage::from_value(other)],
            is_batch: false,
        }),
    }
}

/// Status and body for one message; `None` when nothing is sent back.
pub fn collect_response(message: &RpcMessage) -> Option<(u16, JsonRpcMessage)> {
    if message.is_notification() {
        return None;
    }
    match message.outcome() {
        Some(Outcome::Error(err)) => Some((
            err.http_status(),
            JsonRpcErrorResponse::new(message.id(), err).into(),
        )),
        Some(Outcome::Result(result)) => Some((
            200,
            JsonRpcResponse::new(message.id(), result.clone()).into(),
        )),
        None => {
            warn!("Message neither contains an error nor a result");
            None
        }
    }
}

/// Assemble the reply for a processed batch.
pub fn respond(batch: &Batch) -> Result<RpcReply, RpcError> {
    let mut responses: Vec<(u16, JsonRpcMessage)> =
        batch.messages.iter().filter_map(collect_response).collect();

    if responses.is_empty() {
        return Ok(RpcReply::no_content());
    }

    if batch.is_batch {
        return Ok(RpcReply::batch(
            responses.into_iter().map(|(_, body)| body).collect(),
        ));
    }

    if responses.len() != 1 {
        return Err(RpcError::internal_error(Some(format!(
            "Expected exactly one response for a single request, got {}",
            responses.len()
        ))));
    }
    let (status, body) = responses.remove(0);
    Ok(RpcReply::single(status, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MethodError, RpcErrorKind};
    use serde_json::json;

    fn handler() -> RequestHandler {
        let mut registry = MethodRegistry::new();
        registry
            .expose_fn("echo", &["text"], |args: Vec<Value>| async move {
                Ok::<_, MethodError>(args.into_iter().next().unwrap_or(Value::Null))
            })
            .unwrap();
        registry
            .expose_fn("nothing", &[], |_| async { Ok::<_, MethodError>(Value::Null) })
            .unwrap();
        RequestHandler::new(registry)
    }

    async fn call(body: &str) -> (u16, Option<Value>) {
        let reply = handler().handle(body.as_bytes()).await;
        (reply.status, reply.to_value())
    }

    #[tokio::test]
    async fn test_named_echo() {
        let (status, body) =
            call(r#"{"jsonrpc":"2.0","method":"echo","params":{"text":"hi"},"id":1}"#).await;

        assert_eq!(status, 200);
        assert_eq!(body, Some(json!({"jsonrpc": "2.0", "result": "hi", "id": 1})));
    }

    #[tokio::test]
    async fn test_null_result_still_answers() {
        let (status, body) = call(r#"{"jsonrpc":"2.0","method":"nothing","id":"n"}"#).await;

        assert_eq!(status, 200);
        assert_eq!(body, Some(json!({"jsonrpc": "2.0", "result": null, "id": "n"})));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let (status, body) = call(r#"{"jsonrpc": "2.0", "method"#).await;
        let body = body.unwrap();

        assert_eq!(status, 500);
        assert!(body.is_object());
        assert_eq!(body["error"]["code"], json!(-32700));
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (status, body) = call("[]").await;
        let body = body.unwrap();

        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], json!(-32600));
        assert_eq!(
            body["error"]["message"],
            json!("InvalidRequestError: Received an empty batch message.")
        );
    }

    #[tokio::test]
    async fn test_wrong_version() {
        let (status, body) = call(r#"{"jsonrpc":"1.0","method":"echo","id":1}"#).await;
        let body = body.unwrap();

        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], json!(-32600));
        assert_eq!(
            body["error"]["message"],
            json!("InvalidRequestError: Server support JSON-RPC Ver. 2.0 only")
        );
    }

    #[tokio::test]
    async fn test_scalar_payload_is_invalid_request() {
        let (status, body) = call("42").await;

        assert_eq!(status, 400);
        assert_eq!(body.unwrap()["error"]["code"], json!(-32600));
    }

    #[tokio::test]
    async fn test_single_notification_is_no_content() {
        let (status, body) =
            call(r#"{"jsonrpc":"2.0","method":"echo","params":["quiet"]}"#).await;

        assert_eq!(status, 204);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_failed_notification_is_silent() {
        let (status, body) = call(r#"{"jsonrpc":"2.0","method":"missing"}"#).await;

        assert_eq!(status, 204);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_skips_notifications() {
        let (status, body) = call(
            r#"[
                {"jsonrpc":"2.0","method":"echo","params":["a"],"id":1},
                {"jsonrpc":"2.0","method":"echo","params":["b"]},
                {"jsonrpc":"2.0","method":"missing","id":2},
                {"foo":"bar"},
                {"jsonrpc":"2.0","method":"echo","params":["c"],"id":null}
            ]"#,
        )
        .await;

        assert_eq!(status, 200);
        let responses = body.unwrap();
        let responses = responses.as_array().unwrap();
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0], json!({"jsonrpc": "2.0", "result": "a", "id": 1}));
        assert_eq!(responses[1]["error"]["code"], json!(-32601));
        assert_eq!(responses[1]["id"], json!(2));
        assert_eq!(responses[2]["error"]["code"], json!(-32600));
        assert_eq!(responses[2]["id"], Value::Null);
        assert_eq!(responses[3], json!({"jsonrpc": "2.0", "result": "c", "id": null}));
    }

    #[tokio::test]
    async fn test_batch_of_notifications() {
        let (status, body) = call(
            r#"[{"jsonrpc":"2.0","method":"echo","params":["a"]},{"jsonrpc":"2.0","method":"nothing"}]"#,
        )
        .await;

        assert_eq!(status, 204);
        assert!(body.is_none());
    }

    #[test]
    fn test_single_mode_requires_one_response() {
        let mut first = RpcMessage::from_value(json!({"jsonrpc": "2.0", "method": "a", "id": 1}));
        first.set_result(json!(1));
        let second = first.clone();
        let batch = Batch {
            messages: vec![first, second],
            is_batch: false,
        };

        let err = respond(&batch).unwrap_err();
        assert_eq!(err.kind(), RpcErrorKind::InternalError);
    }

    #[test]
    fn test_unprocessed_message_is_skipped() {
        let message = RpcMessage::from_value(json!({"jsonrpc": "2.0", "method": "a", "id": 1}));
        assert!(collect_response(&message).is_none());
    }
}
