//! Validation of a single decoded JSON value into a JSON-RPC message.

use serde_json::{Map, Value};
use tracing::info;

use crate::JSONRPC_VERSION;
use crate::error::RpcError;
use crate::request::RequestParams;

const MEMBERS: [&str; 4] = ["method", "jsonrpc", "params", "id"];

/// What happened to a message once it was validated or executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

/// One unit of work derived from one decoded JSON value.
///
/// A message carries at most one outcome; an envelope error recorded during
/// parsing means it is never dispatched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpcMessage {
    method: Option<String>,
    params: Option<RequestParams>,
    id: Option<Value>,
    notification: bool,
    outcome: Option<Outcome>,
}

impl RpcMessage {
    /// Parse one raw value, recording the first envelope violation as an
    /// `InvalidRequestError` instead of failing.
    pub fn from_value(value: Value) -> Self {
        let mut message = RpcMessage::default();
        if let Err(error) = message.parse(value) {
            info!("Encountered invalid json message: {}", error);
            message.outcome = Some(Outcome::Error(error));
        }
        message
    }

    fn parse(&mut self, value: Value) -> Result<(), RpcError> {
        let Value::Object(mut obj) = value else {
            return Err(RpcError::invalid_request(
                "No valid JSON-RPC Message. Must be an object.",
            ));
        };

        if obj.keys().any(|key| !MEMBERS.contains(&key.as_str())) {
            return Err(RpcError::invalid_request("Invalid members in request object"));
        }

        if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(RpcError::invalid_request(
                "Server support JSON-RPC Ver. 2.0 only",
            ));
        }

        self.method = Some(take_method(&mut obj)?);

        if let Some(params) = obj.remove("params") {
            let params = RequestParams::from_value(params).ok_or_else(|| {
                RpcError::invalid_request("\"params\" must be an array or object.")
            })?;
            self.params = Some(params);
        }

        match obj.remove("id") {
            Some(id) => self.id = Some(id),
            None => self.notification = true,
        }
        Ok(())
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn params(&self) -> Option<&RequestParams> {
        self.params.as_ref()
    }

    /// The id exactly as submitted; `None` when absent or not yet parsed.
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    pub fn is_notification(&self) -> bool {
        self.notification
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            Some(Outcome::Error(error)) => Some(error),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Some(Outcome::Result(result)) => Some(result),
            _ => None,
        }
    }

    pub fn set_result(&mut self, result: Value) {
        self.outcome = Some(Outcome::Result(result));
    }

    pub fn set_error(&mut self, error: RpcError) {
        self.outcome = Some(Outcome::Error(error));
    }
}

fn take_method(obj: &mut Map<String, Value>) -> Result<String, RpcError> {
    match obj.remove("method") {
        None => Err(RpcError::invalid_request("No method specified")),
        Some(Value::String(method)) => Ok(method),
        Some(_) => Err(RpcError::invalid_request("method must be a string")),
    }
}
