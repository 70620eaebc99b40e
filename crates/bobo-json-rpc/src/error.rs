use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::error_codes;

/// The fixed JSON-RPC error catalog.
///
/// Codes are carried unchanged onto the wire, the HTTP statuses follow the
/// json-rpc-over-http convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorKind {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
}

impl RpcErrorKind {
    pub fn code(&self) -> i64 {
        match self {
            RpcErrorKind::ParseError => error_codes::PARSE_ERROR,
            RpcErrorKind::InvalidRequest => error_codes::INVALID_REQUEST,
            RpcErrorKind::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            RpcErrorKind::InvalidParams => error_codes::INVALID_PARAMS,
            RpcErrorKind::InternalError => error_codes::INTERNAL_ERROR,
            RpcErrorKind::ServerError => error_codes::SERVER_ERROR_END,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            RpcErrorKind::ParseError => "Parse error.",
            RpcErrorKind::InvalidRequest => "Invalid Request.",
            RpcErrorKind::MethodNotFound => "Method not found.",
            RpcErrorKind::InvalidParams => "Invalid params",
            RpcErrorKind::InternalError => "Internal error.",
            RpcErrorKind::ServerError => "Server Error",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            RpcErrorKind::InvalidRequest => 400,
            RpcErrorKind::MethodNotFound => 404,
            _ => 500,
        }
    }

    /// Name embedded in the wire message, e.g. `"MethodNotFoundError: ..."`.
    pub fn name(&self) -> &'static str {
        match self {
            RpcErrorKind::ParseError => "ParseError",
            RpcErrorKind::InvalidRequest => "InvalidRequestError",
            RpcErrorKind::MethodNotFound => "MethodNotFoundError",
            RpcErrorKind::InvalidParams => "InvalidParamsError",
            RpcErrorKind::InternalError => "InternalError",
            RpcErrorKind::ServerError => "ServerError",
        }
    }

    /// Whether a service method may surface this kind to the client as-is.
    pub fn passes_through_dispatch(&self) -> bool {
        matches!(
            self,
            RpcErrorKind::MethodNotFound | RpcErrorKind::InvalidParams | RpcErrorKind::ServerError
        )
    }
}

/// JSON-RPC error object as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A classified JSON-RPC failure belonging to exactly one message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RpcError {
    kind: RpcErrorKind,
    code: i64,
    name: Cow<'static, str>,
    message: String,
    data: Option<Value>,
    status: u16,
}

impl RpcError {
    pub fn new(kind: RpcErrorKind, message: Option<String>) -> Self {
        Self {
            kind,
            code: kind.code(),
            name: Cow::Borrowed(kind.name()),
            message: message.unwrap_or_else(|| kind.default_message().to_string()),
            data: None,
            status: kind.http_status(),
        }
    }

    pub fn parse_error() -> Self {
        Self::new(RpcErrorKind::ParseError, None)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::InvalidRequest, Some(message.into()))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            RpcErrorKind::MethodNotFound,
            Some(format!("Method {} not found", method)),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::InvalidParams, Some(message.into()))
    }

    pub fn internal_error(message: Option<String>) -> Self {
        Self::new(RpcErrorKind::InternalError, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::ServerError, Some(message.into()))
    }

    /// Implementation-defined server error with its own code.
    ///
    /// Codes outside `-32099..=-32000` are reserved by the protocol and are
    /// replaced with the generic `-32000`.
    pub fn server_error_code(code: i64, message: impl Into<String>) -> Self {
        let mut error = Self::server_error(message);
        if (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END).contains(&code) {
            error.code = code;
        } else {
            warn!(
                code,
                "Server error code outside -32099..-32000, using {}",
                error_codes::SERVER_ERROR_END
            );
        }
        error
    }

    /// Replace the name shown in front of the wire message.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }

    pub fn kind(&self) -> RpcErrorKind {
        self.kind
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn http_status(&self) -> u16 {
        self.status
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject {
            code: self.code,
            message: format!("{}: {}", self.name, self.message),
            data: self.data.clone(),
        }
    }
}

/// Failure returned by a service method.
#[derive(Debug, Error)]
pub enum MethodError {
    /// A classified error. Only method-not-found, invalid-params and server
    /// errors reach the client unchanged.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Anything else; reported to the client as an internal error.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl MethodError {
    pub fn failed(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        MethodError::Failed(anyhow::Error::msg(message))
    }
}
