//! # JSON-RPC 2.0 over HTTP
//!
//! Transport-agnostic request handling for JSON-RPC 2.0 as used over HTTP:
//! a raw request body goes in, a status code and an encoded body come out.
//!
//! ## Features
//! - Envelope validation with the standard error taxonomy
//! - Explicit allow-list of service methods with positional or named parameters
//! - Single and batch requests, notifications answered with no body
//! - Unexpected service failures (including panics) reported as internal errors

pub mod error;
pub mod handler;
pub mod message;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use error::{JsonRpcErrorObject, MethodError, RpcError, RpcErrorKind};
pub use handler::{Batch, RequestHandler};
pub use message::{Outcome, RpcMessage};
pub use registry::{FunctionMethod, MethodDescriptor, MethodRegistry, RegistryError, ServiceMethod};
pub use request::RequestParams;
pub use response::{JsonRpcErrorResponse, JsonRpcMessage, JsonRpcResponse, ReplyBody, RpcReply};
pub use types::JsonRpcVersion;

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Content type of every JSON-RPC over HTTP response
pub const CONTENT_TYPE: &str = "application/json-rpc";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
