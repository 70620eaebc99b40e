//! # HTTP JSON-RPC Server
//!
//! HTTP transport for [`bobo_json_rpc`]: a single POST endpoint that hands
//! the raw body to the JSON-RPC request handler and answers with its status
//! and body as `application/json-rpc`.
//!
//! ## Features
//! - POST-only endpoint on a configurable path
//! - Request body size limit
//! - Optional CORS for browser-based clients

pub mod cors;
pub mod handler;
pub mod prelude;
pub mod server;

// Re-export main types
pub use cors::CorsLayer;
pub use handler::RpcHttpHandler;
pub use server::{HttpRpcServer, HttpRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use bobo_json_rpc::{MethodRegistry, RequestHandler, ServiceMethod};

/// Result type for HTTP JSON-RPC operations
pub type Result<T> = std::result::Result<T, HttpRpcError>;

/// HTTP transport errors
#[derive(Debug, thiserror::Error)]
pub enum HttpRpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
