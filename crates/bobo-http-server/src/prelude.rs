//! # HTTP JSON-RPC Server Prelude
//!
//! ```rust
//! use bobo_http_server::prelude::*;
//! ```

// Core server types
pub use crate::cors::CorsLayer;
pub use crate::handler::RpcHttpHandler;
pub use crate::server::{HttpRpcServer, HttpRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use bobo_json_rpc::prelude::*;

// Error types
pub use crate::{HttpRpcError, Result};
