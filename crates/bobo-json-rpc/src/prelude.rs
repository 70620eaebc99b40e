//! # JSON-RPC Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use bobo_json_rpc::prelude::*;
//! ```

pub use crate::error::{MethodError, RpcError, RpcErrorKind};
pub use crate::handler::RequestHandler;
pub use crate::message::RpcMessage;
pub use crate::registry::{MethodRegistry, RegistryError, ServiceMethod};
pub use crate::request::RequestParams;
pub use crate::response::RpcReply;
pub use crate::{CONTENT_TYPE, JSONRPC_VERSION};

// Standard error codes
pub use crate::error_codes::*;
