//! HTTP request handler for JSON-RPC

use std::sync::Arc;

use bytes::Bytes;
use http_body::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use bobo_json_rpc::{CONTENT_TYPE as JSON_RPC_CONTENT_TYPE, RequestHandler};

use crate::{CorsLayer, ServerConfig};

/// HTTP handler for JSON-RPC requests
#[derive(Clone)]
pub struct RpcHttpHandler {
    pub(crate) config: Arc<ServerConfig>,
    rpc: RequestHandler,
}

impl RpcHttpHandler {
    pub fn new(config: ServerConfig, rpc: RequestHandler) -> Self {
        Self {
            config: Arc::new(config),
            rpc,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Names of the service methods reachable through this handler
    pub fn rpc_methods(&self) -> Vec<String> {
        self.rpc.registry().method_names()
    }

    /// Route one HTTP request. Never fails; transport problems become plain
    /// HTTP error responses.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        debug!("Handling {} {}", req.method(), req.uri().path());

        let mut response = if req.uri().path() != self.config.rpc_path {
            plain(StatusCode::NOT_FOUND, "Not Found")
        } else {
            match *req.method() {
                Method::POST => self.handle_json_rpc_request(req).await,
                Method::OPTIONS => plain(StatusCode::NO_CONTENT, ""),
                _ => method_not_allowed(),
            }
        };

        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }

    /// Handle JSON-RPC requests over HTTP POST
    async fn handle_json_rpc_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let declared_length = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|len| len.to_str().ok())
            .and_then(|len| len.parse::<usize>().ok());
        if declared_length.is_some_and(|len| len > self.config.max_body_size) {
            warn!("Request body too large: {:?} bytes", declared_length);
            return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }

        let body = Limited::new(req.into_body(), self.config.max_body_size);
        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("Request body exceeded {} bytes", self.config.max_body_size);
                return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return plain(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        let reply = self.rpc.handle(&body_bytes).await;
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let payload = match reply.to_bytes() {
            Ok(payload) => payload,
            Err(err) => {
                error!("Failed to encode JSON-RPC reply: {}", err);
                return plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        };

        debug!("Sending JSON-RPC reply: status={}, {} bytes", status, payload.len());
        let mut response = Response::new(Full::new(Bytes::from(payload)));
        *response.status_mut() = status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(JSON_RPC_CONTENT_TYPE),
        );
        response
    }
}

fn plain(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    if !text.is_empty() {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    }
    response
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use bobo_json_rpc::{MethodError, MethodRegistry};
    use serde_json::{Value, json};

    fn create_test_handler(config: ServerConfig) -> RpcHttpHandler {
        let mut registry = MethodRegistry::new();
        registry
            .expose_fn("echo", &["text"], |args: Vec<Value>| async move {
                Ok::<_, MethodError>(args[0].clone())
            })
            .unwrap();
        RpcHttpHandler::new(config, RequestHandler::new(registry))
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_post_dispatches_to_core() {
        let handler = create_test_handler(ServerConfig::default());
        let response = handler
            .handle(request(
                Method::POST,
                "/rpc",
                r#"{"jsonrpc":"2.0","method":"echo","params":["hi"],"id":7}"#,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json-rpc"
        );
        let body: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body, json!({"jsonrpc": "2.0", "result": "hi", "id": 7}));
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let handler = create_test_handler(ServerConfig::default());
        let response = handler
            .handle(request(Method::POST, "/rpc", r#"{"jsonrpc":"2.0","method":"nope","id":1}"#))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json-rpc"
        );
    }

    #[tokio::test]
    async fn test_notification_is_no_content() {
        let handler = create_test_handler(ServerConfig::default());
        let response = handler
            .handle(request(Method::POST, "/rpc", r#"{"jsonrpc":"2.0","method":"echo","params":["x"]}"#))
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let handler = create_test_handler(ServerConfig::default());
        let response = handler.handle(request(Method::GET, "/rpc", "")).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let handler = create_test_handler(ServerConfig::default());
        let response = handler.handle(request(Method::POST, "/other", "{}")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let config = ServerConfig {
            max_body_size: 16,
            ..Default::default()
        };
        let handler = create_test_handler(config);
        let response = handler
            .handle(request(Method::POST, "/rpc", r#"{"jsonrpc":"2.0","method":"echo","params":["long"],"id":1}"#))
            .await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_preflight_with_cors() {
        let config = ServerConfig {
            enable_cors: true,
            ..Default::default()
        };
        let handler = create_test_handler(config);
        let response = handler.handle(request(Method::OPTIONS, "/rpc", "")).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }
}
