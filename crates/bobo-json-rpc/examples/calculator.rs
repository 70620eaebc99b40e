//! Calculator JSON-RPC Example
//!
//! Exposes `add` and `divide` and feeds a few request bodies straight into
//! the request handler, printing the status and body a transport would send.

use async_trait::async_trait;
use bobo_json_rpc::prelude::*;
use serde_json::Value;

struct Divide;

#[async_trait]
impl ServiceMethod for Divide {
    async fn call(&self, args: Vec<Value>) -> Result<Value, MethodError> {
        let (a, b) = (number(&args[0])?, number(&args[1])?);
        if b == 0.0 {
            return Err(RpcError::server_error_code(-32001, "Division by zero")
                .named("ArithmeticError")
                .into());
        }
        Ok(Value::from(a / b))
    }
}

fn number(value: &Value) -> Result<f64, MethodError> {
    value
        .as_f64()
        .ok_or_else(|| RpcError::invalid_params(format!("{} is not a number", value)).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = MethodRegistry::new();
    registry.expose_fn("add", &["a", "b"], |args: Vec<Value>| async move {
        Ok::<_, MethodError>(Value::from(number(&args[0])? + number(&args[1])?))
    })?;
    registry.expose("divide", &["a", "b"], Divide)?;

    let handler = RequestHandler::new(registry);

    let bodies = [
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": 5, "b": 3}, "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "divide", "params": [10, 0], "id": 2}"#,
        r#"{"jsonrpc": "2.0", "method": "multiply", "params": [2, 3], "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": [1], "id": 4}"#,
        r#"[{"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": "a"},
            {"jsonrpc": "2.0", "method": "add", "params": [3, 4]}]"#,
        r#"{"jsonrpc": "2.0", "method""#,
    ];

    for body in bodies {
        let reply = handler.handle(body.as_bytes()).await;
        println!("--> {}", body);
        println!("<-- {} {}", reply.status, String::from_utf8(reply.to_bytes()?)?);
    }

    Ok(())
}
