//! Allow-list of exposed service methods and the dispatcher that binds a
//! validated message to one of them.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::{MethodError, RpcError};
use crate::message::RpcMessage;
use crate::request::RequestParams;

/// A method callable over JSON-RPC.
///
/// `args` are already bound in the order the parameter names were declared
/// at registration, whether the client sent them by position or by name.
#[async_trait]
pub trait ServiceMethod: Send + Sync {
    async fn call(&self, args: Vec<Value>) -> Result<Value, MethodError>;
}

/// Adapter turning an async closure into a [`ServiceMethod`]
pub struct FunctionMethod<F> {
    function: F,
}

impl<F, Fut> FunctionMethod<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, MethodError>> + Send,
{
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

#[async_trait]
impl<F, Fut> ServiceMethod for FunctionMethod<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, MethodError>> + Send,
{
    async fn call(&self, args: Vec<Value>) -> Result<Value, MethodError> {
        (self.function)(args).await
    }
}

/// Errors raised while building the registry (never on a request path)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Method '{0}' is already exposed")]
    DuplicateMethod(String),

    #[error("Method '{method}' declares parameter '{param}' more than once")]
    DuplicateParam { method: String, param: String },

    #[error("Method '{method}' declares invalid parameter name '{param}'")]
    InvalidParamName { method: String, param: String },
}

/// A callable together with its ordered parameter names
#[derive(Clone)]
pub struct MethodDescriptor {
    params: Vec<String>,
    method: Arc<dyn ServiceMethod>,
}

impl MethodDescriptor {
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Bind request params to the declared names.
    pub fn bind(&self, params: Option<&RequestParams>) -> Result<Vec<Value>, RpcError> {
        let expected = self.params.len();
        match params {
            None => {
                if expected != 0 {
                    return Err(RpcError::invalid_params(format!(
                        "Wrong number of parameters. Expected {} but 'params' was omitted from json-rpc message.",
                        expected
                    )));
                }
                Ok(Vec::new())
            }
            Some(RequestParams::Array(values)) => {
                if values.len() != expected {
                    return Err(RpcError::invalid_params(format!(
                        "Wrong number of parameters. Expected {} got {}.",
                        expected,
                        values.len()
                    )));
                }
                Ok(values.clone())
            }
            Some(RequestParams::Object(map)) => {
                if !map.keys().all(|key| is_identifier(key)) {
                    return Err(RpcError::invalid_request("Parameter-names must be ASCII"));
                }
                let given: BTreeSet<&str> = map.keys().map(String::as_str).collect();
                let declared: BTreeSet<&str> = self.params.iter().map(String::as_str).collect();
                if given != declared {
                    return Err(RpcError::invalid_params(format!(
                        "Named parameters do not match method. Expected [{}].",
                        self.params.join(", ")
                    )));
                }
                Ok(self
                    .params
                    .iter()
                    .map(|name| map.get(name).cloned().unwrap_or(Value::Null))
                    .collect())
            }
        }
    }
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Registry of explicitly exposed methods
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodDescriptor>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `method` under `name`, declaring its parameter names in order.
    pub fn expose<M>(
        &mut self,
        name: impl Into<String>,
        params: &[&str],
        method: M,
    ) -> Result<(), RegistryError>
    where
        M: ServiceMethod + 'static,
    {
        let name = name.into();
        if self.methods.contains_key(&name) {
            return Err(RegistryError::DuplicateMethod(name));
        }

        let mut seen = BTreeSet::new();
        for param in params {
            if !is_identifier(param) {
                return Err(RegistryError::InvalidParamName {
                    method: name,
                    param: param.to_string(),
                });
            }
            if !seen.insert(*param) {
                return Err(RegistryError::DuplicateParam {
                    method: name,
                    param: param.to_string(),
                });
            }
        }

        debug!("Exposing service method {}({})", name, params.join(", "));
        self.methods.insert(
            name,
            MethodDescriptor {
                params: params.iter().map(|p| p.to_string()).collect(),
                method: Arc::new(method),
            },
        );
        Ok(())
    }

    /// Expose an async closure
    pub fn expose_fn<F, Fut>(
        &mut self,
        name: impl Into<String>,
        params: &[&str],
        function: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, MethodError>> + Send + 'static,
    {
        self.expose(name, params, FunctionMethod::new(function))
    }

    /// Chaining form of [`MethodRegistry::expose`]
    pub fn with_method<M>(
        mut self,
        name: impl Into<String>,
        params: &[&str],
        method: M,
    ) -> Result<Self, RegistryError>
    where
        M: ServiceMethod + 'static,
    {
        self.expose(name, params, method)?;
        Ok(self)
    }

    pub fn resolve(&self, name: &str) -> Result<&MethodDescriptor, RpcError> {
        self.methods
            .get(name)
            .ok_or_else(|| RpcError::method_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Exposed method names, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute a validated message, storing its result or error in place.
    /// Messages that already carry an error are left untouched.
    pub async fn dispatch(&self, message: &mut RpcMessage) {
        if message.error().is_some() {
            return;
        }
        let Some(name) = message.method().map(str::to_owned) else {
            error!("Dispatching a message without a method name");
            message.set_error(RpcError::internal_error(None));
            return;
        };

        match self.execute(&name, message.params()).await {
            Ok(result) => message.set_result(result),
            Err(error) => message.set_error(error),
        }
    }

    async fn execute(&self, name: &str, params: Option<&RequestParams>) -> Result<Value, RpcError> {
        let descriptor = self.resolve(name).inspect_err(|e| info!("{}", e))?;
        let args = descriptor.bind(params).inspect_err(|e| info!("{}", e))?;

        let outcome = AssertUnwindSafe(descriptor.method.call(args))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(MethodError::Rpc(rpc_error))) if rpc_error.kind().passes_through_dispatch() => {
                info!("{}", rpc_error);
                Err(rpc_error)
            }
            Ok(Err(MethodError::Rpc(rpc_error))) => {
                Err(internal_failure(name, format!("{}: {:?}", rpc_error.name(), rpc_error)))
            }
            Ok(Err(MethodError::Failed(failure))) => {
                Err(internal_failure(name, format!("{:?}", failure)))
            }
            Err(panic) => Err(internal_failure(
                name,
                format!("panicked: {}", panic_message(panic.as_ref())),
            )),
        }
    }
}

fn internal_failure(method: &str, trace: String) -> RpcError {
    error!(method, "Error executing service method: {}", trace);
    RpcError::internal_error(Some("Error executing Service Method".to_string()))
        .with_data(Value::String(trace))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
