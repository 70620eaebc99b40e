//! Service methods exposed by the data server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use bobo_json_rpc::{MethodError, MethodRegistry, RegistryError, RpcError, ServiceMethod};

use crate::store::EntityStore;

/// `data(key_name)`: the stored entity, or `null` when there is none.
pub struct DataMethod {
    store: Arc<EntityStore>,
}

#[async_trait]
impl ServiceMethod for DataMethod {
    async fn call(&self, args: Vec<Value>) -> Result<Value, MethodError> {
        let key_name = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("key_name must be a string"))?;
        debug!(key_name, "Looking up entity");

        match self.store.get(key_name).await {
            Some(entity) => Ok(serde_json::to_value(entity).map_err(anyhow::Error::from)?),
            None => Ok(Value::Null),
        }
    }
}

/// Allow-list for the data server
pub fn registry(store: Arc<EntityStore>) -> Result<MethodRegistry, RegistryError> {
    let mut registry = MethodRegistry::new();
    registry.expose("data", &["key_name"], DataMethod { store })?;
    registry.expose_fn("echo", &["text"], |args: Vec<Value>| async move {
        Ok::<_, MethodError>(args.into_iter().next().unwrap_or(Value::Null))
    })?;
    Ok(registry)
}
