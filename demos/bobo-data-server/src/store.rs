//! In-memory entity store backing the `data` service method.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A stored entity, addressed by its key name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoboData {
    pub string: String,
}

#[derive(Debug, Default)]
pub struct EntityStore {
    entities: RwLock<HashMap<String, BoboData>>,
}

impl EntityStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the `foobar` entity
    pub fn seeded() -> Self {
        let entities = HashMap::from([(
            "foobar".to_string(),
            BoboData {
                string: "foobar".to_string(),
            },
        )]);
        Self {
            entities: RwLock::new(entities),
        }
    }

    pub async fn get(&self, key_name: &str) -> Option<BoboData> {
        self.entities.read().await.get(key_name).cloned()
    }

    #[cfg(test)]
    pub async fn put(&self, key_name: impl Into<String>, data: BoboData) {
        self.entities.write().await.insert(key_name.into(), data);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_store() {
        let store = EntityStore::seeded();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("foobar").await,
            Some(BoboData {
                string: "foobar".to_string()
            })
        );
        assert_eq!(store.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = EntityStore::new();
        store.put("k", BoboData { string: "a".into() }).await;
        store.put("k", BoboData { string: "b".into() }).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("k").await.unwrap().string, "b");
    }
}
