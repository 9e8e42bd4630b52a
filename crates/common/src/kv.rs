//! Process-wide key-value persistence offered to plugins.
//!
//! Values are arbitrary JSON. A `put` overwrites the previous value for the
//! key entirely; there is no merge or versioning.

use std::{collections::HashMap, path::PathBuf};

use {
    async_trait::async_trait,
    serde_json::{Map, Value},
    tokio::sync::RwLock,
    tracing::{debug, warn},
};

use crate::error::Result;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read `key`, returning `default` when it has never been written.
    async fn get(&self, key: &str, default: Value) -> Result<Value>;

    /// Replace the value stored under `key`.
    async fn put(&self, key: &str, value: Value) -> Result<()>;
}

/// Volatile store, for tests and hosts without a data directory.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.entries.read().await.get(key).cloned().unwrap_or(default))
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON file-backed store. The whole map is rewritten on every `put`.
pub struct JsonFileKvStore {
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl JsonFileKvStore {
    /// Load the store from disk, or start empty if the file does not exist.
    ///
    /// A file that is not a JSON object is logged and treated as empty; it is
    /// overwritten on the next `put`.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(data) => match serde_json::from_str::<Value>(&data) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(path = %path.display(), "kv store file is not a JSON object, starting empty");
                    Map::new()
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "kv store loaded");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn save(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.entries.read().await.get(key).cloned().unwrap_or(default))
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        self.save(&entries).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn memory_store_returns_default_for_missing_key() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("missing", json!([])).await.unwrap(), json!([]));
        store.put("k", json!(true)).await.unwrap();
        assert_eq!(store.get("k", json!(false)).await.unwrap(), json!(true));
    }

    #[tokio::test]
    async fn put_overwrites_whole_value() {
        let store = MemoryKvStore::new();
        store.put("list", json!(["a", "b"])).await.unwrap();
        store.put("list", json!(["c"])).await.unwrap();
        assert_eq!(store.get("list", json!([])).await.unwrap(), json!(["c"]));
    }

    #[tokio::test]
    async fn file_store_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data/kv.json");

        let store = JsonFileKvStore::load(path.clone()).await.unwrap();
        store.put("groups", json!(["111", "222"])).await.unwrap();
        store.put("enabled", json!(false)).await.unwrap();
        drop(store);

        let reloaded = JsonFileKvStore::load(path).await.unwrap();
        assert_eq!(
            reloaded.get("groups", json!([])).await.unwrap(),
            json!(["111", "222"])
        );
        assert_eq!(reloaded.get("enabled", json!(true)).await.unwrap(), json!(false));
    }

    #[tokio::test]
    async fn file_store_ignores_corrupt_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("kv.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileKvStore::load(path.clone()).await.unwrap();
        assert_eq!(store.get("k", json!(1)).await.unwrap(), json!(1));
        store.put("k", json!(2)).await.unwrap();

        let content: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content, json!({"k": 2}));
    }
}
