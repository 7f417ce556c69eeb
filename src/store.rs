use crate::storage::{empty_tree, load_tree, persist_tree};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 64;
const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid path '{0}'")]
    InvalidPath(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("malformed document: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("failed to persist store: {0}")]
    Persist(#[from] std::io::Error),
}

/// An error aborts the transaction without writing anything.
pub type TransactionFn = Box<dyn FnOnce(Value) -> Result<Value, StoreError> + Send>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Current value at `path`, `Value::Null` when nothing is stored there.
    async fn get(&self, path: &str) -> Result<Value, StoreError>;

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Stores `value` under a freshly generated child key and returns the key.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Atomic read-modify-write of the subtree at `path`; returns the committed value.
    async fn transaction(&self, path: &str, apply: TransactionFn) -> Result<Value, StoreError>;
}

/// First `next` yields the current value, later calls wait for a change.
pub struct Subscription {
    segments: Vec<String>,
    receiver: broadcast::Receiver<Arc<Value>>,
    pending: Option<Value>,
    last: Value,
}

impl Subscription {
    pub async fn next(&mut self) -> Option<Value> {
        if let Some(value) = self.pending.take() {
            return Some(value);
        }
        loop {
            match self.receiver.recv().await {
                Ok(root) => {
                    let value = value_at(&root, &self.segments).cloned().unwrap_or(Value::Null);
                    if value != self.last {
                        self.last = value.clone();
                        return Some(value);
                    }
                }
                // Later messages carry the whole tree, so skipped ones are not needed.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("subscription lagged by {skipped} snapshots");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// In-process store, optionally mirrored to a JSON file after every commit.
pub struct MemoryStore {
    root: Mutex<Value>,
    data_path: Option<PathBuf>,
    changes: broadcast::Sender<Arc<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_tree(empty_tree(), None)
    }

    pub async fn open(data_path: PathBuf) -> Self {
        let tree = load_tree(&data_path).await;
        Self::with_tree(tree, Some(data_path))
    }

    fn with_tree(tree: Value, data_path: Option<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            root: Mutex::new(tree),
            data_path,
            changes,
        }
    }

    /// Writing `null` removes a node; emptied parents are pruned.
    async fn commit(&self, root: &mut Value, mut next: Value) -> Result<(), StoreError> {
        prune(&mut next);
        if !next.is_object() {
            next = empty_tree();
        }
        if let Some(path) = &self.data_path {
            persist_tree(path, &next).await?;
        }
        *root = next;
        if self.changes.receiver_count() > 0 {
            let _ = self.changes.send(Arc::new(root.clone()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Value, StoreError> {
        let segments = parse_path(path)?;
        let root = self.root.lock().await;
        Ok(value_at(&root, &segments).cloned().unwrap_or(Value::Null))
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let segments = parse_path(path)?;
        let root = self.root.lock().await;
        let receiver = self.changes.subscribe();
        let current = value_at(&root, &segments).cloned().unwrap_or(Value::Null);
        Ok(Subscription {
            segments,
            receiver,
            pending: Some(current.clone()),
            last: current,
        })
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = parse_path(path)?;
        let mut root = self.root.lock().await;
        let mut next = root.clone();
        write_at(&mut next, &segments, value);
        self.commit(&mut root, next).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let mut segments = parse_path(path)?;
        let key = Uuid::new_v4().to_string();
        segments.push(key.clone());

        let mut root = self.root.lock().await;
        let mut next = root.clone();
        write_at(&mut next, &segments, value);
        self.commit(&mut root, next).await?;
        Ok(key)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.set(path, Value::Null).await
    }

    async fn transaction(&self, path: &str, apply: TransactionFn) -> Result<Value, StoreError> {
        let segments = parse_path(path)?;
        let mut root = self.root.lock().await;
        let current = value_at(&root, &segments).cloned().unwrap_or(Value::Null);
        let updated = apply(current)?;

        let mut next = root.clone();
        write_at(&mut next, &segments, updated);
        self.commit(&mut root, next).await?;
        Ok(value_at(&root, &segments).cloned().unwrap_or(Value::Null))
    }
}

pub fn parse_path(path: &str) -> Result<Vec<String>, StoreError> {
    let mut segments = Vec::new();
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        if segment.contains(FORBIDDEN_KEY_CHARS) || segment.chars().any(char::is_control) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        segments.push(segment.to_string());
    }
    Ok(segments)
}

fn value_at<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn write_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            if value.is_null() {
                return;
            }
            *node = Value::Object(Map::new());
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        if value.is_null() {
            map.remove(last);
        } else {
            map.insert(last.clone(), value);
        }
    }
}

/// Drops null children and objects left empty, bottom-up.
fn prune(value: &mut Value) {
    if let Value::Object(map) = value {
        for child in map.values_mut() {
            prune(child);
        }
        map.retain(|_, child| match child {
            Value::Null => false,
            Value::Object(inner) => !inner.is_empty(),
            _ => true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn set_creates_intermediate_nodes() {
        let store = MemoryStore::new();
        store
            .set("users/u1/days/2026-03-01/prayers/Fajr", json!(true))
            .await
            .unwrap();

        let day = store.get("users/u1/days/2026-03-01").await.unwrap();
        assert_eq!(day, json!({ "prayers": { "Fajr": true } }));
        assert_eq!(store.get("users/u2").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn removing_last_child_prunes_parent() {
        let store = MemoryStore::new();
        let id = store
            .push("users/u1/days/2026-03-01/deeds", json!({ "points": 5 }))
            .await
            .unwrap();
        store.set("users/u1/days/2026-03-01/score", json!(5)).await.unwrap();

        store
            .remove(&format!("users/u1/days/2026-03-01/deeds/{id}"))
            .await
            .unwrap();
        let day = store.get("users/u1/days/2026-03-01").await.unwrap();
        assert_eq!(day, json!({ "score": 5 }));
    }

    #[tokio::test]
    async fn aborted_transaction_writes_nothing() {
        let store = MemoryStore::new();
        store.set("users/u1/ramadanTotals/score", json!(10)).await.unwrap();

        let result = store
            .transaction(
                "users/u1",
                Box::new(|_| Err(StoreError::NotFound("deed".to_string()))),
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(store.get("users/u1/ramadanTotals/score").await.unwrap(), json!(10));
    }

    #[tokio::test]
    async fn concurrent_transactions_do_not_lose_increments() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .transaction(
                        "counter",
                        Box::new(|current| Ok(json!(current.as_i64().unwrap_or(0) + 1))),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get("counter").await.unwrap(), json!(20));
    }

    #[tokio::test]
    async fn subscription_yields_current_then_changes() {
        let store = MemoryStore::new();
        store.set("users/u1/ramadanTotals/score", json!(10)).await.unwrap();
        let mut sub = store.subscribe("users/u1/ramadanTotals").await.unwrap();

        assert_eq!(sub.next().await, Some(json!({ "score": 10 })));

        // unrelated writes do not wake the subscriber
        store.set("users/u2/ramadanTotals/score", json!(1)).await.unwrap();
        store.set("users/u1/ramadanTotals/score", json!(20)).await.unwrap();

        let next = timeout(Duration::from_secs(1), sub.next()).await.unwrap();
        assert_eq!(next, Some(json!({ "score": 20 })));
    }

    #[test]
    fn paths_reject_reserved_characters() {
        assert!(parse_path("users/u1/days").is_ok());
        assert_eq!(parse_path("/users//u1/").unwrap(), vec!["users", "u1"]);
        assert!(matches!(parse_path("users/a.b"), Err(StoreError::InvalidPath(_))));
        assert!(matches!(parse_path("users/$x"), Err(StoreError::InvalidPath(_))));
    }
}
