//! In-process document store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::{Document, DocumentStore};
use crate::types::RecordId;
use crate::{CourierError, Result};

#[derive(Debug, Default)]
struct Collection {
    order: Vec<RecordId>,
    docs: HashMap<RecordId, Value>,
}

/// [`DocumentStore`] held entirely in memory.
///
/// Used as the daemon's default store and as the test double for handlers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> Result<usize> {
        let collections = self.read()?;
        Ok(collections.get(collection).map_or(0, |c| c.docs.len()))
    }

    pub fn is_empty(&self, collection: &str) -> Result<bool> {
        Ok(self.len(collection)? == 0)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|e| CourierError::Store(format!("failed to acquire read lock: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|e| CourierError::Store(format!("failed to acquire write lock: {e}")))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, body: Value) -> Result<RecordId> {
        let id = RecordId::generate();
        let mut collections = self.write()?;
        let coll = collections.entry(collection.to_string()).or_default();
        coll.order.push(id.clone());
        coll.docs.insert(id.clone(), body);
        Ok(id)
    }

    async fn find_one(&self, collection: &str, id: &RecordId) -> Result<Document> {
        let collections = self.read()?;
        collections
            .get(collection)
            .and_then(|c| c.docs.get(id))
            .map(|body| Document {
                id: id.clone(),
                body: body.clone(),
            })
            .ok_or_else(|| CourierError::not_found(collection, id.as_str()))
    }

    async fn replace(&self, collection: &str, id: &RecordId, body: Value) -> Result<()> {
        let mut collections = self.write()?;
        match collections
            .get_mut(collection)
            .and_then(|c| c.docs.get_mut(id))
        {
            Some(existing) => {
                *existing = body;
                Ok(())
            }
            None => Err(CourierError::not_found(collection, id.as_str())),
        }
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<()> {
        let mut collections = self.write()?;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| CourierError::not_found(collection, id.as_str()))?;
        if coll.docs.remove(id).is_none() {
            return Err(CourierError::not_found(collection, id.as_str()));
        }
        coll.order.retain(|existing| existing != id);
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.read()?;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(coll
            .order
            .iter()
            .filter_map(|id| {
                coll.docs.get(id).map(|body| Document {
                    id: id.clone(),
                    body: body.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryStore::new();
        let id = store.insert("blog", json!({"title": "a"})).await.unwrap();
        let doc = store.find_one("blog", &id).await.unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.body["title"], "a");
    }

    #[tokio::test]
    async fn miss_is_not_found() {
        let store = MemoryStore::new();
        let id = RecordId::generate();
        let err = store.find_one("blog", &id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            store.replace("blog", &id, json!({})).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            store.delete("blog", &id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn replace_swaps_whole_body() {
        let store = MemoryStore::new();
        let id = store
            .insert("blog", json!({"title": "a", "body": "b"}))
            .await
            .unwrap();
        store.replace("blog", &id, json!({"title": "c"})).await.unwrap();
        let doc = store.find_one("blog", &id).await.unwrap();
        assert_eq!(doc.body, json!({"title": "c"}));
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order_after_delete() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for n in 0..4 {
            ids.push(store.insert("blog", json!({ "n": n })).await.unwrap());
        }
        store.delete("blog", &ids[1]).await.unwrap();

        let all = store.find_all("blog").await.unwrap();
        let order: Vec<i64> = all.iter().map(|d| d.body["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![0, 2, 3]);
        assert_eq!(store.len("blog").unwrap(), 3);
        assert!(store.find_all("other").await.unwrap().is_empty());
    }
}
