//! Persistence collaborators.
//!
//! Handlers never own their storage; they receive a shared
//! [`DocumentStore`] for records and a [`BlobStore`] for binary payloads at
//! construction time. Both must be safe for concurrent use, since every call
//! runs on its own task against the same handles.

mod blob;
mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::types::RecordId;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore, validate_blob_path};
pub use memory::MemoryStore;

/// A stored document: its primary key plus the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: RecordId,
    pub body: Value,
}

/// Document store keyed by store-assigned [`RecordId`]s.
///
/// Each operation is atomic on its own; there are no multi-document
/// transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return the id assigned to it.
    async fn insert(&self, collection: &str, body: Value) -> Result<RecordId>;

    /// Fetch one document. Fails with `NotFound` on a miss.
    async fn find_one(&self, collection: &str, id: &RecordId) -> Result<Document>;

    /// Replace a document's body wholesale. Fails with `NotFound` on a miss.
    async fn replace(&self, collection: &str, id: &RecordId, body: Value) -> Result<()>;

    /// Remove a document. Fails with `NotFound` on a miss.
    async fn delete(&self, collection: &str, id: &RecordId) -> Result<()>;

    /// Every document of a collection in insertion order.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>>;
}
