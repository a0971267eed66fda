//! Blog records and their store representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RecordId;
use crate::store::Document;
use crate::{CourierError, Result};

/// A persisted blog post.
///
/// `id` is `None` until the store assigns one; once assigned it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlogRecord {
    pub id: Option<RecordId>,
    pub author_id: String,
    pub title: String,
    pub body: String,
    /// Logical path of the cover image inside blob storage.
    pub image_path: String,
}

/// The fields a client supplies when creating or replacing a post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlogDraft {
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub image_path: String,
}

impl BlogDraft {
    /// Attach a store-assigned id.
    pub fn into_record(self, id: RecordId) -> BlogRecord {
        BlogRecord {
            id: Some(id),
            author_id: self.author_id,
            title: self.title,
            body: self.body,
            image_path: self.image_path,
        }
    }

}

/// Stored body of a post: the client's fields plus the blob holding its image.
///
/// `image_blob` is unique to one record and never exposed on the wire, so two
/// posts naming the same `image_path` never share image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlog {
    #[serde(flatten)]
    pub draft: BlogDraft,
    pub image_blob: String,
}

impl StoredBlog {
    pub fn new(draft: BlogDraft, image_blob: String) -> Self {
        Self { draft, image_blob }
    }

    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a store document into its id and body.
    pub fn from_document(doc: Document) -> Result<(RecordId, Self)> {
        let stored: StoredBlog = serde_json::from_value(doc.body)?;
        Ok((doc.id, stored))
    }
}

impl BlogRecord {
    /// Split into id and draft. Fails if the record was never persisted.
    pub fn into_parts(self) -> Result<(RecordId, BlogDraft)> {
        let id = self
            .id
            .ok_or_else(|| CourierError::MalformedId(String::new()))?;
        let draft = BlogDraft {
            author_id: self.author_id,
            title: self.title,
            body: self.body,
            image_path: self.image_path,
        };
        Ok((id, draft))
    }
}

impl TryFrom<Document> for BlogRecord {
    type Error = CourierError;

    fn try_from(doc: Document) -> Result<Self> {
        let (id, stored) = StoredBlog::from_document(doc)?;
        Ok(stored.draft.into_record(id))
    }
}
