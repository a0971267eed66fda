//! Blog calls: chunked create plus read, replace, delete and list.
//!
//! A created post is persisted as two writes: the reassembled cover image
//! goes to the [`BlobStore`] first, then the metadata record goes to the
//! [`DocumentStore`]. If the record insert fails the image is left behind
//! as an orphan for out-of-band cleanup and the call fails as internal; no
//! record ever points at a missing image.
//!
//! Images are not stored at the client's `image_path`. Every write goes to a
//! fresh blob location (`<random id>/<file name>`) recorded on the document,
//! so a post's create, update or delete never touches another post's image.

use std::pin::pin;
use std::sync::Arc;

use futures_util::Stream;
use tracing::{info, warn};

use crate::call::CallContext;
use crate::store::{BlobStore, DocumentStore, validate_blob_path};
use crate::telemetry;
use crate::types::{BlogRecord, RecordId, StoredBlog};
use crate::upload::{ChunkAssembler, MAX_IMAGE_SIZE, UploadItem};
use crate::{CourierError, Result};

/// Collection holding blog records.
pub const BLOG_COLLECTION: &str = "blog";

/// A blob location no other record uses, keeping the file name of `image_path`.
fn fresh_image_blob(image_path: &str) -> Result<String> {
    let path = validate_blob_path(image_path)?;
    let file_name = path.file_name().ok_or_else(|| {
        CourierError::InvalidArgument(format!("image path {image_path:?} names no file"))
    })?;
    Ok(format!("{}/{}", RecordId::generate(), file_name.to_string_lossy()))
}

/// Domain logic for the blog service.
#[derive(Clone)]
pub struct BlogHandler {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    max_image_size: usize,
}

impl BlogHandler {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            blobs,
            max_image_size: MAX_IMAGE_SIZE,
        }
    }

    /// Override the image ceiling. Only lowering it is meaningful; the wire
    /// ceiling stays [`MAX_IMAGE_SIZE`].
    pub fn with_max_image_size(mut self, limit: usize) -> Self {
        self.max_image_size = limit.min(MAX_IMAGE_SIZE);
        self
    }

    /// Client stream: metadata first, then image chunks. Returns the
    /// inserted record with its assigned id.
    pub async fn create<S>(&self, ctx: &CallContext, inbound: S) -> Result<BlogRecord>
    where
        S: Stream<Item = Result<UploadItem>>,
    {
        let mut inbound = pin!(inbound);
        let mut assembler = ChunkAssembler::with_limit(self.max_image_size);
        while let Some(item) = ctx.recv(&mut inbound).await? {
            if let UploadItem::Metadata(draft) = &item {
                validate_blob_path(&draft.image_path)?;
            }
            assembler.push(item)?;
        }
        let chunks = assembler.chunks();
        let upload = assembler.finish()?;

        ctx.check()?;
        let size = upload.image.len();
        let image_blob = fresh_image_blob(&upload.draft.image_path)?;
        ctx.run(self.blobs.write(&image_blob, &upload.image)).await?;

        let stored = StoredBlog::new(upload.draft, image_blob);
        let id = match self.store.insert(BLOG_COLLECTION, stored.to_document()?).await {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    image_blob = %stored.image_blob,
                    error = %e,
                    "blog insert failed; image left orphaned"
                );
                return Err(CourierError::Store(format!("failed to insert blog: {e}")));
            }
        };

        metrics::counter!(telemetry::UPLOAD_BYTES_TOTAL).increment(size as u64);
        info!(%id, chunks, bytes = size, "blog created");
        Ok(stored.draft.into_record(id))
    }

    pub async fn read(&self, ctx: &CallContext, id: &str) -> Result<BlogRecord> {
        ctx.check()?;
        let id: RecordId = id.parse()?;
        let doc = self.store.find_one(BLOG_COLLECTION, &id).await?;
        BlogRecord::try_from(doc)
    }

    /// The cover image bytes of a post.
    pub async fn image(&self, ctx: &CallContext, id: &str) -> Result<Vec<u8>> {
        ctx.check()?;
        let id: RecordId = id.parse()?;
        let doc = self.store.find_one(BLOG_COLLECTION, &id).await?;
        let (_, stored) = StoredBlog::from_document(doc)?;
        ctx.run(self.blobs.read(&stored.image_blob)).await
    }

    /// Replace every field of an existing post. When `image` is present it
    /// is written to a new blob and the previous one is dropped once the
    /// record points at the new one; otherwise the post keeps its image.
    pub async fn update(
        &self,
        ctx: &CallContext,
        record: BlogRecord,
        image: Option<Vec<u8>>,
    ) -> Result<BlogRecord> {
        ctx.check()?;
        let (id, draft) = record.into_parts()?;
        validate_blob_path(&draft.image_path)?;
        if let Some(image) = &image {
            if image.len() > self.max_image_size {
                return Err(CourierError::UploadTooLarge {
                    limit: self.max_image_size,
                    received: image.len(),
                });
            }
        }

        // Existence check before touching blob storage.
        let doc = self.store.find_one(BLOG_COLLECTION, &id).await?;
        let (_, current) = StoredBlog::from_document(doc)?;

        let image_blob = match &image {
            Some(image) => {
                let location = fresh_image_blob(&draft.image_path)?;
                ctx.run(self.blobs.write(&location, image)).await?;
                location
            }
            None => current.image_blob.clone(),
        };
        let replaced = StoredBlog::new(draft, image_blob);
        let replace = match replaced.to_document() {
            Ok(doc) => self.store.replace(BLOG_COLLECTION, &id, doc).await,
            Err(e) => Err(e),
        };

        if image.is_some() {
            // Whichever blob the record does not point at is unreachable.
            let unused = if replace.is_ok() {
                &current.image_blob
            } else {
                &replaced.image_blob
            };
            self.discard_image(&id, unused).await;
        }
        replace?;

        info!(%id, image_replaced = image.is_some(), "blog updated");
        Ok(replaced.draft.into_record(id))
    }

    /// Delete a post, then its image. Image removal is best-effort.
    pub async fn delete(&self, ctx: &CallContext, id: &str) -> Result<RecordId> {
        ctx.check()?;
        let id: RecordId = id.parse()?;
        let doc = self.store.find_one(BLOG_COLLECTION, &id).await?;
        let (_, stored) = StoredBlog::from_document(doc)?;
        self.store.delete(BLOG_COLLECTION, &id).await?;

        self.discard_image(&id, &stored.image_blob).await;
        info!(%id, "blog deleted");
        Ok(id)
    }

    pub async fn list(&self, ctx: &CallContext) -> Result<Vec<BlogRecord>> {
        ctx.check()?;
        self.store
            .find_all(BLOG_COLLECTION)
            .await?
            .into_iter()
            .map(BlogRecord::try_from)
            .collect()
    }

    async fn discard_image(&self, id: &RecordId, image_blob: &str) {
        if let Err(e) = self.blobs.remove(image_blob).await {
            warn!(%id, image_blob, error = %e, "failed to remove blog image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::store::{MemoryBlobStore, MemoryStore};
    use crate::types::BlogDraft;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures_util::StreamExt;
    use futures_util::stream::{self, iter};
    use serde_json::Value;

    fn draft() -> BlogDraft {
        BlogDraft {
            author_id: "1001".into(),
            title: "Introduction to gRPC".into(),
            body: "In this section we will be looking at the minutiae of gRPC".into(),
            image_path: "covers/cyber_pirate.jpg".into(),
        }
    }

    fn upload(chunks: Vec<Vec<u8>>) -> Vec<Result<UploadItem>> {
        std::iter::once(Ok(UploadItem::Metadata(draft())))
            .chain(chunks.into_iter().map(|c| Ok(UploadItem::Chunk(c))))
            .collect()
    }

    fn handler() -> (BlogHandler, Arc<MemoryStore>, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        (BlogHandler::new(store.clone(), blobs.clone()), store, blobs)
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let (handler, _, blobs) = handler();
        let ctx = CallContext::unbounded();
        let created = handler
            .create(&ctx, iter(upload(vec![b"abc".to_vec(), b"def".to_vec()])))
            .await
            .unwrap();
        let id = created.id.clone().unwrap();

        let read = handler.read(&ctx, id.as_str()).await.unwrap();
        assert_eq!(read, created);
        assert_eq!(read.title, "Introduction to gRPC");
        assert_eq!(handler.image(&ctx, id.as_str()).await.unwrap(), b"abcdef");
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn oversized_upload_persists_nothing() {
        let (handler, store, blobs) = handler();
        let handler = handler.with_max_image_size(8);
        let err = handler
            .create(
                &CallContext::unbounded(),
                iter(upload(vec![vec![0; 4], vec![0; 4], vec![0; 1]])),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
        assert!(store.is_empty(BLOG_COLLECTION).unwrap());
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn traversal_path_is_rejected_before_upload() {
        let (handler, _, blobs) = handler();
        let mut bad = draft();
        bad.image_path = "../../etc/cron.d/x".into();
        let items = vec![Ok(UploadItem::Metadata(bad)), Ok(UploadItem::Chunk(vec![1]))];
        let err = handler
            .create(&CallContext::unbounded(), iter(items))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn read_unknown_and_malformed_ids() {
        let (handler, _, _) = handler();
        let ctx = CallContext::unbounded();
        let err = handler
            .read(&ctx, RecordId::generate().as_str())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = handler.read(&ctx, "not-an-id").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn update_replaces_all_fields_and_image() {
        let (handler, _, blobs) = handler();
        let ctx = CallContext::unbounded();
        let created = handler
            .create(&ctx, iter(upload(vec![b"old".to_vec()])))
            .await
            .unwrap();

        let replacement = BlogRecord {
            id: created.id.clone(),
            author_id: "2002".into(),
            title: "This is a new title".into(),
            body: "And the body is not as long as before".into(),
            image_path: "covers/mojave.jpg".into(),
        };
        let updated = handler
            .update(&ctx, replacement.clone(), Some(b"new".to_vec()))
            .await
            .unwrap();
        assert_eq!(updated, replacement);

        let id = created.id.unwrap();
        let read = handler.read(&ctx, id.as_str()).await.unwrap();
        assert_eq!(read, replacement);
        assert_eq!(handler.image(&ctx, id.as_str()).await.unwrap(), b"new");
        // The previous image is gone.
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn update_without_image_keeps_current_image_under_new_path() {
        let (handler, _, blobs) = handler();
        let ctx = CallContext::unbounded();
        let created = handler
            .create(&ctx, iter(upload(vec![b"cover".to_vec()])))
            .await
            .unwrap();

        let mut moved = created.clone();
        moved.image_path = "covers/renamed.jpg".into();
        let updated = handler.update(&ctx, moved, None).await.unwrap();
        assert_eq!(updated.image_path, "covers/renamed.jpg");

        let id = created.id.unwrap();
        assert_eq!(handler.image(&ctx, id.as_str()).await.unwrap(), b"cover");
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn posts_sharing_an_image_path_keep_their_own_images() {
        let (handler, _, blobs) = handler();
        let ctx = CallContext::unbounded();
        let shared = |bytes: &[u8]| -> Vec<Result<UploadItem>> {
            let mut d = draft();
            d.image_path = "covers/shared.jpg".into();
            vec![Ok(UploadItem::Metadata(d)), Ok(UploadItem::Chunk(bytes.to_vec()))]
        };

        let a = handler.create(&ctx, iter(shared(b"AAAA"))).await.unwrap();
        let b = handler.create(&ctx, iter(shared(b"BBBB"))).await.unwrap();
        let a = a.id.unwrap();
        let b = b.id.unwrap();
        assert_eq!(handler.image(&ctx, a.as_str()).await.unwrap(), b"AAAA");
        assert_eq!(handler.image(&ctx, b.as_str()).await.unwrap(), b"BBBB");

        handler.delete(&ctx, a.as_str()).await.unwrap();
        let survivor = handler.read(&ctx, b.as_str()).await.unwrap();
        assert_eq!(survivor.image_path, "covers/shared.jpg");
        assert_eq!(handler.image(&ctx, b.as_str()).await.unwrap(), b"BBBB");
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_upload_hits_deadline_and_persists_nothing() {
        let (handler, store, blobs) = handler();
        let ctx = CallContext::with_timeout(Duration::from_millis(250));
        let stalled = iter(upload(vec![b"partial".to_vec()])).chain(stream::pending());

        let err = handler.create(&ctx, stalled).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        assert!(store.is_empty(BLOG_COLLECTION).unwrap());
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_record_touches_no_blob() {
        let (handler, _, blobs) = handler();
        let mut record = draft().into_record(RecordId::generate());
        record.image_path = "covers/ghost.jpg".into();
        let err = handler
            .update(&CallContext::unbounded(), record, Some(vec![1, 2, 3]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_record_and_image() {
        let (handler, _, blobs) = handler();
        let ctx = CallContext::unbounded();
        let created = handler
            .create(&ctx, iter(upload(vec![b"img".to_vec()])))
            .await
            .unwrap();
        let id = created.id.unwrap();

        assert_eq!(handler.delete(&ctx, id.as_str()).await.unwrap(), id);
        assert!(blobs.is_empty());
        let err = handler.read(&ctx, id.as_str()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list_returns_posts_in_creation_order() {
        let (handler, _, _) = handler();
        let ctx = CallContext::unbounded();
        for title in ["one", "two", "three"] {
            let mut d = draft();
            d.title = title.into();
            d.image_path = format!("covers/{title}.jpg");
            handler
                .create(&ctx, iter(vec![Ok(UploadItem::Metadata(d))]))
                .await
                .unwrap();
        }
        let titles: Vec<String> = handler
            .list(&ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    struct RejectingStore;

    #[async_trait]
    impl DocumentStore for RejectingStore {
        async fn insert(&self, _: &str, _: Value) -> Result<RecordId> {
            Err(CourierError::Store("write concern failed".into()))
        }
        async fn find_one(&self, collection: &str, id: &RecordId) -> Result<crate::store::Document> {
            Err(CourierError::not_found(collection, id.as_str()))
        }
        async fn replace(&self, _: &str, _: &RecordId, _: Value) -> Result<()> {
            Err(CourierError::Store("unavailable".into()))
        }
        async fn delete(&self, _: &str, _: &RecordId) -> Result<()> {
            Err(CourierError::Store("unavailable".into()))
        }
        async fn find_all(&self, _: &str) -> Result<Vec<crate::store::Document>> {
            Err(CourierError::Store("unavailable".into()))
        }
    }

    #[tokio::test]
    async fn failed_insert_is_internal_and_leaves_orphan_blob() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let handler = BlogHandler::new(Arc::new(RejectingStore), blobs.clone());
        let err = handler
            .create(&CallContext::unbounded(), iter(upload(vec![b"x".to_vec()])))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(blobs.len(), 1);
    }
}
