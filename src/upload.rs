//! Chunked upload reassembly.
//!
//! A `CreateBlog` stream starts with exactly one metadata item and continues
//! with raw image chunks. [`ChunkAssembler`] enforces that order and keeps
//! the reassembled image under a hard ceiling: a chunk that would push the
//! buffer past the limit resets the buffer and fails the upload, so nothing
//! oversized ever reaches storage.

use crate::types::BlogDraft;
use crate::{CourierError, Result};

/// Hard ceiling for a reassembled image (1 MiB).
pub const MAX_IMAGE_SIZE: usize = 1024 * 1024;

/// One item of an upload stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadItem {
    /// Blog metadata; must come first and only once.
    Metadata(BlogDraft),
    /// A raw image fragment.
    Chunk(Vec<u8>),
}

impl From<BlogDraft> for UploadItem {
    fn from(draft: BlogDraft) -> Self {
        UploadItem::Metadata(draft)
    }
}

/// A complete, size-checked upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledUpload {
    pub draft: BlogDraft,
    pub image: Vec<u8>,
}

#[derive(Debug)]
enum State {
    AwaitingMetadata,
    Receiving { draft: BlogDraft, buffer: Vec<u8> },
    Failed,
}

/// Reassembles an upload stream.
#[derive(Debug)]
pub struct ChunkAssembler {
    state: State,
    limit: usize,
    chunks: u64,
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkAssembler {
    /// Assembler with the standard [`MAX_IMAGE_SIZE`] ceiling.
    pub fn new() -> Self {
        Self::with_limit(MAX_IMAGE_SIZE)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            state: State::AwaitingMetadata,
            limit,
            chunks: 0,
        }
    }

    /// Bytes buffered so far.
    pub fn received(&self) -> usize {
        match &self.state {
            State::Receiving { buffer, .. } => buffer.len(),
            _ => 0,
        }
    }

    /// Chunks accepted so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Feed the next stream item.
    ///
    /// Any error leaves the assembler failed with its buffer released.
    pub fn push(&mut self, item: UploadItem) -> Result<()> {
        let state = std::mem::replace(&mut self.state, State::Failed);
        self.state = match (state, item) {
            (State::Failed, _) => {
                return Err(CourierError::UploadProtocol(
                    "upload already failed".to_string(),
                ));
            }
            (State::AwaitingMetadata, UploadItem::Metadata(draft)) => State::Receiving {
                draft,
                buffer: Vec::new(),
            },
            (State::AwaitingMetadata, UploadItem::Chunk(_)) => {
                return Err(CourierError::UploadProtocol(
                    "first item must carry blog metadata".to_string(),
                ));
            }
            (State::Receiving { .. }, UploadItem::Metadata(_)) => {
                return Err(CourierError::UploadProtocol(
                    "metadata sent twice".to_string(),
                ));
            }
            (State::Receiving { draft, mut buffer }, UploadItem::Chunk(chunk)) => {
                let received = buffer.len() + chunk.len();
                if received > self.limit {
                    return Err(CourierError::UploadTooLarge {
                        limit: self.limit,
                        received,
                    });
                }
                buffer.extend_from_slice(&chunk);
                self.chunks += 1;
                State::Receiving { draft, buffer }
            }
        };
        Ok(())
    }

    /// End-of-stream: hand back the metadata and the full image.
    pub fn finish(self) -> Result<AssembledUpload> {
        match self.state {
            State::Receiving { draft, buffer } => Ok(AssembledUpload {
                draft,
                image: buffer,
            }),
            State::AwaitingMetadata => Err(CourierError::UploadProtocol(
                "stream ended before blog metadata".to_string(),
            )),
            State::Failed => Err(CourierError::UploadProtocol(
                "upload already failed".to_string(),
            )),
        }
    }
}
