//! Public types for the Courier API.

mod blog;
mod greeting;
mod record_id;

pub use blog::{BlogDraft, BlogRecord, StoredBlog};
pub use greeting::Greeting;
pub use record_id::RecordId;
