//! Courier - streaming gRPC greeting and blog service
//!
//! This crate implements two gRPC services covering every call shape:
//!
//! - `GreetService`: unary greetings and arithmetic, server-streamed greetings
//!   and prime factors, client-streamed greetings and averages, and a
//!   bidirectional greeting exchange.
//! - `BlogService`: create (chunked image upload with a 1 MiB ceiling), read,
//!   replace, delete and list blog posts against injected storage.
//!
//! Domain logic lives in transport-independent handlers ([`greet::GreetHandler`],
//! [`blog::BlogHandler`]); the [`server`] module adapts them to tonic and the
//! [`client`] module wraps the generated stubs. Every call carries a
//! [`call::CallContext`] deadline, and every failure maps to exactly one
//! [`ErrorKind`].
//!
//! # Client Example
//!
//! ```rust,no_run
//! use courier::{Greeting, client::CourierClient};
//!
//! #[tokio::main]
//! async fn main() -> courier::Result<()> {
//!     let client = CourierClient::connect("http://127.0.0.1:50051").await?;
//!
//!     let text = client.greet(Greeting::new("Jon", "Snow")).await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! # Server Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use courier::server::{CourierServer, config::Config};
//! use courier::store::{FsBlobStore, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> courier::Result<()> {
//!     let config = Config::default();
//!     let server = CourierServer::new(
//!         &config,
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(FsBlobStore::new(&config.storage.blob_root)),
//!     );
//!     let addr = "127.0.0.1:50051".parse().expect("valid address");
//!     server.serve_with_shutdown(addr, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await
//! }
//! ```

pub mod blog;
pub mod call;
#[cfg(feature = "client")]
pub mod client;
pub mod error;
pub mod greet;
pub mod server;
pub mod store;
pub mod stream;
pub mod telemetry;
pub mod types;
pub mod upload;
pub mod version;

// Re-export main types at crate root
pub use error::{CourierError, ErrorKind, Result};
pub use types::{BlogDraft, BlogRecord, Greeting, RecordId};
pub use version::{PKG_VERSION, version_string};
