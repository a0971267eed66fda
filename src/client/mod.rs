//! Client library for connecting to courierd.
//!
//! Provides [`CourierClient`], with one typed method per RPC of both
//! services, plus [`client_tls`] for building TLS channel settings.

mod service_client;

pub use service_client::{CourierClient, DEFAULT_CHUNK_SIZE, ItemStream, client_tls};
