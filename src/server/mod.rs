//! gRPC server and shared proto types.
//!
//! This module provides:
//! - Protobuf messages and generated service stubs (`proto`) used by both server and client
//! - Type conversions between native and proto types (`convert`)
//! - The gRPC service implementations (`service`, server-only)
//! - Configuration types (`config`, server-only)
//! - Transport credentials (`tls`, server-only)

#[cfg(feature = "server")]
pub mod config;
pub mod convert;
pub mod proto;
#[cfg(feature = "server")]
pub mod service;
#[cfg(feature = "server")]
pub mod tls;

#[cfg(feature = "server")]
pub use service::{BlogServiceImpl, GreetServiceImpl};

#[cfg(feature = "server")]
mod serve {
    use std::future::Future;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::server::Router;
    use tonic::transport::{Server, ServerTlsConfig};
    use tracing::info;

    use super::config::Config;
    use super::proto::blog_service_server::BlogServiceServer;
    use super::proto::greet_service_server::GreetServiceServer;
    use super::service::{BlogServiceImpl, GreetServiceImpl};
    use crate::blog::BlogHandler;
    use crate::greet::GreetHandler;
    use crate::store::{BlobStore, DocumentStore};
    use crate::{CourierError, Result};

    /// Both services wired to their backends, ready to serve.
    pub struct CourierServer {
        greet: GreetServiceImpl,
        blog: BlogServiceImpl,
        max_concurrent_requests: usize,
        tls: Option<ServerTlsConfig>,
    }

    impl CourierServer {
        /// Wire services from configuration and injected storage backends.
        pub fn new(
            config: &Config,
            store: Arc<dyn DocumentStore>,
            blobs: Arc<dyn BlobStore>,
        ) -> Self {
            let policy = config.server.limits.call_policy();
            Self {
                greet: GreetServiceImpl::new(GreetHandler::new(config.greet_settings()), policy),
                blog: BlogServiceImpl::new(BlogHandler::new(store, blobs), policy),
                max_concurrent_requests: config.server.limits.max_concurrent_requests.max(1),
                tls: None,
            }
        }

        /// Serve TLS with the given credentials; `None` keeps plaintext.
        pub fn with_tls(mut self, tls: Option<ServerTlsConfig>) -> Self {
            self.tls = tls;
            self
        }

        fn router(self) -> Result<Router> {
            let mut builder =
                Server::builder().concurrency_limit_per_connection(self.max_concurrent_requests);
            if let Some(tls) = self.tls {
                builder = builder
                    .tls_config(tls)
                    .map_err(|e| CourierError::Configuration(format!("Invalid TLS config: {e}")))?;
            }
            Ok(builder
                .add_service(GreetServiceServer::new(self.greet))
                .add_service(BlogServiceServer::new(self.blog)))
        }

        /// Bind `addr` and serve until `signal` resolves.
        pub async fn serve_with_shutdown<F>(self, addr: SocketAddr, signal: F) -> Result<()>
        where
            F: Future<Output = ()>,
        {
            info!(%addr, "listening");
            self.router()?
                .serve_with_shutdown(addr, signal)
                .await
                .map_err(|e| CourierError::Transport(format!("server failed: {e}")))
        }

        /// Serve on an already bound listener until `signal` resolves.
        pub async fn serve_with_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
        where
            F: Future<Output = ()>,
        {
            if let Ok(addr) = listener.local_addr() {
                info!(%addr, "listening");
            }
            self.router()?
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal)
                .await
                .map_err(|e| CourierError::Transport(format!("server failed: {e}")))
        }
    }
}

#[cfg(feature = "server")]
pub use serve::CourierServer;
