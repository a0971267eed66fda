//! [`CourierClient`] — typed wrappers over the generated `GreetService` and
//! `BlogService` clients.
//!
//! All proto ↔ native type conversions are centralized in [`crate::server::convert`].
//! Failed calls come back as [`CourierError::Remote`] carrying the server's
//! status kind and message.
//!
//! # Bidirectional calls
//!
//! [`CourierClient::greet_everyone`] drives both directions at once: a
//! sender task feeds requests through a bounded channel while a receiver
//! task drains replies and fires a one-shot completion signal when the
//! server ends the stream. Neither side waits on the other, so the call
//! cannot deadlock however the server interleaves its answers.

use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt, stream};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

use crate::server::convert::blog_from_response;
use crate::server::proto;
use crate::server::proto::blog_service_client::BlogServiceClient;
use crate::server::proto::greet_service_client::GreetServiceClient;
use crate::stream::DEFAULT_STREAM_BUFFER;
use crate::upload::UploadItem;
use crate::{BlogDraft, BlogRecord, CourierError, Greeting, RecordId, Result};

/// Image bytes per `CreateBlog` chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Boxed stream of native items from a server-streaming call.
pub type ItemStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Build client TLS settings trusting the PEM CA bundle at `ca_cert`.
///
/// `domain` overrides the name checked against the server certificate.
pub async fn client_tls(ca_cert: &Path, domain: Option<&str>) -> Result<ClientTlsConfig> {
    let pem = tokio::fs::read(ca_cert).await.map_err(|e| {
        CourierError::Configuration(format!("Failed to read CA certificate {ca_cert:?}: {e}"))
    })?;
    let tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
    Ok(match domain {
        Some(domain) => tls.domain_name(domain),
        None => tls,
    })
}

/// A client for a remote courierd server.
#[derive(Clone)]
pub struct CourierClient {
    greet: GreetServiceClient<Channel>,
    blog: BlogServiceClient<Channel>,
    timeout: Option<Duration>,
}

impl CourierClient {
    /// Connect over a plaintext channel.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = CourierClient::connect("http://127.0.0.1:50051").await?;
    /// ```
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::connect_with_tls(addr, None).await
    }

    /// Connect with TLS when `tls` is given, plaintext otherwise.
    pub async fn connect_with_tls(
        addr: impl Into<String>,
        tls: Option<ClientTlsConfig>,
    ) -> Result<Self> {
        let addr = addr.into();
        let mut endpoint = Endpoint::from_shared(addr.clone())
            .map_err(|e| CourierError::Transport(format!("invalid address {addr}: {e}")))?;
        if let Some(tls) = tls {
            endpoint = endpoint
                .tls_config(tls)
                .map_err(|e| CourierError::Transport(format!("invalid TLS config: {e}")))?;
        }
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| CourierError::Transport(format!("failed to connect to {addr}: {e}")))?;
        Ok(Self::from_channel(channel))
    }

    /// Wrap an existing channel.
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            greet: GreetServiceClient::new(channel.clone()),
            blog: BlogServiceClient::new(channel),
            timeout: None,
        }
    }

    /// Send `timeout` as the deadline of every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        if let Some(timeout) = self.timeout {
            request.set_timeout(timeout);
        }
        request
    }

    // =========================================================================
    // GreetService
    // =========================================================================

    pub async fn greet(&self, greeting: Greeting) -> Result<String> {
        let response = self
            .greet
            .clone()
            .greet(self.request(proto::GreetRequest::from(greeting)))
            .await?;
        Ok(response.into_inner().text)
    }

    pub async fn sum(&self, a: i64, b: i64) -> Result<i64> {
        let response = self
            .greet
            .clone()
            .sum(self.request(proto::SumRequest { a, b }))
            .await?;
        Ok(response.into_inner().sum)
    }

    pub async fn greet_stream(&self, greeting: Greeting) -> Result<ItemStream<String>> {
        let response = self
            .greet
            .clone()
            .greet_stream(self.request(proto::GreetRequest::from(greeting)))
            .await?;
        let stream = response
            .into_inner()
            .map(|item| item.map(|m| m.text).map_err(CourierError::from));
        Ok(Box::pin(stream))
    }

    pub async fn factor_stream(&self, number: i64) -> Result<ItemStream<i64>> {
        let response = self
            .greet
            .clone()
            .factor_stream(self.request(proto::FactorRequest { number }))
            .await?;
        let stream = response
            .into_inner()
            .map(|item| item.map(|m| m.prime_factor).map_err(CourierError::from));
        Ok(Box::pin(stream))
    }

    pub async fn long_greet<S>(&self, greetings: S) -> Result<String>
    where
        S: Stream<Item = Greeting> + Send + 'static,
    {
        let outbound = greetings.map(proto::GreetRequest::from);
        let response = self.greet.clone().long_greet(self.request(outbound)).await?;
        Ok(response.into_inner().text)
    }

    pub async fn compute_average<S>(&self, numbers: S) -> Result<f64>
    where
        S: Stream<Item = i64> + Send + 'static,
    {
        let outbound = numbers.map(|number| proto::NumberRequest { number });
        let response = self
            .greet
            .clone()
            .compute_average(self.request(outbound))
            .await?;
        Ok(response.into_inner().average)
    }

    /// Send every greeting, `pace` apart, while collecting replies as they
    /// arrive. Returns the replies in arrival order.
    pub async fn greet_everyone(
        &self,
        greetings: Vec<Greeting>,
        pace: Duration,
    ) -> Result<Vec<String>> {
        let (tx, rx) = mpsc::channel::<proto::GreetRequest>(DEFAULT_STREAM_BUFFER);

        let sender = tokio::spawn(async move {
            for (i, greeting) in greetings.into_iter().enumerate() {
                if i > 0 && !pace.is_zero() {
                    tokio::time::sleep(pace).await;
                }
                debug!(first_name = %greeting.first_name, "sending greeting");
                if tx.send(greeting.into()).await.is_err() {
                    // Call is over; nothing left to deliver to.
                    break;
                }
            }
        });

        let response = match self
            .greet
            .clone()
            .greet_everyone(self.request(ReceiverStream::new(rx)))
            .await
        {
            Ok(response) => response,
            Err(status) => {
                sender.abort();
                let _ = sender.await;
                return Err(status.into());
            }
        };

        let mut replies = response.into_inner();
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            let mut received = Vec::new();
            let outcome = loop {
                match replies.message().await {
                    Ok(Some(reply)) => {
                        debug!(text = %reply.text, "received reply");
                        received.push(reply.text);
                    }
                    Ok(None) => break Ok(received),
                    Err(status) => break Err(CourierError::from(status)),
                }
            };
            let _ = done_tx.send(outcome);
        });

        let outcome = done_rx.await.map_err(|_| {
            CourierError::Stream("greet everyone receiver stopped without a result".to_string())
        })?;
        match outcome {
            Ok(replies) => {
                sender
                    .await
                    .map_err(|e| CourierError::Stream(format!("greet everyone sender failed: {e}")))?;
                Ok(replies)
            }
            Err(e) => {
                sender.abort();
                let _ = sender.await;
                Err(e)
            }
        }
    }

    pub async fn square_root(&self, number: i32) -> Result<f64> {
        let response = self
            .greet
            .clone()
            .square_root(self.request(proto::SquareRootRequest { number }))
            .await?;
        Ok(response.into_inner().root)
    }

    // =========================================================================
    // BlogService
    // =========================================================================

    /// Upload a post: metadata first, then `image` in [`DEFAULT_CHUNK_SIZE`] chunks.
    pub async fn create_blog(&self, draft: BlogDraft, image: Vec<u8>) -> Result<BlogRecord> {
        self.create_blog_chunked(draft, image, DEFAULT_CHUNK_SIZE)
            .await
    }

    pub async fn create_blog_chunked(
        &self,
        draft: BlogDraft,
        image: Vec<u8>,
        chunk_size: usize,
    ) -> Result<BlogRecord> {
        let chunk_size = chunk_size.max(1);
        let chunks = stream::unfold((image, 0usize), move |(image, offset)| async move {
            if offset >= image.len() {
                return None;
            }
            let end = (offset + chunk_size).min(image.len());
            let chunk = UploadItem::Chunk(image[offset..end].to_vec());
            Some((chunk, (image, end)))
        });
        let outbound = stream::once(async move { UploadItem::Metadata(draft) })
            .chain(chunks)
            .map(proto::CreateBlogRequest::from);

        let response = self.blog.clone().create_blog(self.request(outbound)).await?;
        blog_from_response(response.into_inner())
    }

    pub async fn read_blog(&self, id: &str) -> Result<BlogRecord> {
        let response = self
            .blog
            .clone()
            .read_blog(self.request(proto::ReadBlogRequest { id: id.to_string() }))
            .await?;
        blog_from_response(response.into_inner())
    }

    /// Replace a post. `image` replaces its cover when present.
    pub async fn update_blog(
        &self,
        record: BlogRecord,
        image: Option<Vec<u8>>,
    ) -> Result<BlogRecord> {
        let request = proto::UpdateBlogRequest {
            blog: Some(record.into()),
            image: image.unwrap_or_default(),
        };
        let response = self.blog.clone().update_blog(self.request(request)).await?;
        blog_from_response(response.into_inner())
    }

    pub async fn delete_blog(&self, id: &str) -> Result<RecordId> {
        let response = self
            .blog
            .clone()
            .delete_blog(self.request(proto::DeleteBlogRequest { id: id.to_string() }))
            .await?;
        response.into_inner().id.parse()
    }

    pub async fn list_blog(&self) -> Result<Vec<BlogRecord>> {
        let response = self
            .blog
            .clone()
            .list_blog(self.request(proto::ListBlogRequest {}))
            .await?;
        response
            .into_inner()
            .blogs
            .into_iter()
            .map(BlogRecord::try_from)
            .collect()
    }
}
