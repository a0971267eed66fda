//! gRPC service implementations.
//!
//! Each service owns its domain handler and the [`CallPolicy`] used to turn
//! request metadata into a per-call deadline. Conversions go through
//! [`convert`](super::convert); errors leave as `tonic::Status` via
//! `From<CourierError>`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tonic::{Request, Response, Status, Streaming};
use tracing::debug;

use crate::blog::BlogHandler;
use crate::call::CallPolicy;
use crate::greet::GreetHandler;
use crate::stream::{self, DEFAULT_STREAM_BUFFER, ResponseStream};
use crate::types::{BlogRecord, Greeting};
use crate::upload::UploadItem;
use crate::{CourierError, Result, telemetry};

use super::convert::inbound;
use super::proto;
use super::proto::blog_service_server::BlogService;
use super::proto::greet_service_server::GreetService;

type RpcResult<T> = std::result::Result<Response<T>, Status>;

/// Run a non-streaming call, recording its outcome.
async fn observe<T, F>(method: &'static str, call: F) -> std::result::Result<T, Status>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = call.await;
    telemetry::record_call(method, start, result.as_ref().err().map(CourierError::kind));
    result.map_err(|e| {
        debug!(method, error = %e, "call failed");
        Status::from(e)
    })
}

// =============================================================================
// GreetService
// =============================================================================

/// `courier.v1.GreetService` backed by a [`GreetHandler`].
#[derive(Clone)]
pub struct GreetServiceImpl {
    handler: Arc<GreetHandler>,
    policy: CallPolicy,
    buffer: usize,
}

impl GreetServiceImpl {
    pub fn new(handler: GreetHandler, policy: CallPolicy) -> Self {
        Self {
            handler: Arc::new(handler),
            policy,
            buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Set how many streamed responses may queue ahead of the transport.
    pub fn with_stream_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

#[tonic::async_trait]
impl GreetService for GreetServiceImpl {
    async fn greet(&self, request: Request<proto::GreetRequest>) -> RpcResult<proto::GreetResponse> {
        let ctx = self.policy.context(request.metadata());
        let text = observe("Greet", async {
            let greeting = Greeting::try_from(request.into_inner())?;
            self.handler.greet(&ctx, &greeting)
        })
        .await?;
        Ok(Response::new(proto::GreetResponse { text }))
    }

    async fn sum(&self, request: Request<proto::SumRequest>) -> RpcResult<proto::SumResponse> {
        let ctx = self.policy.context(request.metadata());
        let proto::SumRequest { a, b } = request.into_inner();
        let sum = observe("Sum", self.handler.sum(&ctx, a, b)).await?;
        Ok(Response::new(proto::SumResponse { sum }))
    }

    type GreetStreamStream = ResponseStream<proto::GreetResponse>;

    async fn greet_stream(
        &self,
        request: Request<proto::GreetRequest>,
    ) -> RpcResult<Self::GreetStreamStream> {
        let ctx = self.policy.context(request.metadata());
        let request = request.into_inner();
        let handler = Arc::clone(&self.handler);

        let items = stream::spawn_producer("GreetStream", self.buffer, move |mut out| async move {
            let greeting = Greeting::try_from(request)?;
            handler.greet_stream(&ctx, &greeting, &mut out).await
        });
        Ok(Response::new(stream::into_response(items, |text| {
            proto::GreetResponse { text }
        })))
    }

    type FactorStreamStream = ResponseStream<proto::FactorResponse>;

    async fn factor_stream(
        &self,
        request: Request<proto::FactorRequest>,
    ) -> RpcResult<Self::FactorStreamStream> {
        let ctx = self.policy.context(request.metadata());
        let number = request.into_inner().number;
        let handler = Arc::clone(&self.handler);

        let items = stream::spawn_producer("FactorStream", self.buffer, move |mut out| async move {
            handler.factor_stream(&ctx, number, &mut out).await
        });
        Ok(Response::new(stream::into_response(items, |prime_factor| {
            proto::FactorResponse { prime_factor }
        })))
    }

    async fn long_greet(
        &self,
        request: Request<Streaming<proto::GreetRequest>>,
    ) -> RpcResult<proto::GreetResponse> {
        let ctx = self.policy.context(request.metadata());
        let greetings = inbound::<_, _, Greeting>("LongGreet", request.into_inner());
        let text = observe("LongGreet", self.handler.long_greet(&ctx, greetings)).await?;
        Ok(Response::new(proto::GreetResponse { text }))
    }

    async fn compute_average(
        &self,
        request: Request<Streaming<proto::NumberRequest>>,
    ) -> RpcResult<proto::AverageResponse> {
        let ctx = self.policy.context(request.metadata());
        let numbers = inbound::<_, _, i64>("ComputeAverage", request.into_inner());
        let average = observe("ComputeAverage", self.handler.compute_average(&ctx, numbers)).await?;
        Ok(Response::new(proto::AverageResponse { average }))
    }

    type GreetEveryoneStream = ResponseStream<proto::GreetResponse>;

    async fn greet_everyone(
        &self,
        request: Request<Streaming<proto::GreetRequest>>,
    ) -> RpcResult<Self::GreetEveryoneStream> {
        let ctx = self.policy.context(request.metadata());
        let greetings = inbound::<_, _, Greeting>("GreetEveryone", request.into_inner());
        let handler = Arc::clone(&self.handler);

        let items = stream::spawn_producer("GreetEveryone", self.buffer, move |mut out| async move {
            handler.greet_everyone(&ctx, greetings, &mut out).await
        });
        Ok(Response::new(stream::into_response(items, |text| {
            proto::GreetResponse { text }
        })))
    }

    async fn square_root(
        &self,
        request: Request<proto::SquareRootRequest>,
    ) -> RpcResult<proto::SquareRootResponse> {
        let ctx = self.policy.context(request.metadata());
        let number = request.into_inner().number;
        let root = observe("SquareRoot", async { self.handler.square_root(&ctx, number) }).await?;
        Ok(Response::new(proto::SquareRootResponse { root }))
    }
}

// =============================================================================
// BlogService
// =============================================================================

/// `courier.v1.BlogService` backed by a [`BlogHandler`].
#[derive(Clone)]
pub struct BlogServiceImpl {
    handler: Arc<BlogHandler>,
    policy: CallPolicy,
}

impl BlogServiceImpl {
    pub fn new(handler: BlogHandler, policy: CallPolicy) -> Self {
        Self {
            handler: Arc::new(handler),
            policy,
        }
    }
}

#[tonic::async_trait]
impl BlogService for BlogServiceImpl {
    async fn create_blog(
        &self,
        request: Request<Streaming<proto::CreateBlogRequest>>,
    ) -> RpcResult<proto::BlogResponse> {
        let ctx = self.policy.context(request.metadata());
        let items = inbound::<_, _, UploadItem>("CreateBlog", request.into_inner());
        let record = observe("CreateBlog", self.handler.create(&ctx, items)).await?;
        Ok(Response::new(record.into()))
    }

    async fn read_blog(
        &self,
        request: Request<proto::ReadBlogRequest>,
    ) -> RpcResult<proto::BlogResponse> {
        let ctx = self.policy.context(request.metadata());
        let id = request.into_inner().id;
        let record = observe("ReadBlog", self.handler.read(&ctx, &id)).await?;
        Ok(Response::new(record.into()))
    }

    async fn update_blog(
        &self,
        request: Request<proto::UpdateBlogRequest>,
    ) -> RpcResult<proto::BlogResponse> {
        let ctx = self.policy.context(request.metadata());
        let proto::UpdateBlogRequest { blog, image } = request.into_inner();
        let record = observe("UpdateBlog", async {
            let blog = blog
                .ok_or_else(|| CourierError::InvalidArgument("blog is required".to_string()))?;
            let record = BlogRecord::try_from(blog)?;
            let image = (!image.is_empty()).then_some(image);
            self.handler.update(&ctx, record, image).await
        })
        .await?;
        Ok(Response::new(record.into()))
    }

    async fn delete_blog(
        &self,
        request: Request<proto::DeleteBlogRequest>,
    ) -> RpcResult<proto::DeleteBlogResponse> {
        let ctx = self.policy.context(request.metadata());
        let id = request.into_inner().id;
        let id = observe("DeleteBlog", self.handler.delete(&ctx, &id)).await?;
        Ok(Response::new(proto::DeleteBlogResponse { id: id.into() }))
    }

    async fn list_blog(
        &self,
        request: Request<proto::ListBlogRequest>,
    ) -> RpcResult<proto::ListBlogResponse> {
        let ctx = self.policy.context(request.metadata());
        let records = observe("ListBlog", self.handler.list(&ctx)).await?;
        Ok(Response::new(proto::ListBlogResponse {
            blogs: records.into_iter().map(Into::into).collect(),
        }))
    }
}
