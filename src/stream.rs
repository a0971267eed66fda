//! Outbound streaming with backpressure.
//!
//! Server-streamed and bidirectional responses are produced by a spawned task
//! that writes into a bounded `tokio::sync::mpsc::channel`. When the channel
//! is full the producer waits until the transport has drained an item, so a
//! large sequence is never buffered in memory. If the consumer goes away the
//! next [`Emitter::send`] fails and the producer stops.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::telemetry;
use crate::{CourierError, ErrorKind, Result};

/// Default number of items buffered between producer and transport.
///
/// A producer runs at most this many items ahead of what the peer has read.
pub const DEFAULT_STREAM_BUFFER: usize = 4;

/// Boxed response stream handed to tonic.
pub type ResponseStream<T> = Pin<Box<dyn Stream<Item = std::result::Result<T, tonic::Status>> + Send>>;

/// Sending half given to a producer.
pub struct Emitter<T> {
    tx: mpsc::Sender<Result<T>>,
    method: &'static str,
    sent: u64,
}

impl<T> Emitter<T> {
    /// Deliver one item, waiting while the buffer is full.
    ///
    /// Fails once the consumer has dropped its end; the producer must stop
    /// and return that error.
    pub async fn send(&mut self, item: T) -> Result<()> {
        self.tx
            .send(Ok(item))
            .await
            .map_err(|_| CourierError::Stream(format!("{} consumer closed the stream", self.method)))?;
        self.sent += 1;
        metrics::counter!(telemetry::STREAM_ITEMS_TOTAL,
            "method" => self.method,
            "direction" => "outbound",
        )
        .increment(1);
        Ok(())
    }

    /// Number of items delivered so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create an emitter and the stream it feeds, without spawning anything.
pub fn channel<T>(method: &'static str, buffer: usize) -> (Emitter<T>, ReceiverStream<Result<T>>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let emitter = Emitter { tx, method, sent: 0 };
    (emitter, ReceiverStream::new(rx))
}

/// Spawn `produce` on its own task and return the stream of what it emits.
///
/// A producer error is delivered as the final item of the stream, so items
/// already sent stay valid while the call still terminates with the failure.
pub fn spawn_producer<T, F, Fut>(
    method: &'static str,
    buffer: usize,
    produce: F,
) -> ReceiverStream<Result<T>>
where
    T: Send + 'static,
    F: FnOnce(Emitter<T>) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (emitter, stream) = channel(method, buffer);
    let tx = emitter.tx.clone();
    let task = produce(emitter);

    tokio::spawn(async move {
        let start = Instant::now();
        let result = task.await;
        telemetry::record_call(method, start, result.as_ref().err().map(CourierError::kind));
        if let Err(err) = result {
            if err.kind() == ErrorKind::Unknown && tx.is_closed() {
                debug!(method, error = %err, "producer stopped after consumer went away");
            } else {
                debug!(method, error = %err, "producer failed");
                let _ = tx.send(Err(err)).await;
            }
        }
    });

    stream
}

/// Convert a native stream into the tonic response shape.
pub fn into_response<T, P, F>(stream: ReceiverStream<Result<T>>, convert: F) -> ResponseStream<P>
where
    T: Send + 'static,
    P: Send + 'static,
    F: Fn(T) -> P + Send + 'static,
{
    Box::pin(stream.map(move |item| item.map(&convert).map_err(tonic::Status::from)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_items_then_terminal_error() {
        let mut stream = spawn_producer("Test", 2, |mut out| async move {
            out.send(1).await?;
            out.send(2).await?;
            Err(CourierError::InvalidArgument("bad".into()))
        });

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn send_fails_after_consumer_drops() {
        let (mut out, stream) = channel::<u32>("Test", 1);
        drop(stream);
        assert!(out.is_closed());
        let err = out.send(7).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(out.sent(), 0);
    }

    #[tokio::test]
    async fn send_waits_while_buffer_is_full() {
        let (mut out, mut stream) = channel::<u32>("Test", 1);
        out.send(1).await.unwrap();

        let mut blocked = tokio_test::task::spawn(out.send(2));
        tokio_test::assert_pending!(blocked.poll());

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(blocked.is_woken());
        tokio_test::assert_ready_ok!(blocked.poll());
        drop(blocked);

        assert_eq!(out.sent(), 2);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn into_response_maps_errors_to_status() {
        let stream = spawn_producer("Test", 1, |_out: Emitter<u32>| async move {
            Err(CourierError::not_found("blog", "abc"))
        });
        let mut response = into_response(stream, |n| n * 2);
        let status = response.next().await.unwrap().unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }
}
