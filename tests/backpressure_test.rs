//! Tests for streaming backpressure.
//!
//! Verifies that spawned producers are throttled by the bounded channel when
//! the consumer falls behind, and stop once the consumer goes away.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use courier::call::CallContext;
use courier::greet::{GreetHandler, GreetSettings};
use courier::stream::spawn_producer;
use courier::{CourierError, ErrorKind, Greeting};

/// Spawn a producer of `count` items that counts what it managed to send.
fn counting_producer(
    count: u32,
    buffer: usize,
    produced: Arc<AtomicU32>,
) -> tokio_stream::wrappers::ReceiverStream<courier::Result<u32>> {
    spawn_producer("Counting", buffer, move |mut out| async move {
        for i in 0..count {
            out.send(i).await?;
            produced.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    })
}

#[tokio::test]
async fn producer_delivers_all_items() {
    let produced = Arc::new(AtomicU32::new(0));
    let mut stream = counting_producer(10, 4, produced.clone());

    let mut received = Vec::new();
    while let Some(item) = stream.next().await {
        received.push(item.unwrap());
    }
    assert_eq!(received, (0..10).collect::<Vec<_>>());
    assert_eq!(produced.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn producer_with_nothing_to_send_ends_stream() {
    let mut stream = counting_producer(0, 4, Arc::new(AtomicU32::new(0)));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn producer_error_terminates_stream() {
    let mut stream = spawn_producer("Failing", 4, |mut out| async move {
        out.send("ok").await?;
        Err(CourierError::Store("boom".into()))
    });

    assert_eq!(stream.next().await.unwrap().unwrap(), "ok");
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn producer_stops_when_consumer_drops() {
    let produced = Arc::new(AtomicU32::new(0));

    // A thousand items, but only two consumed
    let mut stream = counting_producer(1000, 4, produced.clone());
    stream.next().await;
    stream.next().await;

    // Drop the stream (consumer side)
    drop(stream);

    // Give the producer task a moment to notice the dropped receiver
    tokio::time::sleep(Duration::from_millis(50)).await;

    let total = produced.load(Ordering::SeqCst);
    assert!(
        total < 20,
        "producer should stop early when consumer drops, but produced {total} items"
    );
}

#[tokio::test]
async fn backpressure_limits_producer_ahead() {
    let produced = Arc::new(AtomicU32::new(0));
    let buffer_size = 4;
    let mut stream = counting_producer(100, buffer_size, produced.clone());

    // Read one item to kick things off
    let _ = stream.next().await;

    // Give the producer a moment to fill the buffer
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Consumed 1 + buffer capacity ahead, with some tolerance
    let total = produced.load(Ordering::SeqCst);
    assert!(
        total <= (buffer_size as u32 + 2),
        "producer should be bounded by buffer, but produced {total} items (buffer={buffer_size})"
    );
}

#[tokio::test]
async fn greet_stream_stops_when_consumer_drops() {
    let handler = GreetHandler::new(GreetSettings {
        stream_count: 1_000,
        stream_interval: Duration::from_millis(1),
        sum_delay: Duration::ZERO,
    });
    let sent = Arc::new(AtomicU32::new(0));
    let sent_by_task = sent.clone();

    let mut stream = spawn_producer("GreetStream", 1, move |mut out| async move {
        let result = handler
            .greet_stream(&CallContext::unbounded(), &Greeting::new("Jon", "Snow"), &mut out)
            .await;
        sent_by_task.store(out.sent() as u32, Ordering::SeqCst);
        result
    });
    assert_eq!(stream.next().await.unwrap().unwrap(), "Jon Snow 0");
    drop(stream);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let total = sent.load(Ordering::SeqCst);
    assert!(total < 10, "producer kept going after the consumer left: {total}");
}
