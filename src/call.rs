//! Per-call deadline tracking.
//!
//! Every handler receives a [`CallContext`] and calls [`CallContext::check`]
//! before expensive work and once per streamed item. Suspending operations
//! (simulated work, pacing delays, reads from a client stream) go through
//! [`CallContext::run`] or [`CallContext::recv`] so they give up when the
//! caller's deadline passes instead of blocking past it.
//!
//! The deadline comes from the `grpc-timeout` request header when present,
//! otherwise from the server's configured default.

use std::future::Future;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::time::Instant;
use tonic::metadata::MetadataMap;

use crate::{CourierError, Result};

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Deadline defaults applied when building a [`CallContext`] for an incoming call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallPolicy {
    /// Deadline for calls whose client sent none. `None` leaves them unbounded.
    pub default_timeout: Option<Duration>,
}

impl CallPolicy {
    pub fn new(default_timeout: Option<Duration>) -> Self {
        Self { default_timeout }
    }

    /// Build the context for a call from its request metadata.
    pub fn context(&self, metadata: &MetadataMap) -> CallContext {
        let timeout = metadata
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_grpc_timeout)
            .or(self.default_timeout);
        match timeout {
            Some(t) => CallContext::with_timeout(t),
            None => CallContext::unbounded(),
        }
    }
}

/// Deadline state for a single call.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// A call with no deadline.
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// A call that must finish within `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail fast if the deadline has already passed.
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            return Err(CourierError::DeadlineExceeded(
                "caller deadline passed before work started".to_string(),
            ));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the deadline passes first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        match self.deadline {
            None => fut.await,
            Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                Ok(result) => result,
                Err(_) => Err(CourierError::DeadlineExceeded(
                    "caller deadline passed during work".to_string(),
                )),
            },
        }
    }

    /// Sleep for `duration`, failing if the deadline arrives first.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }

    /// Receive the next item of an inbound stream within the deadline.
    ///
    /// `Ok(None)` is end-of-stream.
    pub async fn recv<S, T>(&self, stream: &mut S) -> Result<Option<T>>
    where
        S: Stream<Item = Result<T>> + Unpin,
    {
        self.run(async { stream.next().await.transpose() }).await
    }
}

/// Parse a `grpc-timeout` header value: up to 8 digits followed by a unit
/// (`H`, `M`, `S`, `m`, `u`, `n`).
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let duration = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use futures_util::stream;
    use tonic::metadata::MetadataValue;

    #[test]
    fn parses_grpc_timeout_units() {
        assert_eq!(parse_grpc_timeout("3S"), Some(Duration::from_secs(3)));
        assert_eq!(parse_grpc_timeout("250m"), Some(Duration::from_millis(250)));
        assert_eq!(parse_grpc_timeout("2M"), Some(Duration::from_secs(120)));
        assert_eq!(parse_grpc_timeout("1H"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_grpc_timeout("99999999n"), Some(Duration::from_nanos(99_999_999)));
    }

    #[test]
    fn rejects_bad_grpc_timeouts() {
        for bad in ["", "S", "10", "1x", "-1S", "123456789S", "1.5S"] {
            assert_eq!(parse_grpc_timeout(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn header_takes_precedence_over_default() {
        let policy = CallPolicy::new(Some(Duration::from_secs(30)));
        let mut metadata = MetadataMap::new();
        metadata.insert(GRPC_TIMEOUT_HEADER, MetadataValue::from_static("1S"));

        let remaining = policy.context(&metadata).remaining().unwrap();
        assert!(remaining <= Duration::from_secs(1));
    }

    #[test]
    fn missing_header_without_default_is_unbounded() {
        let ctx = CallPolicy::default().context(&MetadataMap::new());
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_context_fails_fast() {
        let ctx = CallContext::with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;

        let err = ctx.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_past_deadline_fails() {
        let ctx = CallContext::with_timeout(Duration::from_secs(3));
        let err = ctx.sleep(Duration::from_secs(4)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_within_deadline_succeeds() {
        let ctx = CallContext::with_timeout(Duration::from_secs(5));
        assert!(ctx.sleep(Duration::from_secs(4)).await.is_ok());
    }

    #[tokio::test]
    async fn recv_reports_end_of_stream() {
        let ctx = CallContext::unbounded();
        let mut items = stream::iter(vec![Ok::<_, CourierError>(1)]);
        assert_eq!(ctx.recv(&mut items).await.unwrap(), Some(1));
        assert_eq!(ctx.recv(&mut items).await.unwrap(), None);
    }
}
