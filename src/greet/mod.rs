//! Greeting and arithmetic calls.
//!
//! [`GreetHandler`] holds the domain logic for every `GreetService` method,
//! one method per RPC, independent of the transport. Streaming inputs are
//! plain `Stream`s of native values; streaming outputs go through an
//! [`Emitter`].

mod average;
mod factor;

use std::pin::pin;
use std::time::Duration;

use futures_util::Stream;
use tracing::{debug, info};

use crate::call::CallContext;
use crate::stream::Emitter;
use crate::{CourierError, Greeting, Result};

pub use average::Average;
pub use factor::PrimeFactors;

/// Timing knobs for the greeting calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreetSettings {
    /// Number of responses emitted by `GreetStream`.
    pub stream_count: u32,
    /// Pause between `GreetStream` responses.
    pub stream_interval: Duration,
    /// Simulated work performed by `Sum` before answering.
    pub sum_delay: Duration,
}

impl Default for GreetSettings {
    fn default() -> Self {
        Self {
            stream_count: 11,
            stream_interval: Duration::from_millis(100),
            sum_delay: Duration::from_secs(4),
        }
    }
}

/// Domain logic for the greeting service.
#[derive(Debug, Clone, Default)]
pub struct GreetHandler {
    settings: GreetSettings,
}

impl GreetHandler {
    pub fn new(settings: GreetSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GreetSettings {
        &self.settings
    }

    /// Unary: `"Hello {first} {last}"`.
    pub fn greet(&self, ctx: &CallContext, greeting: &Greeting) -> Result<String> {
        ctx.check()?;
        info!(
            first_name = %greeting.first_name,
            last_name = %greeting.last_name,
            "greet"
        );
        Ok(format!("Hello {}", greeting.full_name()))
    }

    /// Unary: `a + b`, after simulated work bounded by the caller's deadline.
    pub async fn sum(&self, ctx: &CallContext, a: i64, b: i64) -> Result<i64> {
        ctx.check()?;
        ctx.sleep(self.settings.sum_delay).await?;
        let sum = a.wrapping_add(b);
        info!(a, b, sum, "sum");
        Ok(sum)
    }

    /// Server stream: `"{first} {last} {i}"` for `i` in `0..stream_count`,
    /// paced by `stream_interval`.
    pub async fn greet_stream(
        &self,
        ctx: &CallContext,
        greeting: &Greeting,
        out: &mut Emitter<String>,
    ) -> Result<()> {
        let name = greeting.full_name();
        for i in 0..self.settings.stream_count {
            ctx.check()?;
            if i > 0 {
                ctx.sleep(self.settings.stream_interval).await?;
            }
            ctx.run(out.send(format!("{name} {i}"))).await?;
        }
        debug!(sent = out.sent(), "greet stream finished");
        Ok(())
    }

    /// Server stream: the prime factors of `n`, one per item.
    pub async fn factor_stream(
        &self,
        ctx: &CallContext,
        n: i64,
        out: &mut Emitter<i64>,
    ) -> Result<()> {
        info!(number = n, "factor stream");
        for factor in PrimeFactors::new(n)? {
            ctx.check()?;
            ctx.run(out.send(factor)).await?;
        }
        Ok(())
    }

    /// Client stream: consume greetings until end-of-stream.
    pub async fn long_greet<S>(&self, ctx: &CallContext, inbound: S) -> Result<String>
    where
        S: Stream<Item = Result<Greeting>>,
    {
        let mut inbound = pin!(inbound);
        let mut received = 0u64;
        while let Some(greeting) = ctx.recv(&mut inbound).await? {
            debug!(greeting = %format!("Hallo {}", greeting.last_name), "long greet item");
            received += 1;
        }
        info!(received, "long greet finished");
        Ok("finished streaming greeting".to_string())
    }

    /// Client stream: mean of every number received.
    pub async fn compute_average<S>(&self, ctx: &CallContext, inbound: S) -> Result<f64>
    where
        S: Stream<Item = Result<i64>>,
    {
        let mut inbound = pin!(inbound);
        let mut average = Average::new();
        while let Some(number) = ctx.recv(&mut inbound).await? {
            average.push(number);
        }
        info!(sum = average.sum(), count = average.count(), "compute average finished");
        average.finish()
    }

    /// Bidirectional: answer every greeting with `"Hi {first}"` before
    /// reading the next one.
    pub async fn greet_everyone<S>(
        &self,
        ctx: &CallContext,
        inbound: S,
        out: &mut Emitter<String>,
    ) -> Result<()>
    where
        S: Stream<Item = Result<Greeting>>,
    {
        let mut inbound = pin!(inbound);
        while let Some(greeting) = ctx.recv(&mut inbound).await? {
            ctx.run(out.send(format!("Hi {}", greeting.first_name)))
                .await?;
        }
        info!(answered = out.sent(), "greet everyone finished");
        Ok(())
    }

    /// Unary: square root of a non-negative integer.
    pub fn square_root(&self, ctx: &CallContext, number: i32) -> Result<f64> {
        ctx.check()?;
        if number < 0 {
            return Err(CourierError::InvalidArgument(format!(
                "received a negative number: {number}"
            )));
        }
        Ok(f64::from(number).sqrt())
    }
}
