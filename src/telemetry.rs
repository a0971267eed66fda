//! Telemetry metric name constants.
//!
//! Centralised metric names for courier calls. Embedders install their own
//! `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `courier_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `method` — RPC method name (e.g. "Greet", "CreateBlog")
//! - `status` — outcome: "ok" or an error kind such as "not_found"
//! - `direction` — stream direction: "inbound" or "outbound"

use std::time::Instant;

use crate::ErrorKind;

/// Total calls completed, successful or not.
///
/// Labels: `method`, `status`.
pub const CALLS_TOTAL: &str = "courier_calls_total";

/// Call duration in seconds.
///
/// Labels: `method`.
pub const CALL_DURATION_SECONDS: &str = "courier_call_duration_seconds";

/// Total items moved over streaming calls.
///
/// Labels: `method`, `direction`.
pub const STREAM_ITEMS_TOTAL: &str = "courier_stream_items_total";

/// Total image bytes accepted by chunked uploads.
pub const UPLOAD_BYTES_TOTAL: &str = "courier_upload_bytes_total";

/// Record the outcome of one call.
pub fn record_call(method: &'static str, start: Instant, failure: Option<ErrorKind>) {
    let status = failure.map_or("ok", ErrorKind::as_str);
    metrics::counter!(CALLS_TOTAL,
        "method" => method,
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(CALL_DURATION_SECONDS,
        "method" => method,
    )
    .record(start.elapsed().as_secs_f64());
}
