use std::time::Instant;

use tracing::{info, info_span, Span};

use super::Step;

/// Chaining step that runs the rest of the chain inside a `request` span.
///
/// `status` and `latency_ms` are recorded on the span once the chain returns.
pub fn request_span() -> Step {
    Step::chain(|ctx, next| {
        let span = info_span!(
            "request",
            request_id = %ctx.req.request_id(),
            method = %ctx.req.method(),
            path = %ctx.req.path(),
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        );
        let start = Instant::now();
        let result = span.in_scope(|| next.run(ctx));
        record_outcome(&span, ctx.res.response().map(|r| r.status), start);
        result
    })
}

fn record_outcome(span: &Span, status: Option<u16>, start: Instant) {
    if let Some(status) = status {
        span.record("status", status);
    }
    span.record("latency_ms", start.elapsed().as_millis() as u64);
}

/// Chaining step that emits one `info!` per request after the chain returns.
///
/// Installed by the dispatcher in front of every other global middleware
/// when request logging is enabled in [`crate::runtime_config::RuntimeConfig`].
pub fn request_logger() -> Step {
    Step::chain(|ctx, next| {
        let start = Instant::now();
        let result = next.run(ctx);
        info!(
            request_id = %ctx.req.request_id(),
            method = %ctx.req.method(),
            path = %ctx.req.path(),
            status = ?ctx.res.response().map(|r| r.status),
            latency_ms = start.elapsed().as_millis() as u64,
            failed = result.is_err(),
            "Request handled"
        );
        result
    })
}
