use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Step;

/// Request counters collected by a chaining step.
///
/// All counters are atomics with relaxed ordering, so one instance can be
/// shared across every request. Wrap it in an `Arc`, register
/// [`MetricsMiddleware::step`] as global middleware, and keep a handle to read
/// the numbers back.
///
/// ```rust
/// use std::sync::Arc;
/// use signalrouter::dispatcher::Dispatcher;
/// use signalrouter::middleware::MetricsMiddleware;
///
/// let metrics = Arc::new(MetricsMiddleware::new());
/// let mut dispatcher = Dispatcher::new();
/// dispatcher.add_middleware(metrics.step());
/// assert_eq!(metrics.request_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
    uncommitted: AtomicUsize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of requests that reached the step.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean time spent in the rest of the chain. Zero before the first request.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses committed with a 4xx status.
    pub fn client_errors(&self) -> usize {
        self.client_errors.load(Ordering::Relaxed)
    }

    /// Responses committed with a 5xx status, plus chains that failed with
    /// an error before committing.
    pub fn server_errors(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }

    /// Chains that finished cleanly without committing a response. The
    /// dispatcher turns these into 404 or 405.
    pub fn uncommitted(&self) -> usize {
        self.uncommitted.load(Ordering::Relaxed)
    }

    /// Chaining step that records this request and advances.
    pub fn step(self: &Arc<Self>) -> Step {
        let metrics = Arc::clone(self);
        Step::chain(move |ctx, next| {
            metrics.request_count.fetch_add(1, Ordering::Relaxed);
            let start = Instant::now();
            let result = next.run(ctx);
            let elapsed = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
            metrics
                .total_latency_ns
                .fetch_add(elapsed, Ordering::Relaxed);

            match (ctx.res.response().map(|r| r.status), &result) {
                (Some(status), _) if status >= 500 => {
                    metrics.server_errors.fetch_add(1, Ordering::Relaxed);
                }
                (Some(status), _) if status >= 400 => {
                    metrics.client_errors.fetch_add(1, Ordering::Relaxed);
                }
                (Some(_), _) => {}
                (None, Err(_)) => {
                    metrics.server_errors.fetch_add(1, Ordering::Relaxed);
                }
                (None, Ok(())) => {
                    metrics.uncommitted.fetch_add(1, Ordering::Relaxed);
                }
            }
            result
        })
    }
}
