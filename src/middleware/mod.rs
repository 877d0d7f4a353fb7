//! # Middleware Module
//!
//! Every middleware and handler is a [`Step`]. A chaining step receives a
//! one-shot continuation and decides whether the chain goes on; a terminal
//! step ends it.
//!
//! ## Built-in steps
//!
//! - [`bearer_auth`]: rejects requests whose `authorization` header does not
//!   match a fixed token
//! - [`MetricsMiddleware`]: request count, latency and error counters
//! - [`request_span`]: runs the rest of the chain inside a tracing span
//! - [`request_logger`]: one log line per request
//!
//! ## Writing a step
//!
//! ```rust
//! use signalrouter::middleware::Step;
//!
//! let require_json = Step::chain(|ctx, next| {
//!     if ctx.req.header("content-type") != Some("application/json") {
//!         ctx.res.status(415).json(&serde_json::json!({ "error": "Unsupported Media Type" }))?;
//!         return Ok(());
//!     }
//!     next.run(ctx)
//! });
//! # let _ = require_json;
//! ```

mod auth;
mod core;
mod metrics;
mod tracing;

pub use auth::bearer_auth;
pub use core::{Step, StepResult};
pub use metrics::MetricsMiddleware;
pub use self::tracing::{request_logger, request_span};
