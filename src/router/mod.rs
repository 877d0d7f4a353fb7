//! # Router Module
//!
//! The router module maps an incoming `(method, path)` pair to the ordered
//! list of steps that should handle it.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Building a trie of path segments at setup time
//! - Attaching path-level middleware that applies to a whole subtree
//! - Mounting sub-routers under a base path
//! - Resolving requests into an [`ExecutionResult`] with captured parameters
//!
//! ## Architecture
//!
//! Routing happens in two phases:
//!
//! 1. **Construction**: [`Router::register_route`], [`Router::use_at`] and
//!    [`Router::mount`] mutate the trie through `&mut Router`. Conflicting
//!    registrations fail with [`RouterError::Conflict`].
//!
//! 2. **Resolution**: [`Router::resolve`] walks the trie one segment at a
//!    time, preferring static children over the parametric child, and
//!    collects middleware root first.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use signalrouter::middleware::Step;
//! use signalrouter::router::{Outcome, Router};
//!
//! # fn main() -> Result<(), signalrouter::router::RouterError> {
//! let mut api = Router::new();
//! api.get("/pets/:id", [Step::terminal(|ctx| Ok(ctx.res.text("pet")?))])?;
//! api.post("/pets/:id", [Step::terminal(|ctx| Ok(ctx.res.text("saved")?))])?;
//!
//! let mut root = Router::new();
//! root.mount("/api", api)?;
//!
//! let found = root.resolve(&Method::GET, "/api/pets/7");
//! assert_eq!(found.outcome, Outcome::Found);
//! assert_eq!(found.params.unwrap().get("id"), Some("7"));
//!
//! let denied = root.resolve(&Method::DELETE, "/api/pets/7");
//! assert_eq!(denied.outcome, Outcome::MethodNotAllowed);
//! assert_eq!(denied.allow_header().as_deref(), Some("GET, POST"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Performance
//!
//! - Resolution is O(segments), independent of the number of routes
//! - Parameters are stored inline for up to [`MAX_INLINE_PARAMS`] captures
//! - Steps are `Arc` handles, so building a stack clones pointers only

mod core;
mod error;
mod resolve;
#[cfg(test)]
mod tests;
mod trie;

pub use core::{ParamVec, PathParams, Router, Use, MAX_INLINE_PARAMS};
pub use error::RouterError;
pub use resolve::{ExecutionResult, Outcome};
pub use trie::{split_segments, NodeId, RouteEntry, PARAM_SIGIL};
