//! # Dispatcher Module
//!
//! The dispatcher runs one request from resolution to response.
//!
//! ## Request Flow
//!
//! 1. The router resolves `(method, path)` into an execution stack
//! 2. Global middleware is prepended, for every outcome
//! 3. The executor runs the stack as a continuation chain
//! 4. The dispatcher picks the response: committed, 405, 404 or error
//!
//! ## Continuation chain
//!
//! A chaining step decides whether the request goes on by calling
//! [`Next::run`] at most once. Committing a response skips every later step.
//! Calling `run` twice fails with [`ExecError::DoubleAdvance`].
//!
//! ```rust
//! use http::Method;
//! use signalrouter::dispatcher::{execute, ChainState};
//! use signalrouter::middleware::Step;
//! use signalrouter::server::{Context, Request};
//!
//! let auth = Step::chain(|ctx, next| next.run(ctx));
//! let handler = Step::terminal(|ctx| Ok(ctx.res.status(204).text("")?));
//! let never = Step::terminal(|_| anyhow::bail!("unreachable"));
//!
//! let mut ctx = Context::new(Request::new(Method::GET, "/"));
//! let state = execute(&[auth, handler, never], &mut ctx).unwrap();
//! assert_eq!(state, ChainState::Terminated { index: 1 });
//! assert_eq!(ctx.res.response().unwrap().status, 204);
//! ```
//!
//! ## Error Handling
//!
//! Step errors and panics are caught once, in [`Dispatcher::dispatch`]:
//! - with a committed response, the response wins and the error is logged
//! - without one, the configured [`ErrorFormatter`] builds the response
//!   (default `500 {"error": "Internal Server Error"}`)

mod core;
mod executor;

pub use core::{Dispatcher, ErrorFormatter};
pub use executor::{execute, ChainState, ExecError, Next};
