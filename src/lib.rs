//! # signalrouter
//!
//! **signalrouter** maps HTTP requests to ordered stacks of middleware and
//! handlers, and runs them as a continuation chain.
//!
//! ## Overview
//!
//! Routes live in a segment trie with literal segments and single named
//! parameters (`:id`). Middleware attaches globally, to a path subtree, or to
//! one route. Sub-routers mount under a base path and merge into the parent.
//! Each request resolves to one stack that runs in order until a step
//! commits a response, stops advancing, or fails.
//!
//! ## Architecture
//!
//! - **[`router`]** - Trie construction, mounting and resolution
//! - **[`dispatcher`]** - Global middleware, the continuation executor and
//!   404/405/500 handling
//! - **[`middleware`]** - The [`middleware::Step`] type and built-in steps
//! - **[`server`]** - The per-request [`server::Context`]: normalized request
//!   and one-shot response writer
//! - **[`registry`]** / **[`route_table`]** - Routes declared by name in a
//!   YAML, TOML or JSON file
//! - **[`logging`]** / **[`runtime_config`]** - Environment-driven setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant HTTP as HTTP layer
//!     participant D as Dispatcher
//!     participant R as Router
//!     participant E as Executor
//!     participant S as Steps
//!
//!     HTTP->>D: handle(http::Request)
//!     D->>R: resolve(method, path)
//!     R-->>D: ExecutionResult (stack, outcome, params, allow)
//!     D->>E: execute(globals + stack, ctx)
//!     loop until commit, truncation or end of stack
//!         E->>S: step(ctx, next)
//!         S->>E: next.run(ctx)
//!     end
//!     E-->>D: ChainState or error
//!     D-->>HTTP: committed response, 405, 404 or 500
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use signalrouter::dispatcher::Dispatcher;
//! use signalrouter::middleware::{bearer_auth, Step};
//! use signalrouter::router::Router;
//! use signalrouter::server::Request;
//!
//! # fn main() -> Result<(), signalrouter::router::RouterError> {
//! let mut pets = Router::new();
//! pets.get("/:id", [Step::terminal(|ctx| {
//!     let id = ctx.req.param("id").unwrap_or_default().to_owned();
//!     ctx.res.json(&serde_json::json!({ "id": id }))?;
//!     Ok(())
//! })])?;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.using(Some("/pets"), bearer_auth("Bearer secret"))?;
//! dispatcher.using(Some("/pets"), pets)?;
//!
//! let req = Request::new(Method::GET, "/pets/42").with_header("authorization", "Bearer secret");
//! let res = dispatcher.dispatch(req);
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body_json().unwrap()["id"], "42");
//!
//! let anonymous = dispatcher.dispatch(Request::new(Method::GET, "/pets/42"));
//! assert_eq!(anonymous.status, 401);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Routing is built through `&mut` methods and is read-only afterwards.
//! [`dispatcher::Dispatcher`] is `Send + Sync`; share it behind an `Arc` and
//! call [`dispatcher::Dispatcher::dispatch`] from any number of threads. Each
//! call gets its own context.

pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod route_table;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::Dispatcher;
pub use ids::RequestId;
pub use middleware::Step;
pub use registry::HandlerRegistry;
pub use route_table::{load_route_table, RouteTable};
pub use router::{Router, RouterError};
pub use server::{Context, Request, Response};
