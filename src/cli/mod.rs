//! # CLI Module
//!
//! Command-line tools for inspecting a route table without running a server.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List every `METHOD /path` binding declared by a route table:
//!
//! ```bash
//! signalrouter routes --routes routes.yaml
//! ```
//!
//! ### `resolve`
//!
//! Resolve and dispatch one request against a route table. Every handler
//! name is bound to an echo handler and every middleware name to a
//! pass-through step, so the output shows exactly which route matched:
//!
//! ```bash
//! signalrouter resolve --routes routes.yaml --method GET /pets/42?verbose=true
//! ```
//!
//! Options:
//! - `--routes <FILE>` - Route table (`.yaml`, `.yml`, `.toml` or `.json`)
//! - `--method <METHOD>` - HTTP method (default: GET)
//! - `--header <NAME:VALUE>` - Request header, repeatable
//! - `--body <JSON>` - JSON request body

mod commands;


pub use commands::{run_cli, Cli, Commands};
