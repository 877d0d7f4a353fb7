use http::Method;
use thiserror::Error;

/// Setup-time failure while building the routing trie.
///
/// Every variant is fatal for the call that produced it. Registrations that
/// succeeded before the failing call stay in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The method is already bound at this path, either by a direct
    /// registration or by a sub-router being merged in.
    #[error("route conflict: {method} {path} is already registered")]
    Conflict { method: Method, path: String },

    /// A registration supplied no steps at all.
    #[error("a handler is required for {method} {path}")]
    MissingHandler { method: Method, path: String },

    /// The handler slot names something that is not a registered callable.
    #[error("handler `{name}` for {method} {path} is not a registered callable")]
    InvalidHandler {
        method: Method,
        path: String,
        name: String,
    },

    /// A middleware name did not resolve in the handler registry.
    #[error("middleware `{name}` for {path} is not a registered callable")]
    UnknownMiddleware { path: String, name: String },

    /// A route table contained a method token that is not a valid HTTP method.
    #[error("invalid HTTP method `{method}`")]
    InvalidMethod { method: String },
}
