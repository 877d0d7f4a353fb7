use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::Method;
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::executor::execute;
use crate::middleware::{request_logger, Step};
use crate::router::{ExecutionResult, Outcome, Router, RouterError, Use};
use crate::runtime_config::RuntimeConfig;
use crate::server::{Context, ContextError, Request, Response};

/// Turns an uncaught step error into the response sent to the client.
///
/// Only called when no response was committed before the error.
pub type ErrorFormatter = Arc<dyn Fn(&anyhow::Error, &Request) -> Response + Send + Sync>;

fn default_error_formatter() -> ErrorFormatter {
    Arc::new(|_err, _req| Response::error(500, "Internal Server Error"))
}

/// Request entry point: resolves, runs the stack, and converts whatever
/// happened into exactly one [`Response`].
///
/// Build it with `&mut` methods during setup, then share it (for example as
/// `Arc<Dispatcher>`) while serving. Nothing reachable through `&self`
/// mutates the routing trie.
///
/// ```rust
/// use http::Method;
/// use signalrouter::dispatcher::Dispatcher;
/// use signalrouter::middleware::Step;
/// use signalrouter::server::Request;
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher
///     .router_mut()
///     .get("/hello", [Step::terminal(|ctx| Ok(ctx.res.text("hi")?))])
///     .unwrap();
///
/// let res = dispatcher.dispatch(Request::new(Method::GET, "/hello"));
/// assert_eq!(res.status, 200);
/// assert_eq!(res.body, b"hi");
///
/// let missing = dispatcher.dispatch(Request::new(Method::GET, "/nope"));
/// assert_eq!(missing.status, 404);
/// ```
pub struct Dispatcher {
    router: Router,
    global: Vec<Step>,
    on_error: ErrorFormatter,
    config: RuntimeConfig,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("global", &self.global)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Dispatcher configured from the environment. See
    /// [`RuntimeConfig::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_config(RuntimeConfig::from_env())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut global = Vec::new();
        if config.log_requests {
            global.push(request_logger());
        }
        Self {
            router: Router::new(),
            global,
            on_error: default_error_formatter(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Add a global middleware. Globals run before anything the router
    /// resolves, in registration order, for every outcome including 404 and
    /// 405.
    pub fn add_middleware(&mut self, step: Step) {
        self.global.push(step);
        debug!(global_count = self.global.len(), "Global middleware added");
    }

    /// Attach path-level middleware on the underlying router.
    pub fn use_at(&mut self, path: &str, step: Step) {
        self.router.use_at(path, step);
    }

    /// Mount a sub-router on the underlying router.
    pub fn mount(&mut self, base_path: &str, sub: Router) -> Result<(), RouterError> {
        self.router.mount(base_path, sub)
    }

    /// Single entry point for attaching middleware or sub-routers:
    ///
    /// | `path`    | `item`       | effect                      |
    /// |-----------|--------------|-----------------------------|
    /// | `None`    | middleware   | global middleware           |
    /// | `Some(p)` | middleware   | path-level middleware at `p` |
    /// | `None`    | router       | mount at `/`                |
    /// | `Some(p)` | router       | mount at `p`                |
    pub fn using(&mut self, path: Option<&str>, item: impl Into<Use>) -> Result<(), RouterError> {
        match (path, item.into()) {
            (None, Use::Middleware(step)) => {
                self.add_middleware(step);
                Ok(())
            }
            (Some(path), Use::Middleware(step)) => {
                self.use_at(path, step);
                Ok(())
            }
            (path, Use::Router(sub)) => self.mount(path.unwrap_or("/"), sub),
        }
    }

    /// Replace the formatter used for uncaught step errors.
    pub fn on_error<F>(&mut self, formatter: F)
    where
        F: Fn(&anyhow::Error, &Request) -> Response + Send + Sync + 'static,
    {
        self.on_error = Arc::new(formatter);
    }

    /// Resolve through the router and prepend the global middleware.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> ExecutionResult {
        let mut result = self.router.resolve(method, path);
        if !self.global.is_empty() {
            let mut stack = Vec::with_capacity(self.global.len() + result.stack.len());
            stack.extend(self.global.iter().cloned());
            stack.append(&mut result.stack);
            result.stack = stack;
        }
        result
    }

    /// Run one request to completion.
    ///
    /// - a committed response is returned as is, whatever the routing outcome
    /// - otherwise `MethodNotAllowed` becomes 405 with an `Allow` header and
    ///   anything else becomes 404
    /// - a step error (or panic) becomes the error formatter's response,
    ///   unless a response was committed first, in which case the error is
    ///   discarded
    pub fn dispatch(&self, mut req: Request) -> Response {
        let start = Instant::now();
        let ExecutionResult {
            stack,
            outcome,
            allow,
            params,
        } = self.resolve(req.method(), req.path());
        if let Some(params) = params {
            req.set_params(params);
        }

        let mut ctx = Context::new(req);
        let run = panic::catch_unwind(AssertUnwindSafe(|| execute(&stack, &mut ctx)))
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!("step panicked: {}", panic_message(payload.as_ref())))
            });

        let request_id = ctx.req.request_id();
        match run {
            Ok(state) => {
                if let Some(res) = ctx.res.take_response() {
                    debug!(
                        request_id = %request_id,
                        status = res.status,
                        state = ?state,
                        elapsed_us = start.elapsed().as_micros() as u64,
                        "Response committed"
                    );
                    return res;
                }
                match outcome {
                    Outcome::MethodNotAllowed => method_not_allowed(&ctx.req, allow.as_deref()),
                    Outcome::NotFound => not_found(&ctx.req),
                    Outcome::Found => {
                        warn!(
                            request_id = %request_id,
                            method = %ctx.req.method(),
                            path = %ctx.req.path(),
                            state = ?state,
                            "Matched route finished without committing a response"
                        );
                        not_found(&ctx.req)
                    }
                }
            }
            Err(err) => {
                if let Some(res) = ctx.res.take_response() {
                    debug!(
                        request_id = %request_id,
                        status = res.status,
                        error = %err,
                        "Step failed after commit; keeping committed response"
                    );
                    return res;
                }
                error!(
                    request_id = %request_id,
                    method = %ctx.req.method(),
                    path = %ctx.req.path(),
                    error = ?err,
                    "Step failed"
                );
                (self.on_error)(&err, &ctx.req)
            }
        }
    }

    /// Normalize an `http::Request`, dispatch it, and convert the result back.
    ///
    /// Bodies above the configured limit get a 413 without being routed.
    pub fn handle(&self, req: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        match Request::from_http(req, self.config.max_body_bytes) {
            Ok(req) => self.dispatch(req).into_http(),
            Err(err @ ContextError::BodyTooLarge { .. }) => {
                info!(error = %err, "Request rejected");
                Response::error(413, "Payload Too Large").into_http()
            }
            Err(err) => {
                info!(error = %err, "Request rejected");
                Response::error(400, "Bad Request").into_http()
            }
        }
    }
}

fn not_found(req: &Request) -> Response {
    debug!(method = %req.method(), path = %req.path(), "Sending 404");
    Response::json(
        404,
        &json!({
            "error": "Not Found",
            "method": req.method().as_str(),
            "path": req.path(),
        }),
    )
}

fn method_not_allowed(req: &Request, allow: Option<&[Method]>) -> Response {
    let allow: Vec<&str> = allow.unwrap_or_default().iter().map(Method::as_str).collect();
    let mut res = Response::json(
        405,
        &json!({
            "error": "Method Not Allowed",
            "method": req.method().as_str(),
            "path": req.path(),
            "allow": allow,
        }),
    );
    res.set_header("allow", allow.join(", "));
    res
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }

    #[test]
    fn test_log_requests_installs_logger_first() {
        let dispatcher = Dispatcher::with_config(RuntimeConfig {
            log_requests: true,
            ..RuntimeConfig::default()
        });
        let result = dispatcher.resolve(&Method::GET, "/");
        assert_eq!(result.stack.len(), 1);
        assert!(result.stack[0].is_chaining());
    }

    #[test]
    fn test_dispatcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
    }
}
