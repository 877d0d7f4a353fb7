//! Router core: trie construction at setup time.
//!
//! All mutation happens through `&mut Router` before the router is handed to
//! a [`crate::dispatcher::Dispatcher`]. Once the dispatcher is shared for
//! serving, the trie is only read.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::RouterError;
use super::trie::{split_segments, NodeId, RouteEntry, Trie, TrieNode, PARAM_SIGIL};
use crate::middleware::Step;
use crate::registry::HandlerRegistry;

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated `(name, value)` storage.
///
/// Names are `Arc<str>` because path parameter names come from the trie and
/// are shared by every request; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Path parameters captured while resolving a request.
///
/// Binding a name that is already present overwrites it, so when the same
/// name appears at several depths the deepest capture wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(ParamVec);

impl PathParams {
    pub(crate) fn insert(&mut self, name: &Arc<str>, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => value.clone_into(existing),
            None => self.0.push((Arc::clone(name), value.to_owned())),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| &**k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Convert to a `HashMap`. Allocates; prefer [`PathParams::get`].
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }
}

/// What a mount or `using` call attaches.
pub enum Use {
    /// Middleware: global without a path, path-scoped with one.
    Middleware(Step),
    /// A sub-router, merged in at the path (or the root).
    Router(Router),
}

impl From<Step> for Use {
    fn from(step: Step) -> Self {
        Use::Middleware(step)
    }
}

impl From<Router> for Use {
    fn from(router: Router) -> Self {
        Use::Router(router)
    }
}

/// Trie-based router.
///
/// Paths are split on `/` with empty segments dropped. A segment starting
/// with `:` captures the request segment at that position under its name;
/// every other segment matches literally.
///
/// ```rust
/// use http::Method;
/// use signalrouter::middleware::Step;
/// use signalrouter::router::{Outcome, Router};
///
/// let mut router = Router::new();
/// router
///     .get("/users/:id", [Step::terminal(|ctx| Ok(ctx.res.text("user")?))])
///     .unwrap();
///
/// let result = router.resolve(&Method::GET, "/users/42");
/// assert_eq!(result.outcome, Outcome::Found);
/// assert_eq!(result.params.unwrap().get("id"), Some("42"));
/// ```
#[derive(Debug, Default)]
pub struct Router {
    pub(crate) trie: Trie,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the node for `path`. Calling it twice with the same path
    /// returns the same node.
    pub fn create_route(&mut self, path: &str) -> NodeId {
        self.trie.insert_path(path)
    }

    /// Bind `method` at `path`.
    ///
    /// The last step is the handler; every step before it is route-level
    /// middleware, run after all path-level middleware.
    ///
    /// # Errors
    ///
    /// - [`RouterError::MissingHandler`] when `steps` is empty
    /// - [`RouterError::Conflict`] when `method` is already bound at `path`
    pub fn register_route<I>(&mut self, method: Method, path: &str, steps: I) -> Result<(), RouterError>
    where
        I: IntoIterator<Item = Step>,
    {
        let mut middlewares: Vec<Step> = steps.into_iter().collect();
        let Some(handler) = middlewares.pop() else {
            return Err(RouterError::MissingHandler {
                method,
                path: path.to_owned(),
            });
        };

        let node = self.create_route(path);
        let node = self.trie.node_mut(node);
        if node.route(&method).is_some() {
            warn!(method = %method, path = %path, "Route already registered");
            return Err(RouterError::Conflict {
                method,
                path: path.to_owned(),
            });
        }

        info!(
            method = %method,
            path = %path,
            middleware_count = middlewares.len(),
            "Route registered"
        );
        node.routes.push((
            method,
            RouteEntry {
                middlewares,
                handler,
            },
        ));
        Ok(())
    }

    pub fn get<I: IntoIterator<Item = Step>>(&mut self, path: &str, steps: I) -> Result<(), RouterError> {
        self.register_route(Method::GET, path, steps)
    }

    pub fn post<I: IntoIterator<Item = Step>>(&mut self, path: &str, steps: I) -> Result<(), RouterError> {
        self.register_route(Method::POST, path, steps)
    }

    pub fn put<I: IntoIterator<Item = Step>>(&mut self, path: &str, steps: I) -> Result<(), RouterError> {
        self.register_route(Method::PUT, path, steps)
    }

    pub fn delete<I: IntoIterator<Item = Step>>(&mut self, path: &str, steps: I) -> Result<(), RouterError> {
        self.register_route(Method::DELETE, path, steps)
    }

    pub fn patch<I: IntoIterator<Item = Step>>(&mut self, path: &str, steps: I) -> Result<(), RouterError> {
        self.register_route(Method::PATCH, path, steps)
    }

    /// Bind `method` at `path` using steps looked up by name.
    ///
    /// # Errors
    ///
    /// - [`RouterError::MissingHandler`] when `names` is empty
    /// - [`RouterError::InvalidHandler`] when the last name is not registered
    /// - [`RouterError::UnknownMiddleware`] when an earlier name is not registered
    /// - [`RouterError::Conflict`] as for [`Router::register_route`]
    pub fn register_named_route<S: AsRef<str>>(
        &mut self,
        method: Method,
        path: &str,
        names: &[S],
        registry: &HandlerRegistry,
    ) -> Result<(), RouterError> {
        let Some((handler_name, middleware_names)) = names.split_last() else {
            return Err(RouterError::MissingHandler {
                method,
                path: path.to_owned(),
            });
        };
        let handler = registry
            .get(handler_name.as_ref())
            .ok_or_else(|| RouterError::InvalidHandler {
                method: method.clone(),
                path: path.to_owned(),
                name: handler_name.as_ref().to_owned(),
            })?;
        let mut steps = registry.resolve_all(path, middleware_names)?;
        steps.push(handler.clone());
        self.register_route(method, path, steps)
    }

    /// Attach path-level middleware. It runs for every method at `path` and
    /// every path below it.
    pub fn use_at(&mut self, path: &str, step: Step) {
        let node = self.create_route(path);
        self.trie.node_mut(node).middlewares.push(step);
        debug!(path = %path, "Path middleware attached");
    }

    /// Merge `sub` into this router under `base_path`, consuming it.
    ///
    /// Middleware at a shared node runs target first, then source. Static
    /// children are unioned by segment; parametric children are merged
    /// together. Nothing is changed when the merge fails.
    ///
    /// # Errors
    ///
    /// [`RouterError::Conflict`] when both routers bind the same method at the
    /// same path.
    pub fn mount(&mut self, base_path: &str, sub: Router) -> Result<(), RouterError> {
        let base = self.create_route(base_path);
        let sub_nodes = sub.trie.len();
        self.trie.merge(base, sub.trie).map_err(|conflict| {
            let path = join_paths(base_path, &conflict.path);
            warn!(method = %conflict.method, path = %path, "Route conflict while mounting router");
            RouterError::Conflict {
                method: conflict.method,
                path,
            }
        })?;
        info!(base_path = %base_path, merged_nodes = sub_nodes, "Router mounted");
        Ok(())
    }

    /// Every registered `METHOD /path` pair, sorted, for diagnostics.
    #[must_use]
    pub fn route_patterns(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_patterns(NodeId::ROOT, &mut Vec::new(), &mut out);
        out.sort();
        out
    }

    fn collect_patterns(&self, id: NodeId, prefix: &mut Vec<String>, out: &mut Vec<String>) {
        let node: &TrieNode = self.trie.node(id);
        let path = format!("/{}", prefix.join("/"));
        for (method, _) in &node.routes {
            out.push(format!("{method} {path}"));
        }
        for (segment, &child) in &node.children {
            prefix.push(segment.clone());
            self.collect_patterns(child, prefix, out);
            prefix.pop();
        }
        if let Some(child) = node.param_child {
            let name = self.trie.node(child).param_name.as_deref().unwrap_or_default();
            prefix.push(format!("{PARAM_SIGIL}{name}"));
            self.collect_patterns(child, prefix, out);
            prefix.pop();
        }
    }

    /// Number of registered (method, path) bindings.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.route_patterns().len()
    }
}

fn join_paths(base: &str, rest: &str) -> String {
    let joined: Vec<&str> = split_segments(base).chain(split_segments(rest)).collect();
    format!("/{}", joined.join("/"))
}
