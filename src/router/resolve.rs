use http::Method;
use tracing::{debug, info};

use super::core::{PathParams, Router};
use super::trie::{split_segments, NodeId};
use crate::middleware::Step;

/// How a request path and method resolved against the trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    NotFound,
    MethodNotAllowed,
}

impl Outcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Found => "FOUND",
            Outcome::NotFound => "NOT_FOUND",
            Outcome::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        }
    }
}

/// Resolution output for one request.
///
/// `stack` always holds every path-level middleware along the walked prefix,
/// even for `NotFound` and `MethodNotAllowed`, so those steps still see the
/// request.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub stack: Vec<Step>,
    pub outcome: Outcome,
    /// Only set for [`Outcome::MethodNotAllowed`], in registration order.
    pub allow: Option<Vec<Method>>,
    /// Only set for [`Outcome::Found`].
    pub params: Option<PathParams>,
}

impl ExecutionResult {
    fn not_found(stack: Vec<Step>) -> Self {
        Self {
            stack,
            outcome: Outcome::NotFound,
            allow: None,
            params: None,
        }
    }

    /// The handler, which is the last step of a `Found` stack.
    #[must_use]
    pub fn handler(&self) -> Option<&Step> {
        match self.outcome {
            Outcome::Found => self.stack.last(),
            _ => None,
        }
    }

    /// `Allow` header value, e.g. `GET, POST`.
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        self.allow.as_ref().map(|methods| {
            methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

impl Router {
    /// Walk the trie for `path` and build the execution stack for `method`.
    ///
    /// Static children are tried before the parametric child at every depth.
    /// There is no backtracking: once a segment descends into a child, a miss
    /// deeper down is `NotFound`.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> ExecutionResult {
        let mut node_id = NodeId::ROOT;
        let mut stack: Vec<Step> = self.trie.node(node_id).middlewares.clone();
        let mut params = PathParams::default();

        for segment in split_segments(path) {
            let node = self.trie.node(node_id);
            node_id = if let Some(&child) = node.children.get(segment) {
                child
            } else if let Some(child) = node.param_child {
                if let Some(name) = &self.trie.node(child).param_name {
                    params.insert(name, segment);
                }
                child
            } else {
                debug!(method = %method, path = %path, segment = %segment, "No route matched");
                return ExecutionResult::not_found(stack);
            };
            stack.extend(self.trie.node(node_id).middlewares.iter().cloned());
        }

        let node = self.trie.node(node_id);
        if node.routes.is_empty() {
            debug!(method = %method, path = %path, "No handler at matched node");
            return ExecutionResult::not_found(stack);
        }

        let Some(entry) = node.route(method) else {
            let allow = node.methods();
            info!(
                method = %method,
                path = %path,
                allow = ?allow,
                "Method not allowed"
            );
            return ExecutionResult {
                stack,
                outcome: Outcome::MethodNotAllowed,
                allow: Some(allow),
                params: None,
            };
        };

        stack.extend(entry.middlewares.iter().cloned());
        stack.push(entry.handler.clone());
        debug!(
            method = %method,
            path = %path,
            params = ?params,
            stack_len = stack.len(),
            "Route matched"
        );
        ExecutionResult {
            stack,
            outcome: Outcome::Found,
            allow: None,
            params: Some(params),
        }
    }
}
