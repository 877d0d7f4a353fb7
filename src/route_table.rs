//! Route tables: routes and middleware declared in a YAML, TOML or JSON file
//! and bound to steps by name through a [`HandlerRegistry`].
//!
//! ```yaml
//! global: [request_id]
//! middleware:
//!   - path: /admin
//!     steps: [require_admin]
//! routes:
//!   - method: GET
//!     path: /pets/:id
//!     steps: [load_pet, get_pet]
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::registry::HandlerRegistry;
use crate::router::RouterError;

/// Path reported in [`RouterError::UnknownMiddleware`] for global entries.
pub const GLOBAL_SCOPE: &str = "*";

#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("failed to read route table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse route table {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unsupported route table format: {path} (expected .yaml, .yml, .toml or .json)")]
    UnsupportedFormat { path: PathBuf },
}

/// Path-level middleware declared by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MiddlewareSpec {
    pub path: String,
    pub steps: Vec<String>,
}

/// One route: the last step name is the handler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub method: String,
    pub path: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    #[serde(default)]
    pub global: Vec<String>,
    #[serde(default)]
    pub middleware: Vec<MiddlewareSpec>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl RouteTable {
    /// Every step name the table refers to, sorted and deduplicated.
    #[must_use]
    pub fn referenced_names(&self) -> BTreeSet<&str> {
        self.global
            .iter()
            .chain(self.middleware.iter().flat_map(|m| &m.steps))
            .chain(self.routes.iter().flat_map(|r| &r.steps))
            .map(String::as_str)
            .collect()
    }

    /// Register globals, then path middleware, then routes, in file order.
    ///
    /// Stops at the first error. Entries applied before it stay registered.
    pub fn apply(&self, dispatcher: &mut Dispatcher, registry: &HandlerRegistry) -> Result<(), RouterError> {
        for step in registry.resolve_all(GLOBAL_SCOPE, self.global.as_slice())? {
            dispatcher.add_middleware(step);
        }
        for spec in &self.middleware {
            for step in registry.resolve_all(&spec.path, spec.steps.as_slice())? {
                dispatcher.use_at(&spec.path, step);
            }
        }
        for route in &self.routes {
            let method = parse_method(&route.method)?;
            dispatcher
                .router_mut()
                .register_named_route(method, &route.path, route.steps.as_slice(), registry)?;
        }
        info!(
            globals = self.global.len(),
            middleware = self.middleware.len(),
            routes = self.routes.len(),
            "Route table applied"
        );
        Ok(())
    }
}

fn parse_method(token: &str) -> Result<Method, RouterError> {
    Method::from_bytes(token.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
        RouterError::InvalidMethod {
            method: token.to_owned(),
        }
    })
}

/// Parse a route table, choosing the format by file extension.
pub fn load_route_table(path: impl AsRef<Path>) -> Result<RouteTable, RouteTableError> {
    let path = path.as_ref();
    let parse_err = |message: String| RouteTableError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let parse: fn(&str) -> Result<RouteTable, String> = match ext.as_deref() {
        Some("yaml" | "yml") => |s| serde_yaml::from_str(s).map_err(|e| e.to_string()),
        Some("toml") => |s| toml::from_str(s).map_err(|e| e.to_string()),
        Some("json") => |s| serde_json::from_str(s).map_err(|e| e.to_string()),
        _ => {
            return Err(RouteTableError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let content = fs::read_to_string(path).map_err(|source| RouteTableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse(&content).map_err(parse_err)?;
    debug!(
        path = %path.display(),
        routes = table.routes.len(),
        "Route table loaded"
    );
    Ok(table)
}
