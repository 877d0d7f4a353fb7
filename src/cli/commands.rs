use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::{json, Value};
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::echo::echo_handler;
use crate::middleware::Step;
use crate::registry::HandlerRegistry;
use crate::route_table::{load_route_table, RouteTable};
use crate::runtime_config::RuntimeConfig;
use crate::server::Request;

/// Command-line interface for signalrouter
#[derive(Parser)]
#[command(name = "signalrouter")]
#[command(about = "Inspect and exercise route tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the routes declared by a route table
    Routes {
        /// Route table file
        #[arg(short, long, env = "SIGNAL_ROUTES")]
        routes: PathBuf,
    },
    /// Resolve and dispatch one request against a route table
    Resolve {
        /// Route table file
        #[arg(short, long, env = "SIGNAL_ROUTES")]
        routes: PathBuf,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request header as NAME:VALUE (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,

        /// Request target, e.g. /pets/42?verbose=true
        target: String,
    },
}

/// Run a parsed command, writing its output to `out`.
pub fn run_cli<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match cli.command {
        Commands::Routes { routes } => {
            let dispatcher = build_dispatcher(&routes)?;
            for pattern in dispatcher.router().route_patterns() {
                writeln!(out, "{pattern}")?;
            }
        }
        Commands::Resolve {
            routes,
            method,
            headers,
            body,
            target,
        } => {
            let dispatcher = build_dispatcher(&routes)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method `{method}`"))?;
            let mut req = Request::new(method, &target);
            for header in &headers {
                let (name, value) = header
                    .split_once(':')
                    .with_context(|| format!("header `{header}` is not NAME:VALUE"))?;
                req = req.with_header(name.trim(), value.trim());
            }
            if let Some(body) = body {
                let body: Value = serde_json::from_str(&body).context("--body is not valid JSON")?;
                req = req.with_json(&body);
            }
            let report = resolve_report(&dispatcher, req);
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
    }
    Ok(())
}

fn build_dispatcher(routes: &Path) -> Result<Dispatcher> {
    let table = load_route_table(routes)?;
    let registry = inspection_registry(&table);
    let mut dispatcher = Dispatcher::with_config(RuntimeConfig::from_env());
    table
        .apply(&mut dispatcher, &registry)
        .with_context(|| format!("failed to apply route table {}", routes.display()))?;
    Ok(dispatcher)
}

/// Handler names get the echo handler; every other name passes through.
fn inspection_registry(table: &RouteTable) -> HandlerRegistry {
    let handlers: Vec<&str> = table
        .routes
        .iter()
        .filter_map(|r| r.steps.last().map(String::as_str))
        .collect();
    let mut registry = HandlerRegistry::new();
    for name in table.referenced_names() {
        if handlers.contains(&name) {
            registry.register(name, echo_handler());
        } else {
            let step_name = name.to_owned();
            registry.register(
                name,
                Step::chain(move |ctx, next| {
                    debug!(step = %step_name, path = %ctx.req.path(), "Pass-through step");
                    next.run(ctx)
                }),
            );
        }
    }
    registry
}

fn resolve_report(dispatcher: &Dispatcher, req: Request) -> Value {
    let result = dispatcher.resolve(req.method(), req.path());
    let params = result.params.as_ref().map(|p| p.to_map());
    let allow = result
        .allow
        .as_ref()
        .map(|methods| methods.iter().map(Method::as_str).collect::<Vec<_>>());
    let stack_len = result.stack.len();

    let res = dispatcher.dispatch(req);
    let body = res
        .body_json()
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&res.body).into_owned()));
    let headers: Vec<(&str, &str)> = res
        .headers
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_str()))
        .collect();

    json!({
        "outcome": result.outcome.as_str(),
        "params": params,
        "allow": allow,
        "stack_len": stack_len,
        "response": {
            "status": res.status,
            "headers": headers,
            "body": body,
        },
    })
}
