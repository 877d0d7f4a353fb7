//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the dispatcher's runtime behavior.
//!
//! ## Environment Variables
//!
//! ### `SIGNAL_LOG_REQUESTS`
//!
//! When `true` (or `1`), the dispatcher runs the request logger in front of
//! every other global middleware. Default: `false`.
//!
//! ### `SIGNAL_MAX_BODY_BYTES`
//!
//! Largest request body accepted by [`crate::dispatcher::Dispatcher::handle`].
//! Accepts decimal (`1048576`) or hexadecimal (`0x100000`). Larger bodies get
//! a 413 response without touching the router. Default: 1 MiB.
//!
//! ## Usage
//!
//! ```rust
//! use signalrouter::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Body limit: {} bytes", config.max_body_bytes);
//! ```

use std::env;

/// Default request body limit, 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 0x10_0000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Emit one `info!` per request with status and latency.
    pub log_requests: bool,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_requests: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_requests = lookup("SIGNAL_LOG_REQUESTS")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        let max_body_bytes = lookup("SIGNAL_MAX_BODY_BYTES")
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);
        RuntimeConfig {
            log_requests,
            max_body_bytes,
        }
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> RuntimeConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RuntimeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), RuntimeConfig::default());
    }

    #[test]
    fn test_parses_values() {
        let cfg = config(&[
            ("SIGNAL_LOG_REQUESTS", "TRUE"),
            ("SIGNAL_MAX_BODY_BYTES", "0x400"),
        ]);
        assert!(cfg.log_requests);
        assert_eq!(cfg.max_body_bytes, 1024);
    }

    #[test]
    fn test_invalid_size_falls_back() {
        let cfg = config(&[("SIGNAL_MAX_BODY_BYTES", "lots")]);
        assert_eq!(cfg.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }
}
