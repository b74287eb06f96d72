//! Configuration loading and resolution.
//!
//! Every setting resolves the same way: explicit flag, then environment
//! variable, then built-in default.

use std::time::Duration;

use vedastro::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_ADDR: &str = "127.0.0.1:7071";
pub const DEFAULT_BASE_PATH: &str = "/api";
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 15;

pub const ADDR_ENV: &str = "VEDASTRO_MCP_ADDR";
pub const API_BASE_ENV: &str = "VEDASTRO_API_BASE";

/// Runtime settings shared by both transports.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (host:port).
    pub addr: String,
    /// Base URL of the VedAstro API.
    pub api_base: String,
    /// Prefix every route is mounted under. Empty means the root.
    pub base_path: String,
    /// Answer `/mcp` with a JSON body instead of event-stream frames.
    pub json_response: bool,
    /// Interval between keep-alive comments on session streams.
    pub keep_alive: Duration,
    /// Per-request timeout for downstream calls.
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            api_base: DEFAULT_BASE_URL.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            json_response: true,
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Path announced to session clients for follow-up POSTs.
    pub fn messages_endpoint(&self) -> String {
        format!("{}/messages", self.base_path)
    }

    /// Path clients reconnect to after losing a session.
    pub fn sse_endpoint(&self) -> String {
        format!("{}/sse", self.base_path)
    }
}

/// Resolve the listen address.
pub fn resolve_addr(explicit: Option<&str>) -> String {
    resolve(explicit, ADDR_ENV, DEFAULT_ADDR)
}

/// Resolve the VedAstro API base URL.
pub fn resolve_api_base(explicit: Option<&str>) -> String {
    resolve(explicit, API_BASE_ENV, DEFAULT_BASE_URL)
}

fn resolve(explicit: Option<&str>, env_key: &str, default: &str) -> String {
    if let Some(value) = explicit {
        return value.to_string();
    }

    if let Ok(value) = std::env::var(env_key) {
        if !value.trim().is_empty() {
            return value;
        }
    }

    default.to_string()
}

/// Normalize a route prefix: leading slash, no trailing slash, `/` → empty.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/api"), "/api");
        assert_eq!(normalize_base_path("api/"), "/api");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/v1/mcp/"), "/v1/mcp");
    }

    #[test]
    fn test_default_endpoints() {
        let config = ServerConfig::default();
        assert_eq!(config.messages_endpoint(), "/api/messages");
        assert_eq!(config.sse_endpoint(), "/api/sse");
        assert!(config.json_response);
    }

    #[test]
    fn test_root_mount_endpoints() {
        let config = ServerConfig {
            base_path: normalize_base_path("/"),
            ..ServerConfig::default()
        };
        assert_eq!(config.messages_endpoint(), "/messages");
    }

    #[test]
    fn test_explicit_value_wins() {
        assert_eq!(resolve_addr(Some("0.0.0.0:9000")), "0.0.0.0:9000");
        assert_eq!(
            resolve_api_base(Some("http://localhost:1234/api")),
            "http://localhost:1234/api"
        );
    }
}
