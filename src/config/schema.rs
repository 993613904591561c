//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// API upstream the reverse proxy forwards to.
    pub upstream: UpstreamConfig,

    /// Page renderer that serves everything the router lets through.
    pub frontend: FrontendConfig,

    /// Cookie names consumed and produced by the router.
    pub session: SessionConfig,

    /// Paths driving the router's decision table.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Explicit origin. Takes precedence over `origin_env`.
    pub origin: Option<String>,

    /// Environment variables consulted in order when `origin` is unset.
    pub origin_env: Vec<String>,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Deadline for upstream response headers in seconds.
    pub response_timeout_secs: u64,

    /// Largest request body buffered for forwarding.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: None,
            origin_env: vec![
                "API_PROXY_ORIGIN".to_string(),
                "PUBLIC_API_URL".to_string(),
                "PUBLIC_BACKEND_URL".to_string(),
            ],
            connect_timeout_secs: 5,
            response_timeout_secs: 30,
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Page renderer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontendConfig {
    /// Origin of the page renderer (e.g., "http://127.0.0.1:3000").
    /// When unset, pages answer 404.
    pub origin: Option<String>,
}

/// Cookie names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session token.
    pub token_cookie: String,

    /// Cookie caching the role hint.
    pub role_cookie: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_cookie: "token".to_string(),
            role_cookie: "role".to_string(),
        }
    }
}

/// Alias prefix served from a canonical prefix.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AliasConfig {
    /// Prefix the user sees (e.g., "/admin").
    pub prefix: String,

    /// Canonical prefix served instead (e.g., "/dashboard").
    pub target: String,
}

/// Router path configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub login_path: String,
    pub register_path: String,

    /// Dashboard for every non-super role.
    pub admin_dashboard: String,

    /// Dashboard subtree reserved for super admins.
    pub super_dashboard: String,

    pub aliases: Vec<AliasConfig>,

    /// Prefix owned by the reverse proxy.
    pub proxy_prefix: String,

    /// Framework-internal fetch prefixes.
    pub internal_prefixes: Vec<String>,

    /// Query parameters marking a framework-internal fetch.
    pub internal_query_markers: Vec<String>,

    pub static_prefixes: Vec<String>,
    pub static_files: Vec<String>,

    /// File extensions (without the dot) never intercepted.
    pub static_extensions: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            register_path: "/register".to_string(),
            admin_dashboard: "/dashboard".to_string(),
            super_dashboard: "/dashboard/super".to_string(),
            aliases: vec![
                AliasConfig {
                    prefix: "/admin".to_string(),
                    target: "/dashboard".to_string(),
                },
                AliasConfig {
                    prefix: "/super".to_string(),
                    target: "/dashboard/super".to_string(),
                },
            ],
            proxy_prefix: "/api/v1".to_string(),
            internal_prefixes: vec!["/_next/".to_string()],
            internal_query_markers: vec!["_rsc".to_string()],
            static_prefixes: vec![
                "/_next/static/".to_string(),
                "/_next/image".to_string(),
                "/static/".to_string(),
                "/assets/".to_string(),
            ],
            static_files: vec![
                "/favicon.ico".to_string(),
                "/robots.txt".to_string(),
                "/sitemap.xml".to_string(),
            ],
            static_extensions: [
                "svg", "png", "jpg", "jpeg", "gif", "webp", "ico", "css", "js", "map", "woff",
                "woff2", "ttf", "otf",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
