//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check every configured path is an absolute, plain URI path
//! - Detect overlapping aliases and auth pages under the proxy prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - The upstream origin is NOT validated here; it may come from the
//!   environment and is resolved separately (see `config::origin`)

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::uri::PathAndQuery;

use crate::config::origin::UpstreamOrigin;
use crate::config::schema::EdgeConfig;
use crate::routing::matcher::{resolve_dot_segments, under_prefix};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    let upstream = &config.upstream;
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be > 0"));
    }
    if upstream.response_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.response_timeout_secs", "must be > 0"));
    }
    if upstream.max_body_bytes == 0 {
        errors.push(ValidationError::new("upstream.max_body_bytes", "must be > 0"));
    }

    if let Some(origin) = &config.frontend.origin {
        if let Err(reason) = UpstreamOrigin::parse(origin) {
            errors.push(ValidationError::new("frontend.origin", reason));
        }
    }

    for (field, name) in [
        ("session.token_cookie", &config.session.token_cookie),
        ("session.role_cookie", &config.session.role_cookie),
    ] {
        if !is_cookie_name(name) {
            errors.push(ValidationError::new(field, format!("{name:?} is not a valid cookie name")));
        }
    }
    if config.session.token_cookie == config.session.role_cookie {
        errors.push(ValidationError::new(
            "session.role_cookie",
            "must differ from session.token_cookie",
        ));
    }

    let routing = &config.routing;
    let mut paths = vec![
        ("routing.login_path", routing.login_path.as_str()),
        ("routing.register_path", routing.register_path.as_str()),
        ("routing.admin_dashboard", routing.admin_dashboard.as_str()),
        ("routing.super_dashboard", routing.super_dashboard.as_str()),
        ("routing.proxy_prefix", routing.proxy_prefix.as_str()),
    ];
    for alias in &routing.aliases {
        paths.push(("routing.aliases.prefix", alias.prefix.as_str()));
        paths.push(("routing.aliases.target", alias.target.as_str()));
    }
    for prefix in routing.internal_prefixes.iter().chain(&routing.static_prefixes) {
        paths.push(("routing.internal_prefixes/static_prefixes", prefix.as_str()));
    }
    for file in &routing.static_files {
        paths.push(("routing.static_files", file.as_str()));
    }
    for (field, path) in paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, format!("{path:?} must start with '/'")));
        } else if path.contains(['?', '#'])
            || path.parse::<PathAndQuery>().is_err()
            || resolve_dot_segments(path).is_some()
        {
            errors.push(ValidationError::new(
                field,
                format!("{path:?} must be a plain URI path"),
            ));
        }
    }

    if routing.proxy_prefix == "/" {
        errors.push(ValidationError::new(
            "routing.proxy_prefix",
            "must not cover the whole site",
        ));
    }

    for (field, path) in [
        ("routing.login_path", &routing.login_path),
        ("routing.register_path", &routing.register_path),
    ] {
        if under_prefix(path, &routing.proxy_prefix) {
            errors.push(ValidationError::new(field, "must not live under routing.proxy_prefix"));
        }
    }

    let mut seen = HashSet::new();
    for alias in &routing.aliases {
        if !seen.insert(alias.prefix.as_str()) {
            errors.push(ValidationError::new(
                "routing.aliases",
                format!("duplicate alias prefix {:?}", alias.prefix),
            ));
        }
        if alias.prefix == "/" {
            errors.push(ValidationError::new("routing.aliases", "alias prefix must not be '/'"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// RFC 6265 cookie-name: a non-empty token.
fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AliasConfig;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&EdgeConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EdgeConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.connect_timeout_secs = 0;
        config.session.role_cookie = "bad name".into();
        config.routing.login_path = "login".into();
        config.frontend.origin = Some("localhost:3000".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"upstream.connect_timeout_secs"));
        assert!(fields.contains(&"session.role_cookie"));
        assert!(fields.contains(&"routing.login_path"));
        assert!(fields.contains(&"frontend.origin"));
    }

    #[test]
    fn test_auth_page_under_proxy_prefix() {
        let mut config = EdgeConfig::default();
        config.routing.login_path = "/api/v1/login".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "routing.login_path");
    }

    #[test]
    fn test_duplicate_alias() {
        let mut config = EdgeConfig::default();
        config.routing.aliases.push(AliasConfig {
            prefix: "/admin".into(),
            target: "/elsewhere".into(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("duplicate"));
    }

    #[test]
    fn test_paths_must_be_plain() {
        let mut config = EdgeConfig::default();
        config.routing.aliases.push(AliasConfig {
            prefix: "/legacy".into(),
            target: "/old dashboard".into(),
        });
        config.routing.admin_dashboard = "/dashboard/../home".into();
        config.routing.login_path = "/login?next=1".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"routing.aliases.target"));
        assert!(fields.contains(&"routing.admin_dashboard"));
        assert!(fields.contains(&"routing.login_path"));
    }

    #[test]
    fn test_same_cookie_names() {
        let mut config = EdgeConfig::default();
        config.session.role_cookie = "token".into();
        assert!(validate_config(&config).is_err());
    }
}
