//! Upstream origin resolution.
//!
//! The API origin is resolved once at startup from the config file and an
//! ordered list of environment variables, then injected into the HTTP state.
//! A failed resolution is kept as a value so every proxied request can report
//! it instead of forwarding to an unintended host.

use url::Url;

use crate::config::schema::UpstreamConfig;

/// Path segment the proxy re-appends to every forwarded request.
pub const API_BASE_PATH: &str = "/api/v1";

/// Why no usable upstream origin is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    #[error("no upstream origin configured; set upstream.origin or one of [{}]", .0.join(", "))]
    NotConfigured(Vec<String>),

    #[error("upstream origin {value:?} from {origin_source} is invalid: {reason}")]
    Invalid {
        origin_source: String,
        value: String,
        reason: String,
    },
}

/// A validated absolute http(s) base URL without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamOrigin {
    base: String,
}

impl UpstreamOrigin {
    /// Validate `raw` as an http(s) origin. Trailing slashes are dropped.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let base = raw.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err("empty value".to_string());
        }

        let url = Url::parse(base).map_err(|e| e.to_string())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme {:?}", url.scheme()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err("missing host".to_string());
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err("query and fragment are not allowed".to_string());
        }

        Ok(Self {
            base: base.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// `<origin>/api/v1/<remainder>[?query]`. `remainder` is used verbatim.
    pub fn api_url(&self, remainder: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}/{}", self.base, API_BASE_PATH, remainder);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// `<origin><path>[?query]` for an absolute inbound path.
    pub fn join(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}", self.base, path);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

impl std::fmt::Display for UpstreamOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}

/// Strip trailing slashes and a trailing `/api/v1`.
fn strip_api_suffix(raw: &str) -> &str {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(API_BASE_PATH)
        .unwrap_or(trimmed)
        .trim_end_matches('/')
}

/// Resolve the API origin: `config.origin` first, then each of
/// `config.origin_env` through `lookup`. First non-empty value wins.
pub fn resolve_origin<F>(config: &UpstreamConfig, lookup: F) -> Result<UpstreamOrigin, OriginError>
where
    F: Fn(&str) -> Option<String>,
{
    let candidates = config
        .origin
        .clone()
        .map(|value| ("upstream.origin".to_string(), value))
        .into_iter()
        .chain(
            config
                .origin_env
                .iter()
                .filter_map(|name| lookup(name).map(|value| (name.clone(), value))),
        );

    for (origin_source, value) in candidates {
        if value.trim().is_empty() {
            continue;
        }
        return UpstreamOrigin::parse(strip_api_suffix(&value)).map_err(|reason| {
            OriginError::Invalid {
                origin_source,
                value,
                reason,
            }
        });
    }

    Err(OriginError::NotConfigured(config.origin_env.clone()))
}

/// Resolve the API origin against the process environment.
pub fn resolve_from_env(config: &UpstreamConfig) -> Result<UpstreamOrigin, OriginError> {
    resolve_origin(config, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_fallback_order() {
        let config = UpstreamConfig::default();

        let origin = resolve_origin(
            &config,
            lookup(&[
                ("PUBLIC_API_URL", "https://second.example.com"),
                ("PUBLIC_BACKEND_URL", "https://third.example.com"),
            ]),
        )
        .unwrap();
        assert_eq!(origin.as_str(), "https://second.example.com");

        let origin = resolve_origin(
            &config,
            lookup(&[
                ("API_PROXY_ORIGIN", "  "),
                ("PUBLIC_BACKEND_URL", "https://third.example.com"),
            ]),
        )
        .unwrap();
        assert_eq!(origin.as_str(), "https://third.example.com");
    }

    #[test]
    fn test_config_value_wins() {
        let config = UpstreamConfig {
            origin: Some("http://10.0.0.5:4000".into()),
            ..Default::default()
        };
        let origin =
            resolve_origin(&config, lookup(&[("API_PROXY_ORIGIN", "https://env.example.com")]))
                .unwrap();
        assert_eq!(origin.as_str(), "http://10.0.0.5:4000");
    }

    #[test]
    fn test_api_suffix_stripped() {
        let config = UpstreamConfig::default();
        for raw in [
            "https://api.example.com/api/v1",
            "https://api.example.com/api/v1/",
            "https://api.example.com/",
        ] {
            let origin = resolve_origin(&config, lookup(&[("API_PROXY_ORIGIN", raw)])).unwrap();
            assert_eq!(origin.as_str(), "https://api.example.com", "input {raw}");
        }
    }

    #[test]
    fn test_not_configured() {
        let err = resolve_origin(&UpstreamConfig::default(), lookup(&[])).unwrap_err();
        assert!(matches!(err, OriginError::NotConfigured(_)));
        assert!(err.to_string().contains("API_PROXY_ORIGIN"));
    }

    #[test]
    fn test_invalid_values() {
        let config = UpstreamConfig::default();
        for raw in ["api.example.com", "ftp://files.example.com", "/api/v1", "https://x.io?a=1"] {
            let err = resolve_origin(&config, lookup(&[("API_PROXY_ORIGIN", raw)])).unwrap_err();
            match err {
                OriginError::Invalid { origin_source, .. } => {
                    assert_eq!(origin_source, "API_PROXY_ORIGIN")
                }
                other => panic!("unexpected {other:?} for {raw}"),
            }
        }
    }

    #[test]
    fn test_api_url() {
        let origin = UpstreamOrigin::parse("https://api.example.com").unwrap();
        assert_eq!(
            origin.api_url("events", Some("limit=5")),
            "https://api.example.com/api/v1/events?limit=5"
        );
        assert_eq!(origin.api_url("", None), "https://api.example.com/api/v1/");
        assert_eq!(
            origin.join("/dashboard/events", None),
            "https://api.example.com/dashboard/events"
        );
    }
}
