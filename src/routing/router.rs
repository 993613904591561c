//! The edge decision table.
//!
//! # Responsibilities
//! - Compile routing configuration into an immutable policy
//! - Decide, per request, between continuing, redirecting and rewriting
//!
//! # Design Decisions
//! - `decide` is a pure function of (path, query, session presence, role hint)
//! - Rules are evaluated in a fixed order; first match wins
//! - The table is total: `Continue` is the catch-all
//! - Redirect targets drop the original query; rewrites keep it

use url::form_urlencoded;

use crate::config::schema::RoutingConfig;
use crate::routing::matcher::{
    has_query_marker, normalize_path, resolve_dot_segments, under_prefix, AssetMatcher,
};
use crate::routing::role::RoleHint;

/// Outcome of the decision table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Serve the request unchanged.
    Continue,
    /// Send the client elsewhere; the value is an absolute path (+ query).
    RedirectTo(String),
    /// Serve a different page under the same URL; absolute path (+ query).
    RewriteTo(String),
}

impl Decision {
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::Continue => "continue",
            Decision::RedirectTo(_) => "redirect",
            Decision::RewriteTo(_) => "rewrite",
        }
    }
}

/// Everything the decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub has_session: bool,
    pub role: Option<RoleHint>,
}

#[derive(Debug, Clone)]
struct Alias {
    prefix: String,
    target: String,
}

/// Compiled routing configuration.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    login_path: String,
    register_path: String,
    admin_dashboard: String,
    super_dashboard: String,
    aliases: Vec<Alias>,
    proxy_prefix: String,
    internal_prefixes: Vec<String>,
    internal_query_markers: Vec<String>,
    assets: AssetMatcher,
}

impl RoutingPolicy {
    pub fn from_config(config: &RoutingConfig) -> Self {
        let mut aliases: Vec<Alias> = config
            .aliases
            .iter()
            .map(|alias| Alias {
                prefix: normalize_path(&alias.prefix),
                target: normalize_path(&alias.target),
            })
            .collect();
        // Longest prefix first so nested aliases win.
        aliases.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Self {
            login_path: normalize_path(&config.login_path),
            register_path: normalize_path(&config.register_path),
            admin_dashboard: normalize_path(&config.admin_dashboard),
            super_dashboard: normalize_path(&config.super_dashboard),
            aliases,
            proxy_prefix: normalize_path(&config.proxy_prefix),
            internal_prefixes: config.internal_prefixes.clone(),
            internal_query_markers: config.internal_query_markers.clone(),
            assets: AssetMatcher::new(
                config.static_prefixes.clone(),
                config.static_files.clone(),
                config.static_extensions.clone(),
            ),
        }
    }

    pub fn proxy_prefix(&self) -> &str {
        &self.proxy_prefix
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Static files bypass the decision table entirely.
    pub fn is_static_asset(&self, path: &str) -> bool {
        self.assets.matches(path)
    }

    /// True for paths owned by the reverse proxy.
    pub fn is_proxy_path(&self, path: &str) -> bool {
        under_prefix(&normalize_path(path), &self.proxy_prefix)
    }

    /// True when a path with dot segments names the proxy prefix before or
    /// after resolution. Such paths are refused instead of resolved.
    pub fn is_proxy_traversal(&self, path: &str) -> bool {
        match resolve_dot_segments(path) {
            Some(resolved) => {
                under_prefix(path, &self.proxy_prefix) || self.is_proxy_path(&resolved)
            }
            None => false,
        }
    }

    /// True for proxy and framework-internal traffic, which is never
    /// intercepted.
    pub fn bypasses(&self, path: &str, query: Option<&str>) -> bool {
        self.is_excluded(&normalize_path(path), query)
    }

    fn is_excluded(&self, path: &str, query: Option<&str>) -> bool {
        under_prefix(path, &self.proxy_prefix)
            || self
                .internal_prefixes
                .iter()
                .any(|prefix| under_prefix(path, prefix))
            || has_query_marker(query, &self.internal_query_markers)
    }

    fn is_public(&self, path: &str) -> bool {
        under_prefix(path, &self.login_path) || under_prefix(path, &self.register_path)
    }

    fn is_auth_page(&self, path: &str) -> bool {
        path == self.login_path || path == self.register_path
    }

    fn dashboard_for(&self, role: Option<RoleHint>) -> &str {
        match role {
            Some(RoleHint::SuperAdmin) => &self.super_dashboard,
            _ => &self.admin_dashboard,
        }
    }

    fn canonicalize(&self, path: &str) -> Option<String> {
        self.aliases.iter().find_map(|alias| {
            if !under_prefix(path, &alias.prefix) {
                return None;
            }
            let suffix = &path[alias.prefix.len()..];
            Some(normalize_path(&format!("{}{}", alias.target, suffix)))
        })
    }

    fn login_redirect(&self, path: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect", path)
            .finish();
        format!("{}?{}", self.login_path, query)
    }

    /// Evaluate the decision table.
    pub fn decide(&self, input: &RouteInput<'_>) -> Decision {
        let mut path = normalize_path(input.path);

        // 1. Infrastructure traffic is never intercepted.
        if self.is_excluded(&path, input.query) {
            return Decision::Continue;
        }

        // 2. Alias canonicalization; evaluation continues on the canonical path.
        let rewritten = match self.canonicalize(&path) {
            Some(canonical) => {
                path = canonical;
                true
            }
            None => false,
        };

        if let Some(target) = self.redirect_for(&path, input) {
            return Decision::RedirectTo(target);
        }

        if rewritten {
            let target = match input.query {
                Some(query) if !query.is_empty() => format!("{path}?{query}"),
                _ => path,
            };
            return Decision::RewriteTo(target);
        }

        Decision::Continue
    }

    fn redirect_for(&self, path: &str, input: &RouteInput<'_>) -> Option<String> {
        // 3. Authenticated root visit.
        if input.has_session && path == "/" {
            return Some(self.dashboard_for(input.role).to_string());
        }

        // 4. Unauthenticated protected access.
        if !input.has_session && !self.is_public(path) {
            return Some(self.login_redirect(path));
        }

        // 5. Authenticated visit to auth pages.
        if input.has_session && self.is_auth_page(path) {
            return Some(self.dashboard_for(input.role).to_string());
        }

        // 6. Dashboard segregation. Super admins may browse admin sub-pages,
        // but not the admin dashboard root.
        let is_super = input.role == Some(RoleHint::SuperAdmin);
        if under_prefix(path, &self.super_dashboard) && !is_super {
            return Some(self.admin_dashboard.clone());
        }
        if is_super && path == self.admin_dashboard {
            return Some(self.super_dashboard.clone());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RoutingPolicy {
        RoutingPolicy::from_config(&RoutingConfig::default())
    }

    fn decide(path: &str, has_session: bool, role: Option<RoleHint>) -> Decision {
        policy().decide(&RouteInput {
            path,
            query: None,
            has_session,
            role,
        })
    }

    fn redirect(target: &str) -> Decision {
        Decision::RedirectTo(target.to_string())
    }

    #[test]
    fn test_no_token_protected_redirects_to_login() {
        assert_eq!(
            decide("/dashboard/events", false, None),
            redirect("/login?redirect=%2Fdashboard%2Fevents")
        );
        assert_eq!(decide("/", false, None), redirect("/login?redirect=%2F"));
    }

    #[test]
    fn test_root_goes_to_role_dashboard() {
        assert_eq!(decide("/", true, Some(RoleHint::Admin)), redirect("/dashboard"));
        assert_eq!(decide("/", true, None), redirect("/dashboard"));
        assert_eq!(
            decide("/", true, Some(RoleHint::SuperAdmin)),
            redirect("/dashboard/super")
        );
    }

    #[test]
    fn test_super_admin_bounced_off_admin_root() {
        assert_eq!(
            decide("/dashboard", true, Some(RoleHint::SuperAdmin)),
            redirect("/dashboard/super")
        );
        assert_eq!(
            decide("/dashboard/", true, Some(RoleHint::SuperAdmin)),
            redirect("/dashboard/super")
        );
        // but may browse admin sub-pages
        assert_eq!(
            decide("/dashboard/events", true, Some(RoleHint::SuperAdmin)),
            Decision::Continue
        );
    }

    #[test]
    fn test_admin_kept_out_of_super_subtree() {
        assert_eq!(
            decide("/dashboard/super/approvals", true, Some(RoleHint::Admin)),
            redirect("/dashboard")
        );
        assert_eq!(decide("/dashboard/super", true, None), redirect("/dashboard"));
        assert_eq!(
            decide("/dashboard/superb", true, Some(RoleHint::Admin)),
            Decision::Continue
        );
    }

    #[test]
    fn test_alias_rewrite_then_login_redirect() {
        assert_eq!(
            decide("/admin/events", false, None),
            redirect("/login?redirect=%2Fdashboard%2Fevents")
        );
    }

    #[test]
    fn test_alias_rewrite_keeps_query() {
        let decision = policy().decide(&RouteInput {
            path: "/admin/events/",
            query: Some("page=2&sort=desc"),
            has_session: true,
            role: Some(RoleHint::Admin),
        });
        assert_eq!(
            decision,
            Decision::RewriteTo("/dashboard/events?page=2&sort=desc".into())
        );

        assert_eq!(
            decide("/super/approvals", true, Some(RoleHint::SuperAdmin)),
            Decision::RewriteTo("/dashboard/super/approvals".into())
        );
        // an alias into the super subtree is still segregated
        assert_eq!(
            decide("/super", true, Some(RoleHint::Admin)),
            redirect("/dashboard")
        );
        // alias onto the admin root still bounces super admins
        assert_eq!(
            decide("/admin", true, Some(RoleHint::SuperAdmin)),
            redirect("/dashboard/super")
        );
    }

    #[test]
    fn test_auth_pages() {
        assert_eq!(decide("/login", false, None), Decision::Continue);
        assert_eq!(decide("/register/verify", false, None), Decision::Continue);
        assert_eq!(decide("/login", true, Some(RoleHint::Admin)), redirect("/dashboard"));
        assert_eq!(
            decide("/register/", true, Some(RoleHint::SuperAdmin)),
            redirect("/dashboard/super")
        );
        // sub-pages of auth pages are public but not bounced
        assert_eq!(decide("/login/otp", true, None), Decision::Continue);
    }

    #[test]
    fn test_dot_segments_cannot_leave_public_pages() {
        assert_eq!(
            decide("/login/../dashboard/super/approvals", false, None),
            redirect("/login?redirect=%2Fdashboard%2Fsuper%2Fapprovals")
        );
        assert_eq!(
            decide("/register/%2e%2e/dashboard/super", true, Some(RoleHint::Admin)),
            redirect("/dashboard")
        );
    }

    #[test]
    fn test_proxy_traversal() {
        let policy = policy();
        assert!(policy.is_proxy_traversal("/api/v1/../internal/metrics"));
        assert!(policy.is_proxy_traversal("/api/v1/%2E%2E/internal"));
        assert!(policy.is_proxy_traversal("/dashboard/../api/v1/events"));
        assert!(!policy.is_proxy_traversal("/api/v1/events"));
        assert!(!policy.is_proxy_traversal("/login/../dashboard"));
    }

    #[test]
    fn test_excluded_traffic_never_intercepted() {
        for (path, query) in [
            ("/api/v1/events", None),
            ("/api/v1", None),
            ("/_next/data/build/dashboard.json", None),
            ("/dashboard/super", Some("_rsc=abc")),
        ] {
            for has_session in [false, true] {
                for role in [None, Some(RoleHint::Admin), Some(RoleHint::SuperAdmin)] {
                    let decision = policy().decide(&RouteInput {
                        path,
                        query,
                        has_session,
                        role,
                    });
                    assert_eq!(decision, Decision::Continue, "{path} {query:?}");
                }
            }
        }
        assert!(policy().is_proxy_path("/api/v1/"));
        assert!(!policy().is_proxy_path("/api/v10"));
    }

    #[test]
    fn test_decision_table_is_total() {
        let paths = [
            "/",
            "/login",
            "/login/reset",
            "/register",
            "/admin/events",
            "/super/approvals",
            "/dashboard",
            "/dashboard/events",
            "/dashboard/super",
            "/dashboard/super/approvals",
            "/api/v1/events",
            "/unknown/page/",
        ];
        let policy = policy();
        for path in paths {
            for has_session in [false, true] {
                for role in [None, Some(RoleHint::Admin), Some(RoleHint::SuperAdmin)] {
                    let decision = policy.decide(&RouteInput {
                        path,
                        query: None,
                        has_session,
                        role,
                    });
                    if let Decision::RedirectTo(target) | Decision::RewriteTo(target) = &decision {
                        assert!(target.starts_with('/'), "{path} -> {target}");
                    }
                    // never redirect to the path being visited
                    if let Decision::RedirectTo(target) = &decision {
                        assert_ne!(target, &normalize_path(path));
                    }
                }
            }
        }
    }
}
