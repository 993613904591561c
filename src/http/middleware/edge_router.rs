//! Edge router middleware.
//!
//! Applies the routing decision to every inbound request before any page is
//! served: dot-segment resolution, redirects, in-place rewrites, and role
//! cookie maintenance.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{LOCATION, SET_COOKIE},
        uri::PathAndQuery,
        HeaderValue, Request, StatusCode, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::SessionConfig;
use crate::http::error::ProxyError;
use crate::observability::metrics;
use crate::routing::cookies::{clear_role_cookie, cookie_value, role_cookie};
use crate::routing::matcher::resolve_dot_segments;
use crate::routing::{resolve_role, Decision, RoleResolution, RoleSource, RouteInput, RoutingPolicy};

/// State required by the edge router.
#[derive(Debug, Clone)]
pub struct EdgeRouter {
    pub policy: Arc<RoutingPolicy>,
    pub token_cookie: String,
    pub role_cookie: String,
}

impl EdgeRouter {
    pub fn new(policy: RoutingPolicy, session: &SessionConfig) -> Self {
        Self {
            policy: Arc::new(policy),
            token_cookie: session.token_cookie.clone(),
            role_cookie: session.role_cookie.clone(),
        }
    }

    /// Role cookie change to attach to the response, if any.
    fn role_cookie_update(
        &self,
        has_session: bool,
        resolution: RoleResolution,
        current: Option<&str>,
    ) -> Option<HeaderValue> {
        if !has_session {
            return current.and_then(|_| clear_role_cookie(&self.role_cookie));
        }
        match (resolution.source, resolution.hint) {
            (RoleSource::Token, Some(hint)) if current != Some(hint.as_str()) => {
                role_cookie(&self.role_cookie, hint.as_str())
            }
            _ => None,
        }
    }
}

pub async fn edge_router_middleware(
    State(edge): State<Arc<EdgeRouter>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // 0. Resolve dot segments up front so every check sees the fetched path.
    if let Some(resolved) = resolve_dot_segments(req.uri().path()) {
        if edge.policy.is_proxy_traversal(req.uri().path()) {
            tracing::warn!(path = %req.uri().path(), "Rejected dot segments in proxied path");
            return ProxyError::InvalidPath.into_response();
        }
        let target = match req.uri().query() {
            Some(query) => format!("{resolved}?{query}"),
            None => resolved,
        };
        match rewrite_uri(req.uri(), &target) {
            Some(uri) => *req.uri_mut() = uri,
            None => return ProxyError::InvalidPath.into_response(),
        }
    }

    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    // 1. Static files and infrastructure traffic pass untouched.
    if edge.policy.is_static_asset(&path) || edge.policy.bypasses(&path, query.as_deref()) {
        return next.run(req).await;
    }

    // 2. Decide from cookies.
    let (decision, cookie_update) = {
        let token = cookie_value(req.headers(), &edge.token_cookie);
        let current_role = cookie_value(req.headers(), &edge.role_cookie);
        let resolution = resolve_role(token, current_role);

        let decision = edge.policy.decide(&RouteInput {
            path: &path,
            query: query.as_deref(),
            has_session: token.is_some(),
            role: resolution.hint,
        });
        let update = edge.role_cookie_update(token.is_some(), resolution, current_role);
        (decision, update)
    };

    metrics::record_decision(decision.kind());
    tracing::debug!(path = %path, decision = decision.kind(), "Edge decision");

    // 3. Apply it. A target that is not a valid URI is a configuration
    // defect; nothing is served under the original path.
    let mut response = match decision {
        Decision::Continue => next.run(req).await,
        Decision::RedirectTo(target) => match HeaderValue::from_str(&target) {
            Ok(location) => (StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response(),
            Err(_) => unusable_target(&path, &target),
        },
        Decision::RewriteTo(target) => match rewrite_uri(req.uri(), &target) {
            Some(uri) => {
                *req.uri_mut() = uri;
                next.run(req).await
            }
            None => unusable_target(&path, &target),
        },
    };

    if let Some(cookie) = cookie_update {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

fn unusable_target(path: &str, target: &str) -> Response {
    tracing::error!(path = %path, target = %target, "Routing target is not a valid URI");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

fn rewrite_uri(original: &Uri, target: &str) -> Option<Uri> {
    let mut parts = original.clone().into_parts();
    parts.path_and_query = Some(target.parse::<PathAndQuery>().ok()?);
    Uri::from_parts(parts).ok()
}
