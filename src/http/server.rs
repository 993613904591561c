//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: reverse proxy route + page relay fallback
//! - Wrap everything in the edge router middleware
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener and shut down gracefully
//!
//! # Layout
//! ```text
//! outer Router (request id, trace, edge router)
//!     └── fallback_service: inner Router
//!             ├── /api/v1, /api/v1/{*rest}  → proxy_handler (API upstream)
//!             └── fallback                  → page_handler (page renderer)
//! ```
//! The edge router sits on the outer router so that a rewritten URI is what
//! the inner router matches on.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{EdgeConfig, OriginError, UpstreamOrigin};
use crate::http::error::ProxyError;
use crate::http::middleware::{edge_router_middleware, EdgeRouter};
use crate::http::proxy::{build_client, forward, ForwardOptions};
use crate::http::request::{propagate_request_id_layer, proxy_remainder, request_id, set_request_id_layer};
use crate::lifecycle::shutdown_signal;
use crate::observability::metrics;
use crate::routing::matcher::resolve_dot_segments;
use crate::routing::RoutingPolicy;

/// Error type for server construction.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("frontend.origin is invalid: {0}")]
    Frontend(String),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    /// Resolved once at startup; an error is reported on every proxied request.
    pub upstream: Arc<Result<UpstreamOrigin, OriginError>>,
    pub frontend: Option<Arc<UpstreamOrigin>>,
    pub proxy_prefix: Arc<str>,
    pub api_forward: ForwardOptions,
    pub page_forward: ForwardOptions,
}

/// HTTP server for the edge gateway.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
}

impl HttpServer {
    /// Create a new HTTP server from a validated configuration and the
    /// resolved upstream origin.
    pub fn new(
        config: EdgeConfig,
        upstream: Result<UpstreamOrigin, OriginError>,
    ) -> Result<Self, ServerError> {
        let policy = RoutingPolicy::from_config(&config.routing);
        let client = build_client(Duration::from_secs(config.upstream.connect_timeout_secs))?;

        let frontend = config
            .frontend
            .origin
            .as_deref()
            .map(UpstreamOrigin::parse)
            .transpose()
            .map_err(ServerError::Frontend)?
            .map(Arc::new);

        let api_forward = ForwardOptions {
            response_timeout: Duration::from_secs(config.upstream.response_timeout_secs),
            max_body_bytes: config.upstream.max_body_bytes,
            host_only_cookies: true,
        };
        let page_forward = ForwardOptions {
            host_only_cookies: false,
            ..api_forward
        };

        let state = AppState {
            client,
            upstream: Arc::new(upstream),
            frontend,
            proxy_prefix: Arc::from(policy.proxy_prefix()),
            api_forward,
            page_forward,
        };
        let edge = Arc::new(EdgeRouter::new(policy, &config.session));

        let router = Self::build_router(state, edge);
        Ok(Self { router, config })
    }

    fn build_router(state: AppState, edge: Arc<EdgeRouter>) -> Router {
        let prefix = state.proxy_prefix.to_string();
        let api: MethodRouter<AppState> = get(proxy_handler)
            .head(proxy_handler)
            .post(proxy_handler)
            .put(proxy_handler)
            .patch(proxy_handler)
            .delete(proxy_handler)
            .options(proxy_handler);

        let inner = Router::new()
            .route(&prefix, api.clone())
            .route(&format!("{prefix}/"), api.clone())
            .route(&format!("{prefix}/{{*rest}}"), api)
            .fallback(page_handler)
            .with_state(state);

        Router::new()
            .fallback_service(inner)
            .layer(from_fn_with_state(edge, edge_router_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The fully layered application, e.g. for `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Serve until SIGINT/SIGTERM or a `Shutdown` broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Reverse proxy: forward everything below the proxy prefix to the API.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let origin = match state.upstream.as_ref() {
        Ok(origin) => origin,
        Err(e) => {
            tracing::error!(
                request_id = %request_id(request.headers()),
                method = %method,
                path = %request.uri().path(),
                error = %e,
                "Proxy request rejected: upstream origin unresolved"
            );
            let response = ProxyError::Misconfigured(e.clone()).into_response();
            metrics::record_proxy_request(method.as_str(), response.status().as_u16(), start);
            return response;
        }
    };

    // The target must stay beneath the API base path once the client
    // library resolves it.
    if resolve_dot_segments(request.uri().path()).is_some() {
        let response = ProxyError::InvalidPath.into_response();
        metrics::record_proxy_request(method.as_str(), response.status().as_u16(), start);
        return response;
    }

    let remainder = proxy_remainder(request.uri().path(), &state.proxy_prefix);
    let target = origin.api_url(remainder, request.uri().query());

    let response = forward(&state.client, request, &target, state.api_forward)
        .await
        .unwrap_or_else(IntoResponse::into_response);

    metrics::record_proxy_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// Page serving: relay to the page renderer.
async fn page_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let Some(frontend) = state.frontend.as_deref() else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    let target = frontend.join(request.uri().path(), request.uri().query());
    forward(&state.client, request, &target, state.page_forward)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}
