//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tokio::net::TcpListener;
use tower::ServiceExt;

use console_edge::config::{EdgeConfig, OriginError, UpstreamOrigin};
use console_edge::HttpServer;

/// A request as received by the mock upstream.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Mock upstream serving both as API and as page renderer.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockUpstream {
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Seen {
        self.seen().pop().expect("upstream received no request")
    }
}

async fn record(State(seen): State<Arc<Mutex<Vec<Seen>>>>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();

    seen.lock().unwrap().push(Seen {
        method: parts.method,
        uri: uri.clone(),
        headers: parts.headers,
        body,
    });

    match parts.uri.path() {
        "/api/v1/cookies" => Response::builder()
            .status(StatusCode::OK)
            .header(header::SET_COOKIE, "session=abc; Domain=api.example.com; Path=/")
            .header(
                header::SET_COOKIE,
                "refresh=xyz; Path=/auth; domain=.example.com; HttpOnly; Secure",
            )
            .body(Body::from("cookies"))
            .unwrap(),
        "/api/v1/redirect" => Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "https://api.example.com/elsewhere")
            .body(Body::empty())
            .unwrap(),
        "/api/v1/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, "finally").into_response()
        }
        "/api/v1/stream" => {
            let chunks = futures_util::stream::unfold(0u8, |step| async move {
                match step {
                    0 => Some((Ok::<_, std::io::Error>(Bytes::from_static(b"first;")), 1)),
                    1 => {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        Some((Ok(Bytes::from_static(b"second")), 2))
                    }
                    _ => None,
                }
            });
            Response::new(Body::from_stream(chunks))
        }
        "/api/v1/missing" => (StatusCode::NOT_FOUND, "no such thing").into_response(),
        _ => (StatusCode::OK, [("x-upstream", "mock")], format!("served {uri}")).into_response(),
    }
}

/// Start a mock upstream on an ephemeral port that records every request.
pub async fn start_mock_upstream() -> MockUpstream {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(record).with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream { addr, seen }
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway router with the given upstream resolution.
pub fn gateway(config: EdgeConfig, upstream: Result<UpstreamOrigin, OriginError>) -> Router {
    HttpServer::new(config, upstream).unwrap().router()
}

/// Gateway whose API upstream and page renderer are both `mock`.
pub fn gateway_for(mock: &MockUpstream) -> Router {
    let mut config = EdgeConfig::default();
    config.frontend.origin = Some(mock.origin());
    gateway(config, Ok(UpstreamOrigin::parse(&mock.origin()).unwrap()))
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Unsigned JWT-shaped token carrying `payload`.
pub fn token(payload: &str) -> String {
    format!(
        "{}.{}.unsigned",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .header(header::HOST, "console.example.org");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}
