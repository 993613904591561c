//! Request forwarding.
//!
//! # Responsibilities
//! - Forward a request of any supported method to a target URL
//! - Buffer request bodies (bounded); never send one for GET/HEAD
//! - Relay the upstream status, headers and streamed body
//!
//! # Design Decisions
//! - The client never follows redirects; the upstream's own status and
//!   `Location` reach the caller
//! - One attempt per request, no retries
//! - Cookie rewriting is opt-in so the page relay can share this path

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Method, Request};
use axum::response::Response;
use http_body_util::LengthLimitError;

use crate::http::error::ProxyError;
use crate::http::request::peer_ip;
use crate::http::response::relay_headers;
use crate::resilience::timeouts::await_upstream;
use crate::security::headers::forwarded_request_headers;

/// Per-call forwarding limits.
#[derive(Debug, Clone, Copy)]
pub struct ForwardOptions {
    pub response_timeout: Duration,
    pub max_body_bytes: usize,
    /// Strip `Domain` from upstream `Set-Cookie` headers.
    pub host_only_cookies: bool,
}

/// Build the shared outbound client.
pub fn build_client(connect_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(connect_timeout)
        .no_proxy()
        .build()
}

/// Buffer the request body, refusing anything above `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let too_large = std::error::Error::source(&e)
            .is_some_and(|source| source.is::<LengthLimitError>());
        if too_large {
            ProxyError::BodyTooLarge { limit }
        } else {
            ProxyError::BodyRead(e.to_string())
        }
    })
}

/// Forward `request` to `target` and relay the answer.
pub async fn forward(
    client: &reqwest::Client,
    request: Request<Body>,
    target: &str,
    options: ForwardOptions,
) -> Result<Response, ProxyError> {
    let peer = peer_ip(&request);
    let (parts, body) = request.into_parts();
    let headers = forwarded_request_headers(&parts.headers, peer);

    let mut outbound = client
        .request(parts.method.clone(), target)
        .headers(headers);

    if parts.method != Method::GET && parts.method != Method::HEAD {
        let bytes = read_body(body, options.max_body_bytes).await?;
        outbound = outbound.body(bytes);
    }

    let upstream = await_upstream(options.response_timeout, outbound.send())
        .await
        .inspect_err(|e| {
            tracing::error!(method = %parts.method, target = %target, error = %e, "Upstream request failed");
        })?;

    let status = upstream.status();
    let headers = relay_headers(upstream.headers(), options.host_only_cookies);

    tracing::debug!(method = %parts.method, target = %target, status = %status, "Upstream responded");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let bytes = read_body(Body::from("12345678"), 8).await.unwrap();
        assert_eq!(&bytes[..], b"12345678");
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let err = read_body(Body::from("twenty bytes of data"), 8).await.unwrap_err();
        assert!(matches!(err, ProxyError::BodyTooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn test_read_body_broken_stream() {
        let chunks = futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
        ]);
        let err = read_body(Body::from_stream(chunks), 1024).await.unwrap_err();
        assert!(matches!(err, ProxyError::BodyRead(_)));
    }
}
