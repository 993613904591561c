//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Strip `host`, `content-length`, `origin` and hop-by-hop headers
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//!
//! # Design Decisions
//! - Preserve an existing X-Forwarded-For chain and append the peer
//! - Existing X-Forwarded-Proto / X-Forwarded-Host are left as sent
//! - `origin` is dropped: the forwarded call is server-to-server and must
//!   not trip the upstream's CORS checks

use std::net::IpAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Headers meaningful for a single connection only.
pub const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in HOP_BY_HOP.iter().copied().chain(listed.iter().map(String::as_str)) {
        headers.remove(name);
    }
}

/// Build the header set sent upstream from the inbound one.
pub fn forwarded_request_headers(inbound: &HeaderMap, peer: Option<IpAddr>) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::ORIGIN);

    let existing_chain = inbound
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let chain = match (existing_chain.is_empty(), peer) {
        (true, Some(ip)) => Some(ip.to_string()),
        (false, Some(ip)) => Some(format!("{existing_chain}, {ip}")),
        (false, None) => Some(existing_chain),
        (true, None) => None,
    };
    headers.remove(&X_FORWARDED_FOR);
    if let Some(value) = chain.and_then(|chain| HeaderValue::from_str(&chain).ok()) {
        headers.insert(X_FORWARDED_FOR, value);
    }

    if !headers.contains_key(&X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
    }
    if !headers.contains_key(&X_FORWARDED_HOST) {
        if let Some(host) = inbound.get(header::HOST) {
            headers.insert(X_FORWARDED_HOST, host.clone());
        }
    }

    headers
}
