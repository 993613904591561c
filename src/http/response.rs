//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay upstream status and headers to the client
//! - Strip hop-by-hop headers
//! - Turn upstream `Set-Cookie` headers into host-only cookies
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered
//! - Cookie attributes other than `Domain` are preserved byte for byte

use axum::http::header::{HeaderMap, HeaderValue, SET_COOKIE};

use crate::security::headers::strip_hop_by_hop;

/// Remove every `Domain` attribute from a `Set-Cookie` value.
pub fn strip_cookie_domain(value: &HeaderValue) -> HeaderValue {
    let kept: Vec<&[u8]> = value
        .as_bytes()
        .split(|b| *b == b';')
        .enumerate()
        .filter(|(index, attribute)| *index == 0 || !is_domain_attribute(attribute))
        .map(|(_, attribute)| attribute)
        .collect();

    let joined = kept.join(&b';');
    HeaderValue::from_bytes(&joined).unwrap_or_else(|_| value.clone())
}

fn is_domain_attribute(attribute: &[u8]) -> bool {
    let name = attribute
        .split(|b| *b == b'=')
        .next()
        .unwrap_or_default()
        .trim_ascii();
    name.eq_ignore_ascii_case(b"domain")
}

/// Headers sent to the client for an upstream response.
pub fn relay_headers(upstream: &HeaderMap, host_only_cookies: bool) -> HeaderMap {
    let mut headers = upstream.clone();
    strip_hop_by_hop(&mut headers);

    if host_only_cookies {
        let cookies: Vec<HeaderValue> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(strip_cookie_domain)
            .collect();
        headers.remove(SET_COOKIE);
        for cookie in cookies {
            headers.append(SET_COOKIE, cookie);
        }
    }

    headers
}
