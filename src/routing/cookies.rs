//! Cookie reading and role-cookie emission.

use axum::http::header::{HeaderMap, HeaderValue, COOKIE};

/// First value of cookie `name` across all `Cookie` headers.
/// Empty values count as absent.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` storing the role hint, host-only.
pub fn role_cookie(name: &str, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}={value}; Path=/; SameSite=Lax")).ok()
}

/// `Set-Cookie` deleting the role hint.
pub fn clear_role_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}=; Path=/; SameSite=Lax; Max-Age=0")).ok()
}
