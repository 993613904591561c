//! Role hints for routing.
//!
//! A [`RoleHint`] is an *unverified* indication of which dashboard a visitor
//! belongs on. It is read from the role cookie or decoded from the session
//! token's payload without checking any signature, so it is only ever used to
//! pick a redirect target. Authorization is enforced by the upstream API; no
//! code in this crate grants access based on a hint.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

/// Advisory privilege tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleHint {
    Admin,
    SuperAdmin,
}

impl RoleHint {
    /// Parse a wire value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("admin") {
            Some(Self::Admin)
        } else if value.eq_ignore_ascii_case("super_admin") {
            Some(Self::SuperAdmin)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for RoleHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resolved hint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    Cookie,
    Token,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleResolution {
    pub hint: Option<RoleHint>,
    pub source: RoleSource,
}

/// Resolve the hint: a known role in the cookie wins, otherwise the token
/// payload is decoded. Without a token nothing is resolved.
pub fn resolve_role(token: Option<&str>, role_cookie: Option<&str>) -> RoleResolution {
    let Some(token) = token else {
        return RoleResolution {
            hint: None,
            source: RoleSource::None,
        };
    };

    if let Some(hint) = role_cookie.and_then(RoleHint::parse) {
        return RoleResolution {
            hint: Some(hint),
            source: RoleSource::Cookie,
        };
    }

    match decode_token_role(token) {
        Some(hint) => RoleResolution {
            hint: Some(hint),
            source: RoleSource::Token,
        },
        None => RoleResolution {
            hint: None,
            source: RoleSource::None,
        },
    }
}

/// Best-effort read of `role`, `user.role` or `claims.role` from the
/// token's middle segment. Any decode failure yields `None`.
pub fn decode_token_role(token: &str) -> Option<RoleHint> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    let role = [
        claims.get("role"),
        claims.get("user").and_then(|user| user.get("role")),
        claims.get("claims").and_then(|inner| inner.get("role")),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find_map(RoleHint::parse);
    role
}

#[cfg(test)]
pub(crate) fn token_with_payload(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}
