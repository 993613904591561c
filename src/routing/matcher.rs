//! Path matching primitives.
//!
//! # Responsibilities
//! - Normalize request paths (dot segments, trailing slashes)
//! - Segment-aware prefix matching
//! - Recognize static assets and framework-internal fetches
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix without a trailing slash matches on segment boundaries only:
//!   `/admin` matches `/admin` and `/admin/x`, never `/administrator`
//! - No regex to guarantee O(n) matching
//! - `.` and `..` segments are resolved exactly as the outbound URL parser
//!   would resolve them, so every check sees the path that is finally fetched

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DotSegment {
    Current,
    Parent,
}

/// Classify `.`/`..` segments, including their `%2e` spellings.
fn dot_segment(segment: &str) -> Option<DotSegment> {
    match segment.to_ascii_lowercase().replace("%2e", ".").as_str() {
        "." => Some(DotSegment::Current),
        ".." => Some(DotSegment::Parent),
        _ => None,
    }
}

/// Resolve `.` and `..` segments. Returns `None` when the path has none.
///
/// Backslashes separate segments like slashes do, matching how `http(s)`
/// URLs are parsed. `..` above the root stays at the root.
pub fn resolve_dot_segments(path: &str) -> Option<String> {
    let rest = path.strip_prefix(['/', '\\']).unwrap_or(path);
    let segments: Vec<&str> = rest.split(['/', '\\']).collect();
    if !segments.iter().any(|segment| dot_segment(segment).is_some()) {
        return None;
    }

    let last = segments.len() - 1;
    let mut resolved: Vec<&str> = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        match dot_segment(segment) {
            Some(kind) => {
                if kind == DotSegment::Parent {
                    resolved.pop();
                }
                if index == last {
                    resolved.push("");
                }
            }
            None => resolved.push(segment),
        }
    }
    Some(format!("/{}", resolved.join("/")))
}

/// Resolve dot segments and strip trailing slashes, keeping the root path
/// as `/`.
pub fn normalize_path(path: &str) -> String {
    let resolved = resolve_dot_segments(path);
    let trimmed = resolved.as_deref().unwrap_or(path).trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// True if `path` equals `prefix` or lies beneath it.
pub fn under_prefix(path: &str, prefix: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix) || path == prefix.trim_end_matches('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// True if any `key` of the query string is one of `markers`.
pub fn has_query_marker(query: Option<&str>, markers: &[String]) -> bool {
    let Some(query) = query else {
        return false;
    };
    url::form_urlencoded::parse(query.as_bytes())
        .any(|(key, _)| markers.iter().any(|marker| marker.as_str() == key))
}

/// Matches paths that are served as static files and never gated.
#[derive(Debug, Clone, Default)]
pub struct AssetMatcher {
    prefixes: Vec<String>,
    files: Vec<String>,
    extensions: Vec<String>,
}

impl AssetMatcher {
    pub fn new(prefixes: Vec<String>, files: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            prefixes,
            files,
            extensions: extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.files.iter().any(|file| file == path) {
            return true;
        }
        if self.prefixes.iter().any(|prefix| under_prefix(path, prefix)) {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|known| *known == ext)
            }
            _ => false,
        }
    }
}
