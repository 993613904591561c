//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the wait for upstream response headers
//! - Cancel the upstream call cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future aborts the call
//! - Timeout errors are distinct from transport errors
//! - Timed-out requests return 504 Gateway Timeout
//! - Streamed bodies are not covered, so long downloads are not cut off

use std::future::Future;
use std::time::Duration;

use crate::http::error::ProxyError;

/// Await upstream response headers for at most `deadline`.
pub async fn await_upstream<F>(deadline: Duration, send: F) -> Result<reqwest::Response, ProxyError>
where
    F: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let secs = deadline.as_secs();
    match tokio::time::timeout(deadline, send).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) if e.is_timeout() => Err(ProxyError::UpstreamTimeout { secs }),
        Ok(Err(e)) => Err(ProxyError::UpstreamUnavailable(e)),
        Err(_) => Err(ProxyError::UpstreamTimeout { secs }),
    }
}
