//! Shutdown coordination for the gateway.
//!
//! `HttpServer::run` subscribes once and stops accepting connections when
//! the broadcast fires. In-flight proxied requests and streamed bodies are
//! drained by axum's graceful shutdown, not by this type.

use tokio::sync::broadcast;

/// Broadcasts a single stop request to every running server.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed server to stop. Returns how many were notified;
    /// zero when nothing is serving yet.
    pub fn trigger(&self) -> usize {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::info!(servers = notified, "Gateway shutdown requested");
        notified
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
