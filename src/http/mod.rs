//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing)
//!     → middleware/edge_router.rs (redirect, rewrite or continue)
//!     → proxy.rs (forward to API upstream or page renderer)
//!         → security::headers (forwarded request headers)
//!         → response.rs (relay headers, host-only cookies, streamed body)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
