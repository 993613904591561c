//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request leaving for an upstream:
//!     → headers.rs (strip host/origin/hop-by-hop, add X-Forwarded-*)
//! Response coming back:
//!     → http::response (Set-Cookie Domain stripping)
//! ```
//!
//! # Design Decisions
//! - Upstream cookies become host-only on the gateway's origin
//! - Role hints are never treated as credentials

pub mod headers;
