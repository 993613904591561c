//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (connect timeout on the client, header deadline per call)
//!     → On failure: surfaced once to the caller
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: forwarded requests may be non-idempotent
//! - Client disconnects drop the handler future and cancel the upstream call

pub mod timeouts;
