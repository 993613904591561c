//! Edge routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query, cookies)
//!     → cookies.rs (session token, role cookie)
//!     → role.rs (role hint: cookie, else unverified token payload)
//!     → router.rs (decision table)
//!     → Return: Continue | RedirectTo | RewriteTo
//!
//! Policy Compilation (at startup):
//!     RoutingConfig
//!     → Normalize paths, sort aliases
//!     → Freeze as immutable RoutingPolicy
//! ```
//!
//! # Design Decisions
//! - Policy compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same decision
//! - Role hints steer UX only; they never authorize anything

pub mod cookies;
pub mod matcher;
pub mod role;
pub mod router;

pub use role::{resolve_role, RoleHint, RoleResolution, RoleSource};
pub use router::{Decision, RouteInput, RoutingPolicy};
