//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!
//! environment
//!     → origin.rs (ordered fallback, /api/v1 suffix stripping)
//!     → Result<UpstreamOrigin, OriginError>, resolved once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A missing upstream origin is not a startup failure: pages keep being
//!   served and only proxied requests report the defect

pub mod loader;
pub mod origin;
pub mod schema;
pub mod validation;

pub use loader::{ensure_valid, load_config, parse_config, ConfigError};
pub use origin::{resolve_from_env, resolve_origin, OriginError, UpstreamOrigin};
pub use schema::{
    AliasConfig, EdgeConfig, FrontendConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RoutingConfig, SessionConfig, UpstreamConfig,
};
