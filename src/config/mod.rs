//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env endpoint overrides)
//!     → validation.rs (semantic checks)
//!     → OrchestratorConfig (validated, immutable)
//!     → passed by reference into each component at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing reads the environment mid-flow
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Private keys never live in the config file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    EnsConfig, FeeConfig, NetworkConfig, ObservabilityConfig, OrchestratorConfig, RescueConfig,
    RetryConfig, StoreConfig,
};
