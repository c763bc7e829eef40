//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! scheduler / bundle / blockchain
//!     → tracing events with structured fields (label, gwei figures, target block)
//!     → logging.rs (EnvFilter + fmt layer, pretty or JSON, stderr)
//! ```
//!
//! Human-readable reports go to stdout; logs go to stderr so the two can be
//! separated.

pub mod logging;

pub use logging::{init_logging, LogFormat};
