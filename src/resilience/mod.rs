//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Relay request:
//!     → retries.rs (retry transient transport errors)
//!     → backoff.rs (exponential delay + jitter between attempts)
//!
//! Long waits:
//!     → deadline.rs (deadline sleep raced against shutdown)
//! ```
//!
//! # Design Decisions
//! - Only transport failures are retried; simulation failures and reverts never are
//! - Every wait has an explicit deadline and can be cancelled

pub mod backoff;
pub mod deadline;
pub mod retries;
