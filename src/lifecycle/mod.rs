//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! SIGINT (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → every cancellable wait returns Cancelled
//!     → main maps Cancelled to exit status 130
//! ```
//!
//! State is persisted before any long wait begins, so a cancelled run can be
//! resumed with a reveal-only invocation.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
