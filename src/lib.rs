//! ENS transaction orchestration.
//!
//! Two flows share one fee policy and one RPC layer:
//!
//! ```text
//!   register                                   rescue
//!      │                                          │
//!      ▼                                          ▼
//! ┌───────────────────┐                  ┌──────────────────┐
//! │ ens::scheduler    │                  │ bundle::builder  │
//! │ commit → mature → │                  │ preflight, fund +│
//! │ reveal → records  │                  │ transfer, signed │
//! └──┬─────────┬──────┘                  └────────┬─────────┘
//!    │         │                                  ▼
//!    │   ┌─────▼──────┐                  ┌──────────────────┐
//!    │   │ ens::store │                  │ bundle::retry    │
//!    │   │ JSON/label │                  │ N+1 target blocks│
//!    │   └────────────┘                  └────────┬─────────┘
//!    ▼                                            ▼
//! ┌──────────────────────────────┐       ┌──────────────────┐
//! │ blockchain (client, wallet,  │◀──────│ bundle::relay    │
//! │ tx sender) + fees            │       │ private relay    │
//! └──────────────────────────────┘       └──────────────────┘
//! ```

pub mod blockchain;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod ens;
pub mod error;
pub mod fees;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use lifecycle::Shutdown;
