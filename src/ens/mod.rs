//! ENS name registration via commit-reveal.
//!
//! # Data Flow
//! ```text
//! operator names
//!     → label.rs (UTS-46 canonical label, namehash, token id)
//!     → scheduler.rs (per-label state machine)
//!         → gateway.rs (controller / registry / resolver calls)
//!         → store.rs (durable commitment record per label)
//!         → records.rs (resolver records after registration)
//! ```

pub mod contracts;
pub mod gateway;
pub mod label;
pub mod records;
pub mod scheduler;
pub mod store;

pub use contracts::{CommitmentParams, EnsContracts};
pub use gateway::{EnsGateway, RegistrarGateway};
pub use label::EnsLabel;
pub use records::{RecordFailure, RecordRequest};
pub use scheduler::{
    BatchReport, CommitRevealScheduler, LabelReport, LabelState, RunMode, SchedulerOptions,
};
pub use store::{CommitmentRecord, CommitmentStatus, CommitmentStore};
