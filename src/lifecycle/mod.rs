//! Channel lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Caller action (executor.rs):
//!     → no channel? manager.rs creates one (hooks.rs may cancel)
//!     → run action against the channel
//!     → transport fault: dispose + recreate, run again
//!     → same fault category twice: escalate
//!
//! Creation (manager.rs):
//!     creating hook → disposal probe → create lock → factory loop with backoff
//!
//! Disposal (manager.rs):
//!     dispose lock → raise signal.rs → wait out creation → clear handle → close/abort
//! ```
//!
//! # Design Decisions
//! - Two lock domains; creation only probes the dispose lock, never holds it
//! - Creation racing a disposal fails loudly unless a hook resolves it
//! - Skipped operations are reported as `Outcome::Skipped`, not as success

pub mod executor;
pub mod hooks;
pub mod manager;
pub mod signal;

pub use executor::{OperationPhase, Outcome, SkipReason};
pub use hooks::{ConflictAction, CreationCancel, CreationFailure, DisposalConflict, LifecycleHooks};
pub use manager::{ChannelManager, ChannelManagerBuilder};
pub use signal::DisposalSignal;
