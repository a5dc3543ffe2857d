//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Factory or action fails:
//!     → classify.rs (walk the cause chain, find a transport fault)
//!     → Endpoint unreachable: backoff.rs (additive, capped wait) then retry creation
//!     → Transport fault: executor disposes, recreates, retries the action
//! ```
//!
//! # Design Decisions
//! - Backoff is deterministic: initial + n * step, clamped to a maximum
//! - Classification is pluggable; the default knows `TransportError` and io errors
//! - Fault repetition is judged by classified category, not by error type

pub mod backoff;
pub mod classify;

pub use backoff::CreationBackoff;
pub use classify::{
    classify_chain, DefaultFaultClassifier, Fault, FaultCategory, FaultClassifier, FaultKind,
};
