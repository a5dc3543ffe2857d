//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Manager and executor produce:
//!     → tracing events (logging.rs installs the subscriber)
//!     → metrics.rs (counters, generation gauge)
//! ```
//!
//! # Design Decisions
//! - Library code only emits; installing a subscriber or recorder is the
//!   application's choice, and without one every call is a no-op
//! - Manager and operation IDs flow through log fields

pub mod logging;
pub mod metrics;
