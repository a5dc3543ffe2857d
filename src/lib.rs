//! Resilient lifecycle management for a single shared RPC channel.
//!
//! A [`ChannelManager`] owns one channel to a remote service. Concurrent
//! callers run actions through it; when an action hits a transport fault the
//! channel is disposed, recreated and the action retried, escalating if the
//! same fault comes straight back. Creation backs off while the endpoint is
//! unreachable and never races a disposal silently.
//!
//! ```text
//!   caller ──▶ executor ──▶ manager ──▶ factory
//!                 │            │
//!                 │            ├── hooks (cancel / conflict / failure)
//!                 │            └── backoff + disposal signal
//!                 └── classifier (transport fault? which category?)
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use channel::{Channel, ChannelFactory, ChannelState, Closable, CommunicationState};
pub use config::ManagerConfig;
pub use error::{BoxError, ChannelError, ChannelResult, TransportError, TransportErrorKind};
pub use lifecycle::{ChannelManager, Outcome, SkipReason};
pub use resilience::{DefaultFaultClassifier, Fault, FaultClassifier, FaultKind};
