//! Channel abstraction.
//!
//! # Responsibilities
//! - Describe what the manager needs from a remote channel handle
//! - Report the channel's own connectivity state
//! - Close gracefully or abort when the transport is already broken
//!
//! # Design Decisions
//! - The close capability is optional: a handle that cannot be closed is an
//!   invalid state for disposal, not a compile error
//! - Factories are plain async closures via a blanket impl

mod close;
mod factory;
mod state;

use async_trait::async_trait;

use crate::error::BoxError;

pub use close::{close_exclusive, shutdown_channel};
pub use factory::ChannelFactory;
pub use state::{ChannelState, CommunicationState};

/// Graceful and forced termination of a channel.
#[async_trait]
pub trait Closable: Send + Sync {
    /// Close gracefully; may fail with a transport error.
    async fn close(&self) -> Result<(), BoxError>;

    /// Tear down immediately. Never fails.
    fn abort(&self);
}

/// A proxy to the remote service.
pub trait Channel: Send + Sync + 'static {
    /// The channel's own view of its connectivity.
    fn communication_state(&self) -> CommunicationState;

    /// The close capability, if the handle has one.
    fn closable(&self) -> Option<&dyn Closable>;
}
