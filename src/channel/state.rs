//! Channel state definitions.

use std::fmt;

/// Connectivity state reported by a channel about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommunicationState {
    Created,
    Opening,
    Opened,
    Closing,
    Closed,
    /// The transport failed; the only way out is abort.
    Faulted,
}

/// Lifecycle state of the manager's channel slot, derived from the stored
/// handle and the two lock domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// No handle stored.
    Absent,
    /// A creation critical section is running.
    Creating,
    /// A handle is stored and nothing is tearing it down.
    Ready,
    /// A disposal is in progress.
    Disposing,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelState::Absent => "absent",
            ChannelState::Creating => "creating",
            ChannelState::Ready => "ready",
            ChannelState::Disposing => "disposing",
        };
        f.write_str(s)
    }
}
