//! Error types for channel lifecycle management.

use thiserror::Error;

/// Boxed error produced by collaborators (factories, actions, close calls).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the channel manager and operation executor.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The manager is missing a required collaborator.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Creation was requested while the channel is being disposed and no
    /// conflict hook is registered to resolve it.
    #[error("Channel creation aborted because the channel is currently disposing; register a disposal conflict hook to resolve this")]
    LifecycleConflict,

    /// The stored handle cannot be used for the requested lifecycle step.
    #[error("Invalid channel state: {0}")]
    InvalidState(String),

    /// The factory failed with an error that is not retried.
    #[error("Channel factory failed: {0}")]
    Factory(#[source] BoxError),

    /// Closing the channel failed with a non-transport error.
    #[error("Channel close failed: {0}")]
    Close(#[source] BoxError),

    /// The action failed with no recognised transport cause, or the same
    /// transport fault recurred after the channel was recreated.
    #[error("{message}: {error}")]
    Unclassified {
        message: String,
        #[source]
        error: BoxError,
        /// The fault seen before recreation, when escalating a repeat.
        previous: Option<BoxError>,
    },
}

impl ChannelError {
    /// Returns true if this error is an escalated repeat of a transport fault.
    pub fn is_repeated_fault(&self) -> bool {
        matches!(self, ChannelError::Unclassified { previous: Some(_), .. })
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Kinds of transport-level failure a channel or factory may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Nothing is listening at the endpoint.
    EndpointNotFound,
    /// The channel entered the faulted state.
    Faulted,
    /// The call or handshake timed out.
    Timeout,
    /// Any other communication failure.
    Communication,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::EndpointNotFound => "endpoint_not_found",
            TransportErrorKind::Faulted => "faulted",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Communication => "communication",
        }
    }
}

/// Transport fault raised by channels and factories.
///
/// The default classifier recognises this type anywhere in a `source()` chain.
#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn endpoint_not_found(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::EndpointNotFound, message)
    }

    pub fn faulted(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Faulted, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Communication, message)
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}
