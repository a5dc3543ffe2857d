//! Transport fault classification.
//!
//! # Responsibilities
//! - Decide whether an error means the channel itself is unusable
//! - Tag the fault with a category for the "same fault twice" check
//! - Recognise "endpoint unreachable" so creation can back off and retry

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::channel::CommunicationState;
use crate::error::{TransportError, TransportErrorKind};

/// How a transport fault affects the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Nothing answered at the endpoint; creation may retry with backoff.
    EndpointUnreachable,
    /// The channel broke; it should be disposed and recreated.
    Transport,
}

/// Fine-grained tag compared between consecutive faults of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaultCategory(Cow<'static, str>);

impl FaultCategory {
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A classified transport fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub category: FaultCategory,
}

impl Fault {
    pub fn transport(category: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: FaultKind::Transport,
            category: FaultCategory::new(category),
        }
    }

    pub fn endpoint_unreachable(category: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: FaultKind::EndpointUnreachable,
            category: FaultCategory::new(category),
        }
    }
}

/// Decides whether a single error is a transport fault.
///
/// Implementations look at one error only; [`classify_chain`] walks the
/// `source()` chain and returns the first match.
pub trait FaultClassifier: Send + Sync {
    fn classify(
        &self,
        error: &(dyn StdError + 'static),
        reported_state: Option<CommunicationState>,
    ) -> Option<Fault>;
}

impl<F> FaultClassifier for F
where
    F: Fn(&(dyn StdError + 'static), Option<CommunicationState>) -> Option<Fault> + Send + Sync,
{
    fn classify(
        &self,
        error: &(dyn StdError + 'static),
        reported_state: Option<CommunicationState>,
    ) -> Option<Fault> {
        self(error, reported_state)
    }
}

/// Walk `error` and its causes, returning the first transport fault found.
pub fn classify_chain(
    classifier: &dyn FaultClassifier,
    error: &(dyn StdError + 'static),
    reported_state: Option<CommunicationState>,
) -> Option<Fault> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(fault) = classifier.classify(err, reported_state) {
            return Some(fault);
        }
        current = err.source();
    }
    None
}

/// Classifier that understands [`TransportError`] and connection-level
/// `std::io::Error`s.
///
/// When nothing in the chain matches but the channel reports itself as
/// faulted, the error is treated as a `faulted` transport fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFaultClassifier;

impl DefaultFaultClassifier {
    fn classify_io(err: &io::Error) -> Option<Fault> {
        match err.kind() {
            io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable => {
                Some(Fault::endpoint_unreachable("io_connection_refused"))
            }
            io::ErrorKind::ConnectionReset => Some(Fault::transport("io_connection_reset")),
            io::ErrorKind::ConnectionAborted => Some(Fault::transport("io_connection_aborted")),
            io::ErrorKind::BrokenPipe => Some(Fault::transport("io_broken_pipe")),
            io::ErrorKind::NotConnected => Some(Fault::transport("io_not_connected")),
            io::ErrorKind::TimedOut => Some(Fault::transport("io_timed_out")),
            io::ErrorKind::UnexpectedEof => Some(Fault::transport("io_unexpected_eof")),
            _ => None,
        }
    }
}

impl FaultClassifier for DefaultFaultClassifier {
    fn classify(
        &self,
        error: &(dyn StdError + 'static),
        reported_state: Option<CommunicationState>,
    ) -> Option<Fault> {
        if let Some(transport) = error.downcast_ref::<TransportError>() {
            let category = transport.kind.as_str();
            return Some(match transport.kind {
                TransportErrorKind::EndpointNotFound => Fault::endpoint_unreachable(category),
                _ => Fault::transport(category),
            });
        }
        if let Some(io_err) = error.downcast_ref::<io::Error>() {
            if let Some(fault) = Self::classify_io(io_err) {
                return Some(fault);
            }
        }
        // The state fallback applies to the innermost cause only, after every
        // link has had its chance to classify concretely.
        if reported_state == Some(CommunicationState::Faulted) && error.source().is_none() {
            return Some(Fault::transport(TransportErrorKind::Faulted.as_str()));
        }
        None
    }
}
