//! Operation executor.
//!
//! Runs caller actions against the managed channel. A transport fault
//! disposes and recreates the channel and the action is retried; the same
//! fault category twice in a row escalates.
//!
//! # Per-call state machine
//! ```text
//! Invoking ──ok──────────────▶ Succeeded
//!    │ err
//!    ▼
//! ClassifyingFault ──no transport cause / repeated category──▶ Failed
//!    │ new category
//!    ▼
//! Recreating ──channel obtained──▶ Invoking
//!    │ no channel
//!    ▼
//! Skipped
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::channel::Channel;
use crate::error::{BoxError, ChannelError, ChannelResult};
use crate::lifecycle::manager::ChannelManager;
use crate::observability::metrics;
use crate::resilience::{classify_chain, FaultCategory};

/// Result of an operation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The action ran and returned a value.
    Completed(T),
    /// The action did not run to completion because no channel was available.
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    /// The value, if the action completed.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Skipped(_) => None,
        }
    }
}

/// Why an operation was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No channel existed and creating one yielded none; the action never ran.
    CreationCancelled,
    /// The action faulted and recreating the channel yielded none.
    RecreationCancelled,
}

/// Phase of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Invoking,
    ClassifyingFault,
    Recreating,
    Failed,
    Succeeded,
}

impl<C: Channel> ChannelManager<C> {
    /// Run `action` against the channel, recreating the channel on transport
    /// faults.
    pub async fn do_operation<F, Fut, E>(&self, action: F) -> ChannelResult<Outcome<()>>
    where
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Into<BoxError>,
    {
        self.call(action).await
    }

    /// Run `func` against the channel and return its value.
    pub async fn call<T, F, Fut, E>(&self, func: F) -> ChannelResult<Outcome<T>>
    where
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let op_id = Uuid::new_v4();
        let span = tracing::debug_span!("operation", manager_id = %self.id(), %op_id);
        self.execute(func).instrument(span).await
    }

    /// Run `action` on the tokio runtime and return immediately.
    ///
    /// Completion and errors are not observable by the caller; failures are
    /// logged. Must be called from within a tokio runtime.
    pub fn spawn_operation<F, Fut, E>(self: &Arc<Self>, action: F)
    where
        F: FnMut(Arc<C>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            match manager.do_operation(action).await {
                Ok(Outcome::Completed(())) => {}
                Ok(Outcome::Skipped(reason)) => {
                    tracing::debug!(manager_id = %manager.id(), reason = ?reason, "Background operation skipped");
                }
                Err(e) => {
                    tracing::error!(manager_id = %manager.id(), error = %e, "Background operation failed");
                }
            }
        });
    }

    async fn execute<T, F, Fut, E>(&self, mut action: F) -> ChannelResult<Outcome<T>>
    where
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let mut channel = match self.channel() {
            Some(channel) => channel,
            None => match self.create_channel_default().await? {
                Some(channel) => channel,
                None => {
                    tracing::debug!("Operation skipped because channel creation yielded no channel");
                    return Ok(Outcome::Skipped(SkipReason::CreationCancelled));
                }
            },
        };

        let mut attempts: u32 = 0;
        let mut previous: Option<(FaultCategory, BoxError)> = None;

        loop {
            attempts += 1;
            tracing::trace!(phase = ?OperationPhase::Invoking, attempts, "Invoking action");

            let error: BoxError = match action(channel.clone()).await {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::debug!(
                            phase = ?OperationPhase::Succeeded,
                            attempts,
                            "Action executed after {} attempts",
                            attempts
                        );
                    }
                    return Ok(Outcome::Completed(value));
                }
                Err(e) => e.into(),
            };

            tracing::trace!(phase = ?OperationPhase::ClassifyingFault, error = %error, "Action failed");
            let reported = channel.communication_state();
            let Some(fault) = classify_chain(self.classifier(), &*error, Some(reported)) else {
                tracing::debug!(phase = ?OperationPhase::Failed, error = %error, "No transport fault in error chain");
                return Err(ChannelError::Unclassified {
                    message: "An error occurred while executing the action".to_string(),
                    error,
                    previous: None,
                });
            };
            metrics::record_fault(fault.category.as_str());

            if let Some((previous_category, previous_error)) = previous.take() {
                if previous_category == fault.category {
                    metrics::record_escalation();
                    tracing::warn!(
                        phase = ?OperationPhase::Failed,
                        category = %fault.category,
                        attempts,
                        "Recreating the channel did not resolve the fault"
                    );
                    return Err(ChannelError::Unclassified {
                        message: format!(
                            "Channel recreation didn't resolve the '{}' fault",
                            fault.category
                        ),
                        error,
                        previous: Some(previous_error),
                    });
                }
            }

            tracing::warn!(
                phase = ?OperationPhase::Recreating,
                category = %fault.category,
                error = %error,
                attempts,
                "Transport fault while executing action, recreating the channel"
            );
            previous = Some((fault.category, error));

            match self.recreate_channel(&channel).await? {
                Some(fresh) => channel = fresh,
                None => {
                    tracing::debug!("Operation skipped because channel recreation yielded no channel");
                    return Ok(Outcome::Skipped(SkipReason::RecreationCancelled));
                }
            }
        }
    }

    /// Dispose `faulted` and create a replacement.
    ///
    /// If another caller already replaced the faulted channel, the
    /// replacement is used as is. If another caller already detached it, its
    /// disposal is awaited rather than repeated.
    async fn recreate_channel(&self, faulted: &Arc<C>) -> ChannelResult<Option<Arc<C>>> {
        match self.channel() {
            Some(current) if !Arc::ptr_eq(&current, faulted) => {
                tracing::debug!(generation = self.generation(), "Channel already recreated by another caller");
                return Ok(Some(current));
            }
            Some(_) => self.dispose_faulted(faulted).await?,
            None => {
                tracing::debug!("Faulted channel already detached by another caller");
                self.disposal_signal().cleared().await;
            }
        }
        self.create_channel_default().await
    }
}
