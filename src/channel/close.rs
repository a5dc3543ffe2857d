//! Graceful close with abort fallback.

use tokio::sync::Mutex;

use crate::channel::{Channel, CommunicationState};
use crate::error::{ChannelError, ChannelResult};
use crate::resilience::{classify_chain, FaultClassifier};

/// Close `channel`, or abort it if it reports itself faulted.
///
/// A transport-classified close error is expected once the transport has
/// already failed: it is logged and the channel aborted. Any other error is
/// logged, the channel aborted, and the error returned.
pub async fn shutdown_channel<C>(channel: &C, classifier: &dyn FaultClassifier) -> ChannelResult<()>
where
    C: Channel + ?Sized,
{
    let Some(closable) = channel.closable() else {
        return Err(ChannelError::InvalidState(
            "channel does not expose a close capability".to_string(),
        ));
    };

    let state = channel.communication_state();
    if state == CommunicationState::Faulted {
        tracing::debug!("Channel is faulted, aborting");
        closable.abort();
        return Ok(());
    }

    tracing::debug!(state = ?state, "Closing channel");
    match closable.close().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let reported = Some(channel.communication_state());
            if classify_chain(classifier, &*e, reported).is_some() {
                tracing::warn!(error = %e, "Transport error while closing channel, aborting");
                closable.abort();
                Ok(())
            } else {
                tracing::error!(error = %e, "Unexpected error while closing channel, aborting and rethrowing");
                closable.abort();
                Err(ChannelError::Close(e))
            }
        }
    }
}

/// Close `channel` under `lock` so concurrent requests serialize.
///
/// The first caller closes the channel. A caller arriving while the close is
/// underway waits for it to finish and returns without closing again.
pub async fn close_exclusive<C>(
    channel: &C,
    lock: &Mutex<()>,
    classifier: &dyn FaultClassifier,
) -> ChannelResult<()>
where
    C: Channel + ?Sized,
{
    match lock.try_lock() {
        Ok(_guard) => shutdown_channel(channel, classifier).await,
        Err(_) => {
            tracing::debug!("Channel is already being closed, waiting for it to finish");
            drop(lock.lock().await);
            tracing::debug!("Waiting for channel close finished");
            Ok(())
        }
    }
}
