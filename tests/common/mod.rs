//! Shared mocks for lifecycle and operation tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rpc_channel_keeper::{BoxError, Channel, Closable, CommunicationState, TransportError};
use tokio::time::Instant;

/// What `close()` does on a mock channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseBehavior {
    Succeed,
    TransportError,
    OtherError,
    /// Succeed after sleeping, to widen race windows.
    Slow(Duration),
}

/// In-memory channel that counts how it was torn down.
#[derive(Debug)]
pub struct MockChannel {
    pub id: u32,
    state: Mutex<CommunicationState>,
    close_behavior: CloseBehavior,
    closable: bool,
    closes: AtomicU32,
    aborts: AtomicU32,
}

impl MockChannel {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            state: Mutex::new(CommunicationState::Opened),
            close_behavior: CloseBehavior::Succeed,
            closable: true,
            closes: AtomicU32::new(0),
            aborts: AtomicU32::new(0),
        }
    }

    pub fn with_close_behavior(mut self, behavior: CloseBehavior) -> Self {
        self.close_behavior = behavior;
        self
    }

    pub fn not_closable(mut self) -> Self {
        self.closable = false;
        self
    }

    pub fn set_state(&self, state: CommunicationState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> u32 {
        self.aborts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Closable for MockChannel {
    async fn close(&self) -> Result<(), BoxError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.close_behavior {
            CloseBehavior::Succeed => {}
            CloseBehavior::TransportError => {
                let err: BoxError =
                    Box::new(TransportError::communication("connection reset during close"));
                return Err(err);
            }
            CloseBehavior::OtherError => {
                let err: BoxError = "close handler failed".into();
                return Err(err);
            }
            CloseBehavior::Slow(delay) => tokio::time::sleep(delay).await,
        }
        self.set_state(CommunicationState::Closed);
        Ok(())
    }

    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.set_state(CommunicationState::Closed);
    }
}

impl Channel for MockChannel {
    fn communication_state(&self) -> CommunicationState {
        *self.state.lock().unwrap()
    }

    fn closable(&self) -> Option<&dyn Closable> {
        if self.closable {
            Some(self)
        } else {
            None
        }
    }
}

/// Factory that fails with "endpoint not found" a fixed number of times,
/// then hands out channels numbered by call. Records when each call happened.
#[derive(Clone)]
pub struct ScriptedFactory {
    failures_left: Arc<AtomicU32>,
    calls: Arc<AtomicU32>,
    call_times: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl ScriptedFactory {
    pub fn new(failures: u32) -> Self {
        Self {
            failures_left: Arc::new(AtomicU32::new(failures)),
            calls: Arc::new(AtomicU32::new(0)),
            call_times: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Never succeeds.
    pub fn unreachable() -> Self {
        Self::new(u32::MAX)
    }

    /// Make each successful call take `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Gaps between consecutive factory calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let times = self.call_times.lock().unwrap();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Closure suitable for `ChannelManagerBuilder::factory`.
    pub fn as_factory(
        &self,
    ) -> impl Fn() -> BoxFuture<'static, Result<MockChannel, BoxError>> + Send + Sync + 'static
    {
        let this = self.clone();
        move || {
            let this = this.clone();
            async move {
                let n = this.calls.fetch_add(1, Ordering::SeqCst) + 1;
                this.call_times.lock().unwrap().push(Instant::now());

                let remaining = this.failures_left.load(Ordering::SeqCst);
                if remaining > 0 {
                    if remaining != u32::MAX {
                        this.failures_left.fetch_sub(1, Ordering::SeqCst);
                    }
                    return Err::<MockChannel, BoxError>(Box::new(
                        TransportError::endpoint_not_found("no endpoint listening"),
                    ));
                }

                if !this.delay.is_zero() {
                    tokio::time::sleep(this.delay).await;
                }
                Ok(MockChannel::new(n))
            }
            .boxed()
        }
    }
}

/// Application-level error with no transport meaning.
#[derive(Debug, thiserror::Error)]
#[error("invalid argument: {0}")]
pub struct AppError(pub String);

/// Wraps a cause the way a generated service client would.
#[derive(Debug, thiserror::Error)]
#[error("service call failed")]
pub struct CallError(#[source] pub BoxError);
