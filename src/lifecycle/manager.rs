//! Channel lifecycle manager.
//!
//! # Responsibilities
//! - Own the single channel handle
//! - Create it through the factory with additive backoff on unreachable endpoints
//! - Dispose it, closing gracefully or aborting
//! - Keep creation and disposal from running concurrently
//!
//! # Locking
//! ```text
//! create_lock   held for the whole creation loop; latecomers wait and adopt the result
//! dispose_lock  held for the whole disposal; concurrent disposers serialize
//! disposal      raised while disposing; wakes a sleeping creation retry
//! ```
//! Creation never acquires `dispose_lock`; it only probes it with `try_lock`
//! to detect a disposal in progress. Disposal detaches the stored handle at
//! once, then waits for `create_lock` to be free and detaches whatever that
//! creation produced before closing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::channel::{shutdown_channel, Channel, ChannelFactory, ChannelState};
use crate::config::{BackoffConfig, ManagerConfig};
use crate::error::{ChannelError, ChannelResult};
use crate::lifecycle::hooks::{
    ConflictAction, CreationCancel, CreationFailure, DisposalConflict, LifecycleHooks,
};
use crate::lifecycle::signal::DisposalSignal;
use crate::observability::metrics;
use crate::resilience::{
    classify_chain, CreationBackoff, DefaultFaultClassifier, FaultClassifier, FaultKind,
};

/// Owns one channel to a remote service and manages its lifecycle.
///
/// Shared by concurrent callers, typically behind an `Arc`. Reads of the
/// current handle are lock-free; only the manager replaces it.
pub struct ChannelManager<C: Channel> {
    id: Uuid,
    channel: ArcSwapOption<C>,
    factory: Option<Arc<dyn ChannelFactory<C>>>,
    classifier: Arc<dyn FaultClassifier>,
    hooks: LifecycleHooks,
    backoff: BackoffConfig,
    create_lock: Mutex<()>,
    dispose_lock: Mutex<()>,
    disposal: DisposalSignal,
    generation: AtomicU64,
}

impl<C: Channel> ChannelManager<C> {
    pub fn builder() -> ChannelManagerBuilder<C> {
        ChannelManagerBuilder::new()
    }

    /// Manager instance ID, attached to its log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The current channel, if one exists.
    pub fn channel(&self) -> Option<Arc<C>> {
        self.channel.load_full()
    }

    /// Number of channels created so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_disposing(&self) -> bool {
        self.dispose_lock.try_lock().is_err()
    }

    /// Derived lifecycle state.
    pub fn state(&self) -> ChannelState {
        if self.is_disposing() {
            ChannelState::Disposing
        } else if self.create_lock.try_lock().is_err() {
            ChannelState::Creating
        } else if self.channel.load().is_some() {
            ChannelState::Ready
        } else {
            ChannelState::Absent
        }
    }

    pub fn backoff_config(&self) -> &BackoffConfig {
        &self.backoff
    }

    pub(crate) fn classifier(&self) -> &dyn FaultClassifier {
        self.classifier.as_ref()
    }

    pub(crate) fn disposal_signal(&self) -> &DisposalSignal {
        &self.disposal
    }

    /// Create the channel with the configured backoff.
    pub async fn create_channel_default(&self) -> ChannelResult<Option<Arc<C>>> {
        self.create_channel(self.backoff.initial_wait_ms, self.backoff.max_wait_ms)
            .await
    }

    /// Create the channel, retrying while the endpoint is unreachable.
    ///
    /// Returns `Ok(None)` when a hook cancels or aborts creation. If another
    /// caller is already creating, waits for it and returns its result.
    pub async fn create_channel(
        &self,
        initial_wait_ms: u64,
        max_wait_ms: u64,
    ) -> ChannelResult<Option<Arc<C>>> {
        let Some(factory) = self.factory.as_ref() else {
            return Err(ChannelError::Configuration(
                "cannot create the channel because no channel factory is registered".to_string(),
            ));
        };

        if self.hooks.creation_cancelled() {
            tracing::debug!(manager_id = %self.id, "Channel creation cancelled by hook");
            return Ok(None);
        }

        if self.check_disposal_conflict()? == ConflictAction::Abort {
            self.abandon_channel().await;
            return Ok(None);
        }

        let _create_guard = match self.create_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!(manager_id = %self.id, "Channel is already being created, waiting for it");
                drop(self.create_lock.lock().await);
                tracing::debug!(manager_id = %self.id, "Channel creation waiting finished");
                return Ok(self.channel.load_full());
            }
        };

        // At most one live handle: an explicit create while one exists adopts it.
        if let Some(existing) = self.channel.load_full() {
            tracing::debug!(manager_id = %self.id, generation = self.generation(), "Channel already exists");
            return Ok(Some(existing));
        }

        let mut backoff = CreationBackoff::new(initial_wait_ms, max_wait_ms, self.backoff.step_ms);

        loop {
            if self.check_disposal_conflict()? == ConflictAction::Abort {
                self.abandon_channel().await;
                return Ok(None);
            }

            tracing::debug!(manager_id = %self.id, attempt = backoff.attempts() + 1, "Creating channel");
            let error = match factory.create().await {
                Ok(channel) => {
                    let channel = Arc::new(channel);
                    self.channel.store(Some(channel.clone()));
                    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    metrics::record_channel_created(generation);
                    tracing::info!(
                        manager_id = %self.id,
                        generation,
                        attempts = backoff.attempts() + 1,
                        "Channel created"
                    );
                    return Ok(Some(channel));
                }
                Err(e) => e,
            };

            let fault = classify_chain(self.classifier(), &*error, None);
            if !matches!(fault, Some(ref f) if f.kind == FaultKind::EndpointUnreachable) {
                tracing::error!(manager_id = %self.id, error = %error, "Channel factory failed");
                return Err(ChannelError::Factory(error));
            }
            metrics::record_creation_failure();

            if self.check_disposal_conflict()? == ConflictAction::Abort {
                self.abandon_channel().await;
                return Ok(None);
            }

            let (retry, wait_ms) = {
                let mut failure = CreationFailure {
                    retry: true,
                    wait_ms: backoff.current_ms(),
                    attempt: backoff.attempts() + 1,
                    error: &*error,
                };
                self.hooks.resolve_creation_failure(&mut failure);
                (failure.retry, failure.wait_ms)
            };

            if !retry {
                tracing::error!(
                    manager_id = %self.id,
                    error = %error,
                    "Couldn't create channel, giving up because the failure hook declined a retry"
                );
                self.abandon_channel().await;
                return Ok(None);
            }

            backoff.override_wait(wait_ms);
            tracing::warn!(
                manager_id = %self.id,
                error = %error,
                wait_ms,
                "Couldn't create channel, will retry"
            );
            if self.disposal.sleep(backoff.current()).await {
                tracing::debug!(manager_id = %self.id, "Creation backoff interrupted by disposal");
            }
            backoff.advance();
        }
    }

    /// Dispose the channel.
    ///
    /// Waits for any in-flight creation first and disposes what it produced
    /// too. Disposing an absent channel is a no-op.
    pub async fn dispose_channel(&self) -> ChannelResult<()> {
        let dispose_guard = self.dispose_lock.lock().await;
        self.dispose_locked(dispose_guard, |_| true).await
    }

    /// Dispose `faulted` if it is still the stored channel.
    ///
    /// When a disposal is already running, waits for it to finish instead of
    /// queueing a second one behind it.
    pub(crate) async fn dispose_faulted(&self, faulted: &Arc<C>) -> ChannelResult<()> {
        match self.dispose_lock.try_lock() {
            Ok(dispose_guard) => {
                self.dispose_locked(dispose_guard, |current| Arc::ptr_eq(current, faulted))
                    .await
            }
            Err(_) => {
                tracing::debug!(manager_id = %self.id, "Channel is already being disposed, waiting for it");
                self.disposal.cleared().await;
                Ok(())
            }
        }
    }

    async fn dispose_locked(
        &self,
        _dispose_guard: MutexGuard<'_, ()>,
        target: impl Fn(&Arc<C>) -> bool,
    ) -> ChannelResult<()> {
        // Locals drop before parameters: the signal clears while the lock is held.
        let _disposal = self.disposal.raise();

        // Readers observe the channel as absent from here on.
        let detached = self.detach_channel(&target)?;

        tracing::debug!(manager_id = %self.id, "Waiting if channel is being created");
        drop(self.create_lock.lock().await);
        tracing::debug!(manager_id = %self.id, "Waiting for channel creation finished");

        let created = self.detach_channel(&target);
        if detached.is_none() && matches!(created, Ok(None)) {
            tracing::debug!(manager_id = %self.id, "No channel to dispose, possibly already disposed");
            return Ok(());
        }

        let mut result = Ok(());
        if let Some(channel) = detached {
            result = result.and(self.shutdown(&channel).await);
        }
        match created {
            Ok(Some(channel)) => result = result.and(self.shutdown(&channel).await),
            Ok(None) => {}
            Err(e) => result = result.and(Err(e)),
        }
        result
    }

    /// Take the stored channel out if `target` accepts it.
    ///
    /// A channel without a close capability is left in place.
    fn detach_channel(
        &self,
        target: &impl Fn(&Arc<C>) -> bool,
    ) -> ChannelResult<Option<Arc<C>>> {
        let Some(channel) = self.channel.load_full() else {
            return Ok(None);
        };
        if !target(&channel) {
            return Ok(None);
        }
        if channel.closable().is_none() {
            return Err(ChannelError::InvalidState(
                "channel does not expose a close capability".to_string(),
            ));
        }
        self.channel.store(None);
        metrics::record_channel_disposed();
        Ok(Some(channel))
    }

    async fn shutdown(&self, channel: &Arc<C>) -> ChannelResult<()> {
        tracing::debug!(
            manager_id = %self.id,
            generation = self.generation(),
            state = ?channel.communication_state(),
            "Disposing channel"
        );
        shutdown_channel(&**channel, self.classifier()).await
    }

    /// Clear the handle on an aborted or vetoed creation.
    ///
    /// Anything still stored was produced during the disposal window; it is
    /// closed here unless the disposal detaches it first.
    async fn abandon_channel(&self) {
        let Some(channel) = self.channel.swap(None) else {
            return;
        };
        metrics::record_channel_disposed();
        if let Err(error) = self.shutdown(&channel).await {
            tracing::warn!(manager_id = %self.id, error = %error, "Failed to close abandoned channel");
        }
    }

    /// Non-blocking check for an in-flight disposal.
    fn check_disposal_conflict(&self) -> ChannelResult<ConflictAction> {
        if !self.is_disposing() {
            return Ok(ConflictAction::CreateAndExecute);
        }

        match self.hooks.resolve_disposal_conflict() {
            Some(action) => {
                tracing::debug!(manager_id = %self.id, action = ?action, "Creation requested during disposal");
                Ok(action)
            }
            None => Err(ChannelError::LifecycleConflict),
        }
    }
}

impl<C: Channel> std::fmt::Debug for ChannelManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("has_factory", &self.factory.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`ChannelManager`].
pub struct ChannelManagerBuilder<C: Channel> {
    channel: Option<C>,
    factory: Option<Arc<dyn ChannelFactory<C>>>,
    classifier: Arc<dyn FaultClassifier>,
    hooks: LifecycleHooks,
    backoff: BackoffConfig,
}

impl<C: Channel> ChannelManagerBuilder<C> {
    pub fn new() -> Self {
        Self {
            channel: None,
            factory: None,
            classifier: Arc::new(DefaultFaultClassifier),
            hooks: LifecycleHooks::default(),
            backoff: BackoffConfig::default(),
        }
    }

    /// Start with an already open channel.
    pub fn channel(mut self, channel: C) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: ChannelFactory<C> + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn classifier<K>(mut self, classifier: K) -> Self
    where
        K: FaultClassifier + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn config(self, config: &ManagerConfig) -> Self {
        self.backoff(config.backoff.clone())
    }

    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn on_creating<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CreationCancel) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.on_creating(hook);
        self
    }

    pub fn on_disposal_conflict<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut DisposalConflict) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.on_disposal_conflict(hook);
        self
    }

    pub fn on_creation_failed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CreationFailure<'_>) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.on_creation_failed(hook);
        self
    }

    pub fn build(self) -> ChannelManager<C> {
        let has_channel = self.channel.is_some();
        let manager = ChannelManager {
            id: Uuid::new_v4(),
            channel: ArcSwapOption::new(self.channel.map(Arc::new)),
            factory: self.factory,
            classifier: self.classifier,
            hooks: self.hooks,
            backoff: self.backoff,
            create_lock: Mutex::new(()),
            dispose_lock: Mutex::new(()),
            disposal: DisposalSignal::new(),
            generation: AtomicU64::new(u64::from(has_channel)),
        };
        tracing::debug!(manager_id = %manager.id, has_channel, "Channel manager built");
        manager
    }
}

impl<C: Channel> Default for ChannelManagerBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
