//! Lifecycle hooks.
//!
//! Optional callbacks that let callers override lifecycle decisions. Each
//! hook has a default used when it is not registered:
//!
//! | Hook                | Fired                                   | Default                    |
//! |---------------------|-----------------------------------------|----------------------------|
//! | creating            | before every creation attempt           | proceed                    |
//! | disposal conflict   | creation requested during a disposal    | fail with `LifecycleConflict` |
//! | creation failed     | after every endpoint-unreachable failure | retry after the current wait |

use std::fmt;
use std::sync::Arc;

/// Payload of the creating hook. Set `cancel` to skip creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationCancel {
    pub cancel: bool,
}

/// What to do when creation races an in-flight disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// Create the channel anyway and run the operation.
    CreateAndExecute,
    /// Give up; no channel is produced.
    Abort,
}

/// Payload of the disposal conflict hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalConflict {
    pub action: ConflictAction,
}

/// Payload of the creation failed hook.
#[derive(Debug)]
pub struct CreationFailure<'a> {
    /// Set to false to stop retrying; creation then returns no channel.
    pub retry: bool,
    /// Wait before the next attempt. Pre-filled with the backoff's value.
    pub wait_ms: u64,
    /// 1-based number of the attempt that just failed.
    pub attempt: u32,
    pub error: &'a (dyn std::error::Error + Send + Sync + 'static),
}

type CreatingHook = Arc<dyn Fn(&mut CreationCancel) + Send + Sync>;
type DisposalConflictHook = Arc<dyn Fn(&mut DisposalConflict) + Send + Sync>;
type CreationFailedHook = Arc<dyn Fn(&mut CreationFailure<'_>) + Send + Sync>;

/// The set of registered hooks.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    creating: Option<CreatingHook>,
    disposal_conflict: Option<DisposalConflictHook>,
    creation_failed: Option<CreationFailedHook>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_creating<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CreationCancel) + Send + Sync + 'static,
    {
        self.creating = Some(Arc::new(hook));
        self
    }

    pub fn on_disposal_conflict<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut DisposalConflict) + Send + Sync + 'static,
    {
        self.disposal_conflict = Some(Arc::new(hook));
        self
    }

    pub fn on_creation_failed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CreationFailure<'_>) + Send + Sync + 'static,
    {
        self.creation_failed = Some(Arc::new(hook));
        self
    }

    /// Fire the creating hook. Returns true if creation was cancelled.
    pub fn creation_cancelled(&self) -> bool {
        match &self.creating {
            Some(hook) => {
                let mut args = CreationCancel::default();
                hook(&mut args);
                args.cancel
            }
            None => false,
        }
    }

    /// Ask the disposal conflict hook for a decision. `None` means no hook is
    /// registered.
    pub fn resolve_disposal_conflict(&self) -> Option<ConflictAction> {
        self.disposal_conflict.as_ref().map(|hook| {
            let mut args = DisposalConflict {
                action: ConflictAction::CreateAndExecute,
            };
            hook(&mut args);
            args.action
        })
    }

    /// Let the creation failed hook adjust `failure` in place.
    pub fn resolve_creation_failure(&self, failure: &mut CreationFailure<'_>) {
        if let Some(hook) = &self.creation_failed {
            hook(failure);
        }
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("creating", &self.creating.is_some())
            .field("disposal_conflict", &self.disposal_conflict.is_some())
            .field("creation_failed", &self.creation_failed.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[test]
    fn defaults_without_hooks() {
        let hooks = LifecycleHooks::new();
        assert!(!hooks.creation_cancelled());
        assert_eq!(hooks.resolve_disposal_conflict(), None);

        let err = TransportError::endpoint_not_found("down");
        let mut failure = CreationFailure {
            retry: true,
            wait_ms: 100,
            attempt: 1,
            error: &err,
        };
        hooks.resolve_creation_failure(&mut failure);
        assert!(failure.retry);
        assert_eq!(failure.wait_ms, 100);
    }

    #[test]
    fn hooks_override_decisions() {
        let hooks = LifecycleHooks::new()
            .on_creating(|e| e.cancel = true)
            .on_disposal_conflict(|e| e.action = ConflictAction::Abort)
            .on_creation_failed(|e| {
                e.retry = e.attempt < 3;
                e.wait_ms = 42;
            });

        assert!(hooks.creation_cancelled());
        assert_eq!(hooks.resolve_disposal_conflict(), Some(ConflictAction::Abort));

        let err = TransportError::endpoint_not_found("down");
        let mut failure = CreationFailure {
            retry: true,
            wait_ms: 0,
            attempt: 3,
            error: &err,
        };
        hooks.resolve_creation_failure(&mut failure);
        assert!(!failure.retry);
        assert_eq!(failure.wait_ms, 42);
        assert!(format!("{:?}", hooks).contains("creating: true"));
    }
}
