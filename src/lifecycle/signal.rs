//! "Disposal started" signal.

use std::time::Duration;

use tokio::sync::watch;

/// Level-triggered flag raised for the duration of a disposal.
///
/// Backoff sleeps in the creation loop select on it so a disposal is never
/// stuck behind a long retry wait.
#[derive(Debug)]
pub struct DisposalSignal {
    tx: watch::Sender<bool>,
}

impl DisposalSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Raise the signal. It is cleared when the returned guard drops.
    pub fn raise(&self) -> DisposalGuard<'_> {
        self.tx.send_replace(true);
        DisposalGuard { signal: self }
    }

    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    /// Sleep for `wait`, returning early if the signal is or becomes raised.
    ///
    /// Returns true if the sleep was interrupted.
    pub async fn sleep(&self, wait: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(wait) => false,
            _ = wait_raised(&mut rx) => true,
        }
    }

    /// Wait until no disposal is in progress.
    pub async fn cleared(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only ends on a clear.
        let _ = rx.wait_for(|raised| !*raised).await;
    }
}

impl Default for DisposalSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_raised(rx: &mut watch::Receiver<bool>) {
    loop {
        let raised = *rx.borrow_and_update();
        if raised {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone; the manager is being dropped, nothing left to wait for.
            std::future::pending::<()>().await;
        }
    }
}

/// Clears the disposal signal on drop.
#[derive(Debug)]
pub struct DisposalGuard<'a> {
    signal: &'a DisposalSignal,
}

impl Drop for DisposalGuard<'_> {
    fn drop(&mut self) {
        self.signal.tx.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn guard_clears_signal() {
        let signal = DisposalSignal::new();
        {
            let _guard = signal.raise();
            assert!(signal.is_raised());
        }
        assert!(!signal.is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_runs_full_duration_without_signal() {
        let signal = DisposalSignal::new();
        let start = tokio::time::Instant::now();
        assert!(!signal.sleep(Duration::from_millis(500)).await);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn raise_interrupts_sleep() {
        let signal = Arc::new(DisposalSignal::new());
        let sleeper = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.sleep(Duration::from_secs(60)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        let start = Instant::now();
        let guard = signal.raise();
        let interrupted = sleeper.await.unwrap();
        drop(guard);

        assert!(interrupted);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn already_raised_returns_immediately() {
        let signal = DisposalSignal::new();
        let _guard = signal.raise();
        assert!(signal.sleep(Duration::from_secs(60)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_waits_for_guard_drop() {
        let signal = Arc::new(DisposalSignal::new());
        let holder = {
            let signal = signal.clone();
            tokio::spawn(async move {
                let _guard = signal.raise();
                tokio::time::sleep(Duration::from_millis(100)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(signal.is_raised());
        let start = tokio::time::Instant::now();
        signal.cleared().await;

        assert!(!signal.is_raised());
        assert!(start.elapsed() >= Duration::from_millis(90));
        holder.await.unwrap();
    }
}
