//! External cancellation signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation token handed to a request by its caller.
///
/// All clones observe the same state; cancelling any clone cancels them all.
/// Cancellation is sticky.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    state: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    /// Creates a signal that has not fired.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Fires the signal.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    /// Returns true once the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the signal fires (immediately if it already has).
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let signal = CancelSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!signal.is_cancelled());
        signal.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_resolves_immediately() {
        let signal = CancelSignal::new();
        signal.cancel();
        tokio::time::timeout(Duration::from_millis(50), signal.cancelled())
            .await
            .unwrap();
    }
}
