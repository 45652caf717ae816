//! Coalescing re-evaluation signal.

use std::sync::Arc;

use tokio::sync::Notify;

/// Requests an immediate re-evaluation from the watcher.
///
/// Firing never blocks. At most one request is kept pending, so a burst of
/// fires while the watcher is busy results in a single extra evaluation.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    notify: Arc<Notify>,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a re-evaluation.
    pub fn fire(&self) {
        self.notify.notify_one();
    }

    /// Waits for the next request.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_fire_before_wait_is_kept() {
        let trigger = Trigger::new();
        trigger.fire();

        let result = timeout(Duration::from_millis(100), trigger.notified()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fires_coalesce() {
        let trigger = Trigger::new();
        let other = trigger.clone();
        trigger.fire();
        other.fire();
        trigger.fire();

        assert!(timeout(Duration::from_millis(100), trigger.notified())
            .await
            .is_ok());
        assert!(timeout(Duration::from_millis(50), trigger.notified())
            .await
            .is_err());
    }
}
