//! Watch-channel-backed reachability.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use launchgate_core::Connectivity;

/// Reachability fed by the host platform's network-path monitor.
///
/// The publisher half pushes verdicts as the platform reports them; the
/// receiver half serves the engine through [`Connectivity`]. Clones share
/// the same channel.
#[derive(Debug, Clone)]
pub struct SharedReachability {
    rx: watch::Receiver<bool>,
}

/// Publisher half for pushing reachability verdicts.
#[derive(Debug, Clone)]
pub struct ReachabilityPublisher {
    tx: watch::Sender<bool>,
}

/// Creates a publisher/receiver pair with an initial verdict.
pub fn channel(initial: bool) -> (ReachabilityPublisher, SharedReachability) {
    let (tx, rx) = watch::channel(initial);
    (ReachabilityPublisher { tx }, SharedReachability { rx })
}

impl ReachabilityPublisher {
    /// Publishes a new verdict.
    pub fn set_connected(&self, connected: bool) {
        debug!(connected, "Reachability changed");
        self.tx.send_replace(connected);
    }

    /// The last published verdict.
    pub fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }
}

#[async_trait]
impl Connectivity for SharedReachability {
    fn is_connected(&self) -> bool {
        *self.rx.borrow()
    }

    async fn wait_for_connection(&self, timeout: Duration) -> bool {
        let mut rx = self.rx.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|connected| *connected)).await {
            Ok(Ok(_)) => true,
            // Publisher dropped or timeout elapsed while unreachable
            Ok(Err(_)) | Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_verdict_follows_publisher() {
        let (publisher, reachability) = channel(false);
        assert!(!reachability.is_connected());

        publisher.set_connected(true);
        assert!(reachability.is_connected());
        assert!(publisher.is_connected());
    }

    #[tokio::test]
    async fn test_wait_resolves_on_restore() {
        let (publisher, reachability) = channel(false);

        let waiter = {
            let reachability = reachability.clone();
            tokio::spawn(
                async move { reachability.wait_for_connection(Duration::from_secs(1)).await },
            )
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        publisher.set_connected(true);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_times_out_while_unreachable() {
        let (_publisher, reachability) = channel(false);
        assert!(
            !reachability
                .wait_for_connection(Duration::from_millis(30))
                .await
        );
    }
}
