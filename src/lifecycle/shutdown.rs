//! Graceful shutdown signaling.
//!
//! A watch channel carries a single "stop now" flag from the server handle
//! to the serve loop. Late subscribers still observe an already-triggered
//! shutdown, which matters for servers stopped before they fully started.

use tokio::sync::watch;

/// Shutdown trigger held by the owner of a running server.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Awaitable view of the shutdown state.
#[derive(Debug, Clone)]
pub struct ShutdownWatcher {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Signal every watcher to stop.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn watcher(&self) -> ShutdownWatcher {
        ShutdownWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownWatcher {
    /// Resolve once shutdown has been triggered.
    pub async fn wait(mut self) {
        // wait_for also covers the already-triggered case.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_releases_watcher() {
        let shutdown = Shutdown::new();
        let watcher = shutdown.watcher();
        shutdown.trigger();
        watcher.wait().await;
    }

    #[tokio::test]
    async fn test_late_watcher_sees_triggered_state() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.watcher().wait().await;
    }
}
