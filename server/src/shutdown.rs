//! Shutdown requests
//!
//! A request only stops new sessions from starting. The orchestrator checks it
//! before each session and while waiting for connections; running sessions
//! finish on their own.

use tokio::sync::watch;

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. Never resolves if the trigger is
    /// dropped without firing.
    pub async fn requested(&mut self) {
        loop {
            let requested = *self.rx.borrow_and_update();
            if requested {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_trigger_wakes_waiter() {
        let (trigger, mut shutdown) = channel();
        assert!(!shutdown.is_requested());

        let waiter = tokio::spawn(async move {
            shutdown.requested().await;
            shutdown.is_requested()
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.trigger();

        let seen = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(seen);
    }

    #[tokio::test]
    async fn test_request_before_wait_resolves_immediately() {
        let (trigger, mut shutdown) = channel();
        trigger.trigger();

        assert!(shutdown.is_requested());
        assert!(timeout(Duration::from_millis(100), shutdown.requested())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_dropped_trigger_never_fires() {
        let (trigger, mut shutdown) = channel();
        drop(trigger);

        assert!(timeout(Duration::from_millis(50), shutdown.requested())
            .await
            .is_err());
        assert!(!shutdown.is_requested());
    }
}
