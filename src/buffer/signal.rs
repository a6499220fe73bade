//! Broadcast wake signal
//!
//! A pulse releases every task currently waiting and keeps no memory of
//! itself afterwards. Waiters never rely on having seen a particular pulse:
//! they re-check their condition after registering interest, so a pulse that
//! lands between the check and the wait cannot be lost.

use tokio::sync::Notify;

/// Edge-triggered, reusable wake-up shared by any number of waiters
#[derive(Debug, Default)]
pub struct Pulse {
    notify: Notify,
}

impl Pulse {
    /// Create a new pulse
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake all tasks currently blocked in [`Pulse::wait_until`]
    pub fn pulse(&self) {
        self.notify.notify_waiters();
    }

    /// Wait until `ready` returns true
    ///
    /// `ready` is evaluated once immediately and then again after every pulse.
    pub async fn wait_until<F>(&self, mut ready: F)
    where
        F: FnMut() -> bool,
    {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if ready() {
                return;
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_ready_condition_returns_immediately() {
        let pulse = Pulse::new();
        pulse.wait_until(|| true).await;
    }

    #[tokio::test]
    async fn test_pulse_wakes_all_waiters() {
        let pulse = Arc::new(Pulse::new());
        let flag = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pulse = Arc::clone(&pulse);
            let flag = Arc::clone(&flag);
            handles.push(tokio::spawn(async move {
                pulse.wait_until(|| flag.load(Ordering::Acquire)).await;
            }));
        }

        // Let the waiters park
        tokio::time::sleep(Duration::from_millis(20)).await;
        flag.store(true, Ordering::Release);
        pulse.pulse();

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_pulse_without_state_change_keeps_waiting() {
        let pulse = Arc::new(Pulse::new());
        let waiter = {
            let pulse = Arc::clone(&pulse);
            tokio::spawn(async move { pulse.wait_until(|| false).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        pulse.pulse();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!waiter.is_finished());
        waiter.abort();
    }
}
