//! Trailing-edge debounce timer.
//!
//! Holds at most one pending value. Scheduling again replaces the value
//! and resets the deadline, so only the last value in a burst survives
//! the window.

use std::future::pending;
use tokio::time::{sleep_until, Duration, Instant};

/// A cancellable scheduled value.
pub struct Debounce<T> {
    window: Duration,
    slot: Option<(Instant, T)>,
}

impl<T> Debounce<T> {
    pub fn new(window: Duration) -> Self {
        Self { window, slot: None }
    }

    /// Arm (or re-arm) the timer with a new value. Any previously
    /// pending value is discarded.
    pub fn schedule(&mut self, value: T) {
        self.slot = Some((Instant::now() + self.window, value));
    }

    /// Drop the pending value, if any.
    pub fn cancel(&mut self) {
        self.slot = None;
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Resolves with the pending value once the window has elapsed;
    /// never resolves while unarmed. Cancellation-safe: the value is
    /// only taken after the deadline passes, so losing a `select!` race
    /// leaves the slot intact.
    pub async fn settled(&mut self) -> T {
        let deadline = match &self.slot {
            Some((deadline, _)) => *deadline,
            None => return pending().await,
        };
        sleep_until(deadline).await;
        match self.slot.take() {
            Some((_, value)) => value,
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_last_value_wins() {
        let mut debounce = Debounce::new(Duration::from_millis(20));
        debounce.schedule(1);
        debounce.schedule(2);
        debounce.schedule(3);
        let fired = timeout(Duration::from_secs(2), debounce.settled())
            .await
            .expect("debounce never fired");
        assert_eq!(fired, 3);
        assert!(!debounce.is_armed());
    }

    #[tokio::test]
    async fn test_reschedule_resets_deadline() {
        let mut debounce = Debounce::new(Duration::from_millis(50));
        debounce.schedule("first");
        tokio::time::sleep(Duration::from_millis(30)).await;
        debounce.schedule("second");

        // 30ms after the reschedule the original deadline has passed,
        // but the reset one has not.
        let early = timeout(Duration::from_millis(30), debounce.settled()).await;
        assert!(early.is_err());
        assert!(debounce.is_armed());

        let fired = timeout(Duration::from_secs(2), debounce.settled())
            .await
            .expect("debounce never fired");
        assert_eq!(fired, "second");
    }

    #[tokio::test]
    async fn test_unarmed_never_fires() {
        let mut debounce: Debounce<u32> = Debounce::new(Duration::from_millis(5));
        let fired = timeout(Duration::from_millis(40), debounce.settled()).await;
        assert!(fired.is_err());
    }

    #[tokio::test]
    async fn test_cancel_disarms() {
        let mut debounce = Debounce::new(Duration::from_millis(5));
        debounce.schedule(7);
        debounce.cancel();
        assert!(!debounce.is_armed());
        let fired = timeout(Duration::from_millis(40), debounce.settled()).await;
        assert!(fired.is_err());
    }
}
