//! Last-write-wins debounce timer driven by explicit timestamps
//!
//! Every trigger replaces the pending value and restarts the quiet period.
//! The owner polls from its refresh tick; nothing runs in the background.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    deadline: Option<Instant>,
    value: Option<T>,
}

impl<T> Debounced<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            value: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the timer
    pub fn trigger(&mut self, value: T, now: Instant) {
        self.value = Some(value);
        self.deadline = Some(now + self.delay);
    }

    /// Fold a new input into the pending value and restart the timer
    pub fn accumulate(&mut self, now: Instant, fold: impl FnOnce(Option<T>) -> T) {
        let next = fold(self.value.take());
        self.trigger(next, now);
    }

    /// Take the value once the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.value.take()
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.value = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn pending_value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut d = Debounced::new(Duration::from_millis(500));
        d.trigger(1000u32, start);

        assert_eq!(d.poll(start + Duration::from_millis(499)), None);
        assert_eq!(d.poll(start + Duration::from_millis(500)), Some(1000));
        assert_eq!(d.poll(start + Duration::from_millis(900)), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_retrigger_restarts_and_replaces() {
        let start = Instant::now();
        let mut d = Debounced::new(Duration::from_millis(500));
        d.trigger(600u32, start);
        d.trigger(1000u32, start + Duration::from_millis(300));

        assert_eq!(d.poll(start + Duration::from_millis(600)), None);
        assert_eq!(d.poll(start + Duration::from_millis(800)), Some(1000));
    }

    #[test]
    fn test_accumulate() {
        let start = Instant::now();
        let mut d = Debounced::new(Duration::from_millis(100));
        d.accumulate(start, |prev| prev.unwrap_or(0.0) + 40.0);
        d.accumulate(start, |prev| prev.unwrap_or(0.0) + 60.0);
        assert_eq!(d.pending_value(), Some(&100.0));
        assert_eq!(d.poll(start + Duration::from_millis(100)), Some(100.0));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut d = Debounced::new(Duration::from_millis(10));
        d.trigger((), start);
        d.cancel();
        assert_eq!(d.poll(start + Duration::from_secs(1)), None);
    }
}
