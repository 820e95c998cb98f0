//! Repeating timers on a cooperative millisecond clock.
//!
//! Nothing here sleeps or spawns.  The host loop owns the clock and calls
//! [`RepeatingTimer::poll`] with the current time; a timer fires at most
//! once per poll, so a slow host never sees a burst of catch-up ticks and a
//! tick can never be re-entered while the previous one is still running.

/// A periodic timer driven by an external clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatingTimer {
    interval_ms: u64,
    next_due: Option<u64>,
}

impl RepeatingTimer {
    /// A stopped timer.  Intervals of `0` are treated as `1` so a running
    /// timer always makes progress.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arm the timer; the first tick is due one interval after `now`.
    /// Restarting a running timer re-bases it on `now`.
    pub fn start(&mut self, now: u64) {
        self.next_due = Some(now.saturating_add(self.interval_ms));
    }

    /// Suppress all future ticks.  Idempotent.
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// Change the period without losing the running/stopped state.
    ///
    /// A running timer is re-armed from `now` with the new period.
    pub fn set_interval(&mut self, interval_ms: u64, now: u64) {
        self.interval_ms = interval_ms.max(1);
        if self.is_running() {
            self.start(now);
        }
    }

    /// When the next tick is due, if the timer is running.
    pub fn deadline(&self) -> Option<u64> {
        self.next_due
    }

    /// Returns `true` if a tick is due at `now`, and re-arms for the next
    /// period.
    pub fn poll(&mut self, now: u64) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(now.saturating_add(self.interval_ms));
                true
            }
            _ => false,
        }
    }
}

/// Earliest of a set of optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<u64>>) -> Option<u64> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_timer_is_stopped() {
        let mut t = RepeatingTimer::new(20);
        assert!(!t.is_running());
        assert!(!t.poll(1_000));
        assert_eq!(t.deadline(), None);
    }

    #[test]
    fn fires_once_per_interval() {
        let mut t = RepeatingTimer::new(20);
        t.start(100);
        assert!(!t.poll(119));
        assert!(t.poll(120));
        assert!(!t.poll(120));
        assert!(!t.poll(139));
        assert!(t.poll(140));
    }

    #[test]
    fn late_poll_does_not_burst() {
        let mut t = RepeatingTimer::new(10);
        t.start(0);
        assert!(t.poll(1_000));
        assert!(!t.poll(1_000));
        assert_eq!(t.deadline(), Some(1_010));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut t = RepeatingTimer::new(10);
        t.start(0);
        t.stop();
        t.stop();
        assert!(!t.is_running());
        assert!(!t.poll(50));
    }

    #[test]
    fn set_interval_keeps_running_state() {
        let mut t = RepeatingTimer::new(10);
        t.set_interval(30, 0);
        assert!(!t.is_running());

        t.start(0);
        t.set_interval(50, 5);
        assert!(t.is_running());
        assert_eq!(t.interval_ms(), 50);
        assert_eq!(t.deadline(), Some(55));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut t = RepeatingTimer::new(0);
        t.start(0);
        assert!(!t.poll(0));
        assert!(t.poll(1));
    }

    #[test]
    fn earliest_skips_stopped() {
        assert_eq!(earliest([None, Some(40), Some(12), None]), Some(12));
        assert_eq!(earliest([None, None]), None);
    }
}
