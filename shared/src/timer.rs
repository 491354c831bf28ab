use std::time::Duration;

use crate::time::Instant;

/// A one-shot timer that rings once `duration` has passed since the last reset
#[derive(Clone, Debug)]
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            last: now,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn ringing(&self, now: Instant) -> bool {
        now.duration_since(self.last) >= self.duration
    }
}

/// A cancellable periodic task.
///
/// `poll` reports at most one tick per call. Missed periods are skipped
/// rather than replayed, so a stalled loop does not produce a burst of ticks.
#[derive(Clone, Debug)]
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
}

impl Interval {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: Some(now + period),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let period = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX).max(1);
        let missed = (now.as_millis() - due.as_millis()) / period;
        let next = due
            .as_millis()
            .saturating_add(period.saturating_mul(missed.saturating_add(1)));
        self.next_due = Some(Instant::from_millis(next));
        true
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.next_due.is_none()
    }

    /// Restart the schedule from `now`, also reviving a cancelled interval
    pub fn restart(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }
}

/// Coalesces bursts of `schedule` calls into one firing, `delay` after the
/// last call.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
