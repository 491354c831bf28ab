use std::{
    cell::Cell,
    ops::Add,
    rc::Rc,
    time::Duration,
};

/// A point in time, in milliseconds since an arbitrary, clock-specific epoch.
///
/// Everything time-dependent in this crate takes `now` explicitly instead of
/// reading a global clock, so tests can drive timers deterministically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    millis: u64,
}

impl Instant {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_millis(self.millis.saturating_sub(earlier.millis))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Self::Output {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Instant {
            millis: self.millis.saturating_add(millis),
        }
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(instant: Instant) -> Self {
        let clock = Self::new();
        clock.set(instant);
        clock
    }

    pub fn advance(&self, duration: Duration) -> Instant {
        let next = self.now() + duration;
        self.millis.set(next.as_millis());
        next
    }

    pub fn set(&self, instant: Instant) {
        self.millis.set(instant.as_millis());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.millis.get())
    }
}
