use crate::time::{Clock, Instant};

/// Wall clock backed by `Date.now()`
#[derive(Clone, Debug)]
pub struct SystemClock {
    start: f64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: js_sys::Date::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        let elapsed = (js_sys::Date::now() - self.start).max(0.0);
        Instant::from_millis(elapsed as u64)
    }
}
