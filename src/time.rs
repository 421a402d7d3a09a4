/// Milliseconds since boot. Wraps after ~49.7 days.
pub type Millis = u32;

/// Time elapsed from `since` to `now`, correct across counter wraparound.
#[inline]
pub const fn elapsed(now: Millis, since: Millis) -> Millis {
    now.wrapping_sub(since)
}

/// Minimum-interval gate for a periodic action.
///
/// The gate opens once `interval` ms have elapsed since it was last stamped.
/// Never compare absolute timestamps directly; only the wrapped difference
/// is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerGate {
    last: Millis,
    interval: Millis,
}

impl TimerGate {
    /// Gate stamped at t=0, so it first opens at `interval`.
    pub const fn new(interval: Millis) -> Self {
        Self { last: 0, interval }
    }

    pub const fn starting_at(interval: Millis, last: Millis) -> Self {
        Self { last, interval }
    }

    pub const fn last(&self) -> Millis {
        self.last
    }

    pub const fn is_open(&self, now: Millis) -> bool {
        elapsed(now, self.last) >= self.interval
    }

    pub fn stamp(&mut self, now: Millis) {
        self.last = now;
    }

    /// Check-and-stamp: returns `true` at most once per interval.
    pub fn poll(&mut self, now: Millis) -> bool {
        if self.is_open(now) {
            self.stamp(now);
            true
        } else {
            false
        }
    }
}
