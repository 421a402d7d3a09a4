use heapless::Deque;

/// Numeric types a [`RunningAverage`] can hold.
///
/// The mean is computed in `f64`. Integer types convert back by truncating
/// toward zero (saturating at the type bounds).
pub trait Sample: Copy {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_sample!(f32, f64, i16, i32, u16, u32);

/// Mean over the last `N` samples, kept in a ring buffer.
///
/// Once full, each new sample evicts the oldest. An empty average has no
/// value: [`average`](Self::average) returns `None`, never a zero reading.
pub struct RunningAverage<T: Sample, const N: usize> {
    samples: Deque<T, N>,
}

impl<T: Sample, const N: usize> RunningAverage<T, N> {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    pub fn add_value(&mut self, value: T) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // Cannot fail: a slot was freed above
        let _ = self.samples.push_back(value);
    }

    pub fn average(&self) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|v| v.to_f64()).sum();
        Some(T::from_f64(sum / self.samples.len() as f64))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<T> {
        self.samples.back().copied()
    }
}

impl<T: Sample, const N: usize> Default for RunningAverage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
