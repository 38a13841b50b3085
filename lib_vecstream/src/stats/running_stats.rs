/// Streaming mean and population standard deviation.
///
/// Each observation updates the running mean and the accumulated squared
/// deviation in place (Welford's update), so long streams do not lose
/// precision the way a naive sum-of-squares does.
///
/// Invariant: `count == 0` implies `mean == 0` and `sum_sq_diff == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    sum_sq_diff: f64,
}

impl RunningStats {
    /// An empty estimator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Incorporates one value.
    pub fn observe(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.sum_sq_diff += delta * (value - self.mean);
    }

    /// Returns `(mean, stddev)`, or `(0.0, 0.0)` before any observation.
    pub fn result(&self) -> (f64, f64) {
        (self.mean, self.variance().sqrt())
    }

    /// Population variance, `sum_sq_diff / count`.
    pub fn variance(&self) -> f64 {
        if self.count > 0 {
            // Rounding can leave a tiny negative residue for constant input.
            (self.sum_sq_diff / self.count as f64).max(0.0)
        } else {
            0.0
        }
    }

    /// Number of observed values.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Current mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Back to the empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.observe(value);
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}
