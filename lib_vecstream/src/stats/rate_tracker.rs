use std::time::Instant;

use super::clock::{Clock, MonotonicClock};
use super::running_stats::RunningStats;

/// Measures how often `record_event` is called.
///
/// Every call after the first turns the time since the previous call into an
/// instantaneous frequency (`1 / elapsed` in Hz). The first call after
/// construction or `reset` records a `0` sample so the series has a defined
/// start. A zero elapsed time (two events inside one clock tick) is skipped
/// rather than recorded as an infinite rate.
///
/// Raw samples are kept next to the running aggregate so they can be written
/// out with each batch summary.
#[derive(Debug, Clone)]
pub struct RateTracker<C = MonotonicClock> {
    clock: C,
    last_observed: Option<Instant>,
    stats: RunningStats,
    samples: Vec<f64>,
}

impl RateTracker<MonotonicClock> {
    /// A tracker driven by the system's monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for RateTracker<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateTracker<C> {
    /// A tracker that reads time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            last_observed: None,
            stats: RunningStats::new(),
            samples: Vec::new(),
        }
    }

    /// Pre-reserves room for `expected_events` raw samples.
    pub fn size_hint(&mut self, expected_events: usize) {
        self.samples.reserve(expected_events);
    }

    /// Records one event at the clock's current time.
    pub fn record_event(&mut self) {
        let now = self.clock.now();
        self.record_event_at(now);
    }

    /// Records one event at `now`.
    pub fn record_event_at(&mut self, now: Instant) {
        let Some(previous) = self.last_observed.replace(now) else {
            self.observe(0.0);
            return;
        };

        let elapsed = now.saturating_duration_since(previous);
        if elapsed.is_zero() {
            tracing::trace!("zero inter-arrival time, sample skipped");
            return;
        }
        self.observe(1.0 / elapsed.as_secs_f64());
    }

    fn observe(&mut self, freq: f64) {
        self.stats.observe(freq);
        self.samples.push(freq);
    }

    /// `(mean, stddev)` of the observed frequencies in Hz.
    pub fn result(&self) -> (f64, f64) {
        self.stats.result()
    }

    /// Observed frequencies in observation order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing has been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Forgets all samples and the last event time.
    pub fn reset(&mut self) {
        self.last_observed = None;
        self.stats.reset();
        self.samples.clear();
    }
}
