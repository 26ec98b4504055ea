//! Send-to-receipt latency tracking
//!
//! Delay is measured wall clock to wall clock: the receiver's clock at receipt
//! minus the sender's clock stamped into the frame. The two clocks are assumed
//! to be synchronized. No skew correction is attempted, and a negative delay
//! is reported as-is because it means the clocks disagree.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::types::{DelaySample, DelayStats, Fix};

/// Default number of samples in the rolling average.
pub const DEFAULT_WINDOW_SIZE: NonZeroUsize = NonZeroUsize::new(5).unwrap();

/// Source of receipt timestamps.
pub trait Clock: Send {
    fn now(&self) -> SystemTime;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> SystemTime + Send,
{
    fn now(&self) -> SystemTime {
        self()
    }
}

/// Seconds since the Unix epoch, negative for times before it.
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

/// Delay in milliseconds between a send timestamp and a receipt time.
pub fn delay_ms(sent_at: f64, received_at: SystemTime) -> f64 {
    (epoch_seconds(received_at) - sent_at) * 1000.0
}

/// FIFO window holding the most recent delay samples.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<DelaySample>,
    capacity: NonZeroUsize,
}

impl RollingWindow {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity.get()), capacity }
    }

    /// Add a sample, returning the oldest one if it had to be evicted.
    pub fn push(&mut self, sample: DelaySample) -> Option<DelaySample> {
        let evicted =
            if self.samples.len() == self.capacity.get() { self.samples.pop_front() } else { None };
        self.samples.push_back(sample);
        evicted
    }

    /// Arithmetic mean of the current contents, recomputed from scratch.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.value_ms).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DelaySample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}

/// Rolling and session-wide latency statistics.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    window: RollingWindow,
    samples_seen: u64,
    global_min: Option<f64>,
    global_max: Option<f64>,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl LatencyTracker {
    pub fn new(window_size: NonZeroUsize) -> Self {
        Self {
            window: RollingWindow::new(window_size),
            samples_seen: 0,
            global_min: None,
            global_max: None,
        }
    }

    /// Record the delay for `fix` received at `now` and report the new stats.
    ///
    /// A delay that is not finite (a corrupted timestamp decodes to NaN or
    /// infinity) is reported for its own fix but kept out of the window and
    /// the extrema.
    pub fn update(&mut self, fix: &Fix, now: SystemTime) -> DelayStats {
        let delay = delay_ms(fix.sent_at, now);
        self.samples_seen += 1;
        let ordinal = self.samples_seen;

        if delay.is_finite() {
            self.window.push(DelaySample { value_ms: delay, ordinal });
            self.global_min = Some(self.global_min.map_or(delay, |min| min.min(delay)));
            self.global_max = Some(self.global_max.map_or(delay, |max| max.max(delay)));
        } else {
            warn!(ordinal, sent_at = fix.sent_at, "Delay is not finite, statistics unchanged");
        }

        DelayStats {
            ordinal,
            window_len: self.window.len(),
            delay_ms: delay,
            rolling_average_ms: self.window.average(),
            min_ms: self.global_min,
            max_ms: self.global_max,
        }
    }

    /// Smallest finite delay so far.
    pub fn min(&self) -> Option<f64> {
        self.global_min
    }

    /// Largest finite delay so far.
    pub fn max(&self) -> Option<f64> {
        self.global_max
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::test_utils::fix_with_timestamp;
    use crate::types::{FRAME_SIZE, RawFrame};
    use proptest::prelude::*;
    use std::time::Duration;

    fn at_secs(secs: f64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs_f64(secs)
    }

    fn sample(value_ms: f64, ordinal: u64) -> DelaySample {
        DelaySample { value_ms, ordinal }
    }

    #[test]
    fn average_of_known_window_is_exact() {
        let mut window = RollingWindow::new(DEFAULT_WINDOW_SIZE);
        for (i, value) in [10.0, 20.0, 30.0, 40.0, 50.0].into_iter().enumerate() {
            assert!(window.push(sample(value, i as u64 + 1)).is_none());
        }
        assert_eq!(window.average(), Some(30.0));
    }

    #[test]
    fn sixth_sample_evicts_the_oldest() {
        let mut window = RollingWindow::new(DEFAULT_WINDOW_SIZE);
        for ordinal in 1..=5 {
            window.push(sample(ordinal as f64, ordinal));
        }

        let evicted = window.push(sample(6.0, 6));
        assert_eq!(evicted.map(|s| s.ordinal), Some(1));
        assert_eq!(window.len(), 5);

        let ordinals: Vec<_> = window.iter().map(|s| s.ordinal).collect();
        assert_eq!(ordinals, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_window_has_no_average() {
        let window = RollingWindow::new(NonZeroUsize::MIN);
        assert!(window.is_empty());
        assert_eq!(window.average(), None);
        assert_eq!(window.capacity().get(), 1);
    }

    #[test]
    fn delay_is_receipt_minus_send_in_millis() {
        let mut tracker = LatencyTracker::default();
        let stats = tracker.update(&fix_with_timestamp(1000.0), at_secs(1000.25));

        assert!((stats.delay_ms - 250.0).abs() < 1e-6);
        assert_eq!(stats.ordinal, 1);
        assert_eq!(stats.rolling_average_ms, Some(stats.delay_ms));
        assert_eq!(stats.min_ms, Some(stats.delay_ms));
        assert_eq!(stats.max_ms, Some(stats.delay_ms));
    }

    #[test]
    fn negative_delay_is_preserved() {
        let mut tracker = LatencyTracker::default();
        let stats = tracker.update(&fix_with_timestamp(1000.5), at_secs(1000.0));

        assert!((stats.delay_ms + 500.0).abs() < 1e-6);
        assert_eq!(tracker.min(), Some(stats.delay_ms));
    }

    #[test]
    fn extrema_are_unset_before_first_sample() {
        let tracker = LatencyTracker::default();
        assert_eq!(tracker.min(), None);
        assert_eq!(tracker.max(), None);
        assert_eq!(tracker.samples_seen(), 0);
    }

    #[test]
    fn extrema_cover_samples_evicted_from_window() {
        let mut tracker = LatencyTracker::new(NonZeroUsize::new(2).unwrap());
        let now = at_secs(100.0);
        for sent in [99.0, 99.9, 99.95, 99.99] {
            tracker.update(&fix_with_timestamp(sent), now);
        }

        assert_eq!(tracker.window().len(), 2);
        assert!((tracker.max().unwrap() - 1000.0).abs() < 1e-6);
        assert!((tracker.min().unwrap() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn corrupted_timestamp_stays_out_of_statistics() {
        let mut tracker = LatencyTracker::default();
        let garbage = codec::decode(&RawFrame::new([0xff; FRAME_SIZE]));
        let stats = tracker.update(&garbage, at_secs(1000.0));

        assert!(stats.delay_ms.is_nan());
        assert_eq!(stats.ordinal, 1);
        assert_eq!(stats.window_len, 0);
        assert_eq!(stats.rolling_average_ms, None);
        assert_eq!((stats.min_ms, stats.max_ms), (None, None));
        assert_eq!((tracker.min(), tracker.max()), (None, None));

        let stats = tracker.update(&fix_with_timestamp(999.0), at_secs(1000.0));
        assert_eq!(stats.ordinal, 2);
        assert_eq!(stats.window_len, 1);
        assert!((stats.delay_ms - 1000.0).abs() < 1e-6);
        assert_eq!(stats.rolling_average_ms, Some(stats.delay_ms));
        assert_eq!(stats.min_ms, Some(stats.delay_ms));
        assert_eq!(stats.max_ms, Some(stats.delay_ms));
    }

    #[test]
    fn infinite_delay_does_not_replace_extrema() {
        let mut tracker = LatencyTracker::default();
        tracker.update(&fix_with_timestamp(999.5), at_secs(1000.0));
        let stats = tracker.update(&fix_with_timestamp(f64::NEG_INFINITY), at_secs(1000.0));

        assert_eq!(stats.delay_ms, f64::INFINITY);
        assert_eq!(stats.window_len, 1);
        assert!((stats.max_ms.unwrap() - 500.0).abs() < 1e-6);
        assert!(stats.rolling_average_ms.unwrap().is_finite());
    }

    #[test]
    fn epoch_seconds_is_negative_before_epoch() {
        let before = UNIX_EPOCH - Duration::from_millis(1500);
        assert!((epoch_seconds(before) + 1.5).abs() < 1e-9);
    }

    #[test]
    fn closures_act_as_clocks() {
        let fixed = at_secs(42.0);
        let clock = move || fixed;
        assert_eq!(Clock::now(&clock), fixed);
    }

    proptest! {
        #[test]
        fn window_is_bounded_and_extrema_are_monotonic(
            window_size in 1usize..8,
            delays in prop::collection::vec(-5_000.0f64..5_000.0, 1..60),
        ) {
            let mut tracker = LatencyTracker::new(NonZeroUsize::new(window_size).unwrap());
            let now = at_secs(1_000_000.0);
            let mut previous: Option<DelayStats> = None;

            for delay in &delays {
                let fix = fix_with_timestamp(1_000_000.0 - delay / 1000.0);
                let stats = tracker.update(&fix, now);

                prop_assert!(tracker.window().len() <= window_size);
                let (min, max) = (stats.min_ms.unwrap(), stats.max_ms.unwrap());
                if let Some(prev) = previous {
                    prop_assert!(max >= prev.max_ms.unwrap());
                    prop_assert!(min <= prev.min_ms.unwrap());
                    prop_assert_eq!(stats.ordinal, prev.ordinal + 1);
                }
                prop_assert!(min <= stats.delay_ms && stats.delay_ms <= max);
                previous = Some(stats);
            }

            let expected_len = delays.len().min(window_size);
            prop_assert_eq!(tracker.window().len(), expected_len);
            let ordinals: Vec<u64> = tracker.window().iter().map(|s| s.ordinal).collect();
            let first = (delays.len() - expected_len) as u64 + 1;
            prop_assert_eq!(ordinals, (first..=delays.len() as u64).collect::<Vec<_>>());
        }
    }
}
