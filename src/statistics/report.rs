//! Per-thread latency report: a quantile sketch plus the target period.
//!
//! A [`TimerReport`] classifies each observed period by its deviation from
//! the target into five severity bands and keeps the largest absolute period
//! seen, tagged with the iteration that produced it. One report is written
//! by exactly one measurement thread; the live reporter reads it through the
//! [`ReportSlot`] mutex.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::sketch::QuantileSketch;

/// Number of severity bands in every report.
pub const BAND_COUNT: usize = 5;

/// Display names of the severity bands, best to worst.
pub const BAND_LABELS: [&str; BAND_COUNT] = ["Great", "Good", "Poor", "Bad", "Pathetic"];

/// Upper deviation edges of the four bounded bands for a given bucket width.
///
/// With the default width of an eighth of the period this yields the
/// canonical thresholds `T/8, T/4, T/2, T`; the fifth band is unbounded.
pub fn band_edges(bucket_width_ns: u64) -> [u64; BAND_COUNT - 1] {
    [
        bucket_width_ns,
        bucket_width_ns * 2,
        bucket_width_ns * 4,
        bucket_width_ns * 8,
    ]
}

/// Latency distribution of one measurement thread.
#[derive(Debug)]
pub struct TimerReport {
    target_ns: u64,
    bucket_width_ns: u64,
    sketch: QuantileSketch,
    /// Largest absolute period observed, with its iteration index. Distinct
    /// from the sketch maximum, which tracks the deviation stream.
    max_period: Option<(u64, u64)>,
}

impl TimerReport {
    pub fn new(target_ns: u64, bucket_width_ns: u64) -> Self {
        Self {
            target_ns,
            bucket_width_ns,
            sketch: QuantileSketch::new(&band_edges(bucket_width_ns)),
            max_period: None,
        }
    }

    /// Ingest one observed period.
    ///
    /// The deviation `|sample - target|` feeds the sketch; the running
    /// maximum tracks the absolute period itself.
    pub fn add_observation(&mut self, sample_ns: u64, index: u64) {
        let deviation = sample_ns.abs_diff(self.target_ns);
        self.sketch.record(deviation, index);
        match self.max_period {
            Some((current, _)) if sample_ns <= current => {}
            _ => self.max_period = Some((sample_ns, index)),
        }
    }

    pub fn target_ns(&self) -> u64 {
        self.target_ns
    }

    pub fn bucket_width_ns(&self) -> u64 {
        self.bucket_width_ns
    }

    /// Number of recorded observations.
    pub fn observations(&self) -> u64 {
        self.sketch.len()
    }

    /// Largest absolute period and the iteration it occurred at.
    pub fn max_period(&self) -> Option<(u64, u64)> {
        self.max_period
    }

    /// Immutable copy of the display-relevant state.
    pub fn snapshot(&self) -> ReportSnapshot {
        let mut buckets = [0u64; BAND_COUNT];
        for (i, slot) in buckets.iter_mut().enumerate() {
            *slot = self.sketch.count_in_bucket(i);
        }
        let (max_period_ns, max_index) = self.max_period.unwrap_or((0, 0));
        ReportSnapshot {
            samples: self.sketch.len(),
            buckets,
            p50_deviation_ns: self.sketch.quantile(0.5).unwrap_or(0),
            p99_deviation_ns: self.sketch.quantile(0.99).unwrap_or(0),
            max_period_ns,
            max_index,
        }
    }
}

/// Point-in-time copy of a report, taken under the slot mutex.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportSnapshot {
    pub samples: u64,
    pub buckets: [u64; BAND_COUNT],
    pub p50_deviation_ns: u64,
    pub p99_deviation_ns: u64,
    pub max_period_ns: u64,
    pub max_index: u64,
}

/// A labelled report behind the display mutex.
///
/// The slot is owned by the orchestrator for the whole program lifetime;
/// measurement threads and the live reporter borrow it, and the thread scope
/// join barrier guarantees no borrow outlives the owner. The mutex guards
/// rendering consistency (no torn maximum); it is uncontended on the
/// measurement fast path.
#[derive(Debug)]
pub struct ReportSlot {
    label: &'static str,
    report: Mutex<TimerReport>,
}

impl ReportSlot {
    pub fn new(label: &'static str, report: TimerReport) -> Self {
        Self {
            label,
            report: Mutex::new(report),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Lock the report. A poisoned mutex is recovered rather than
    /// propagated: the report data is plain counters and stays usable.
    pub fn lock(&self) -> MutexGuard<'_, TimerReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ReportSnapshot {
        self.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_width_yields_canonical_thresholds() {
        let period = 1_000_000u64; // 1 ms
        let edges = band_edges(period / 8);
        assert_eq!(edges, [125_000, 250_000, 500_000, 1_000_000]);
    }

    #[test]
    fn deviation_is_saturating_and_symmetric() {
        let mut report = TimerReport::new(1_000_000, 125_000);
        report.add_observation(1_000_000, 1); // dev 0
        report.add_observation(900_000, 2); // dev 100_000
        report.add_observation(1_100_000, 3); // dev 100_000
        let snap = report.snapshot();
        assert_eq!(snap.samples, 3);
        assert_eq!(snap.buckets[0], 3);
    }

    #[test]
    fn max_tracks_absolute_period_not_deviation() {
        let mut report = TimerReport::new(1_000_000, 125_000);
        // Larger deviation but smaller absolute period.
        report.add_observation(100_000, 1); // dev 900_000
        report.add_observation(1_200_000, 2); // dev 200_000
        assert_eq!(report.max_period(), Some((1_200_000, 2)));
    }

    #[test]
    fn explicit_width_overrides_the_default_bands() {
        let mut report = TimerReport::new(1_000_000, 50_000);
        report.add_observation(1_060_000, 1); // dev 60_000 -> second band
        let snap = report.snapshot();
        assert_eq!(snap.buckets, [0, 1, 0, 0, 0]);
    }

    #[test]
    fn pathetic_band_is_unbounded() {
        let mut report = TimerReport::new(1_000_000, 125_000);
        report.add_observation(5_000_000, 1); // dev 4 ms >= 8 * width
        let snap = report.snapshot();
        assert_eq!(snap.buckets[4], 1);
    }

    #[test]
    fn slot_snapshot_matches_report() {
        let slot = ReportSlot::new("Cyclic", TimerReport::new(1_000_000, 125_000));
        slot.lock().add_observation(1_010_000, 3);
        let snap = slot.snapshot();
        assert_eq!(snap.samples, 1);
        assert_eq!(snap.max_period_ns, 1_010_000);
        assert_eq!(snap.max_index, 3);
        assert_eq!(slot.label(), "Cyclic");
    }
}
