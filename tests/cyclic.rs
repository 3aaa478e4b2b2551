//! Driver behavior end to end against a synthetic clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use metronome::measurement::{sender_loop, Clock, CycleTiming, Probe, RUN_INDEFINITELY};
use metronome::statistics::{ReportSlot, TimerReport};

const PERIOD: u64 = 1_000_000;

/// Deterministic clock with a programmable per-sleep overshoot.
struct ScriptedClock {
    now: Mutex<u64>,
    overshoot_ns: Vec<u64>,
    sleeps: Mutex<usize>,
}

impl ScriptedClock {
    fn new(overshoot_ns: Vec<u64>) -> Self {
        Self {
            now: Mutex::new(0),
            overshoot_ns,
            sleeps: Mutex::new(0),
        }
    }
}

impl Clock for ScriptedClock {
    fn now_ns(&self) -> u64 {
        *self.now.lock().unwrap()
    }

    fn sleep_until(&self, deadline_ns: u64, _running: &AtomicBool) {
        let mut sleeps = self.sleeps.lock().unwrap();
        let overshoot = self.overshoot_ns.get(*sleeps).copied().unwrap_or(0);
        *sleeps += 1;
        let mut now = self.now.lock().unwrap();
        *now = deadline_ns.max(*now) + overshoot;
    }
}

fn slot() -> ReportSlot {
    ReportSlot::new("Cyclic", TimerReport::new(PERIOD, PERIOD / 8))
}

#[test]
fn jitter_free_run_records_iterations_minus_two() {
    let clock = ScriptedClock::new(vec![]);
    let running = AtomicBool::new(true);
    let timing = CycleTiming {
        period_ns: PERIOD,
        iterations: 100,
    };
    let slot = slot();
    sender_loop(&clock, &running, &timing, Probe::Idle, &slot).unwrap();

    let snap = slot.snapshot();
    assert_eq!(snap.samples, 98);
    // Every recorded period is exactly the target: all land in the first
    // (sub-125 us deviation) bucket.
    assert_eq!(snap.buckets, [98, 0, 0, 0, 0]);
    assert_eq!(snap.p50_deviation_ns, 0);
}

#[test]
fn constant_oversleep_shows_up_as_deviation_not_drift() {
    // Every wake lands 10 us late, but the schedule is absolute: after the
    // first late wake the period between wakes is back to the target, so
    // the lateness must not accumulate.
    let clock = ScriptedClock::new(vec![10_000; 1000]);
    let running = AtomicBool::new(true);
    let timing = CycleTiming {
        period_ns: PERIOD,
        iterations: 500,
    };
    let slot = slot();
    sender_loop(&clock, &running, &timing, Probe::Idle, &slot).unwrap();

    let snap = slot.snapshot();
    assert_eq!(snap.samples, 498);
    // All deviations stay within the first band: the absolute schedule
    // absorbs a constant sleep latency instead of integrating it.
    assert_eq!(snap.buckets[0], 498);
    assert!(snap.max_period_ns <= PERIOD + 10_000);
}

#[test]
fn single_long_stall_is_one_bad_sample() {
    let mut overshoots = vec![0u64; 300];
    overshoots[150] = 7 * PERIOD;
    let clock = ScriptedClock::new(overshoots);
    let running = AtomicBool::new(true);
    let timing = CycleTiming {
        period_ns: PERIOD,
        iterations: 300,
    };
    let slot = slot();
    sender_loop(&clock, &running, &timing, Probe::Idle, &slot).unwrap();

    let snap = slot.snapshot();
    // Counts are not inflated by the skipped cycles.
    assert_eq!(snap.samples, 298);
    assert_eq!(snap.buckets.iter().sum::<u64>(), 298);
    assert_eq!(snap.buckets[4], 1);
    assert!(snap.max_period_ns >= 7 * PERIOD);
}

#[test]
fn cleared_flag_ends_an_indefinite_run_at_the_loop_head() {
    struct StopAfter {
        inner: ScriptedClock,
        stop_at: usize,
    }
    impl Clock for StopAfter {
        fn now_ns(&self) -> u64 {
            self.inner.now_ns()
        }
        fn sleep_until(&self, deadline_ns: u64, running: &AtomicBool) {
            self.inner.sleep_until(deadline_ns, running);
            if *self.inner.sleeps.lock().unwrap() >= self.stop_at {
                running.store(false, Ordering::Release);
            }
        }
    }

    let clock = StopAfter {
        inner: ScriptedClock::new(vec![]),
        stop_at: 25,
    };
    let running = AtomicBool::new(true);
    let timing = CycleTiming {
        period_ns: PERIOD,
        iterations: RUN_INDEFINITELY,
    };
    let slot = slot();
    sender_loop(&clock, &running, &timing, Probe::Idle, &slot).unwrap();

    // 25 iterations completed; in an indefinite run only iteration 0 is
    // skipped, so 24 observations were recorded.
    assert_eq!(slot.snapshot().samples, 24);
}
