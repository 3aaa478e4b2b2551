//! The absolute-time cyclic driver.
//!
//! A sender loop wakes every period on an absolute monotonic deadline,
//! optionally fires its probe, and feeds wake-to-wake deltas to a report. A
//! receiver loop paces itself on the blocking receive path instead of a
//! timer. Both cooperate through the process-wide `running` flag and exit at
//! the next loop head once it clears.
//!
//! Iteration 0 is never recorded (warm-up artifact); the final iteration of
//! a finite run is not recorded either (teardown artifact). When the loop
//! falls behind its schedule it skips ahead whole periods without recording
//! the missed cycles.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::TestParams;
use crate::error::DriverError;
use crate::net::NicProbe;
use crate::statistics::ReportSlot;

use super::clock::{Clock, Monotonic};
use super::thread_setup::configure_current_thread;

/// Iteration-count sentinel: run until interrupted.
pub const RUN_INDEFINITELY: u64 = u64::MAX;

/// Timing inputs of one cyclic loop.
#[derive(Debug, Clone, Copy)]
pub struct CycleTiming {
    pub period_ns: u64,
    pub iterations: u64,
}

impl CycleTiming {
    fn of(params: &TestParams) -> Self {
        Self {
            period_ns: params.period_ns,
            iterations: params.iterations,
        }
    }
}

/// Per-cycle work dispatched by the sender loop. A closed set: cyclic-only
/// mode runs no I/O at all, NIC mode transmits one frame per cycle.
#[derive(Clone, Copy)]
pub enum Probe<'a> {
    Idle,
    Nic(&'a NicProbe<'a>),
}

/// First and last iterations carry setup and teardown artifacts; in an
/// indefinite run there is no last iteration to skip.
fn should_record(index: u64, iterations: u64) -> bool {
    index != 0 && index != iterations - 1
}

/// Cyclic sender loop against an absolute-time schedule.
pub fn sender_loop<C: Clock>(
    clock: &C,
    running: &AtomicBool,
    timing: &CycleTiming,
    probe: Probe<'_>,
    slot: &ReportSlot,
) -> Result<(), DriverError> {
    let mut index: u64 = 0;
    let mut previous: Option<u64> = None;
    let mut next = clock.now_ns();

    while running.load(Ordering::Acquire) && index < timing.iterations {
        let record = should_record(index, timing.iterations);

        if let Probe::Nic(nic) = probe {
            if let Err(source) = nic.send() {
                running.store(false, Ordering::Release);
                return Err(DriverError::Send { index, source });
            }
        }

        let current = clock.now_ns();
        if record {
            if let Some(prev) = previous {
                slot.lock().add_observation(current.saturating_sub(prev), index);
            }
        }

        next += timing.period_ns;
        // Fell behind: skip whole periods until the deadline is in the
        // future again. The missed cycles are not recorded.
        while current > next {
            next += timing.period_ns;
        }
        clock.sleep_until(next, running);

        previous = Some(current);
        index += 1;
    }
    Ok(())
}

/// Receiver loop: paced by the blocking receive, not by a timer.
///
/// A failed receive is terminal: the loop clears `running` so its peer exits
/// at the next loop head, and reports the iteration it died on.
pub fn receiver_loop<C: Clock>(
    clock: &C,
    running: &AtomicBool,
    timing: &CycleTiming,
    probe: &NicProbe<'_>,
    slot: &ReportSlot,
) -> Result<(), DriverError> {
    let mut index: u64 = 0;
    let mut previous: Option<u64> = None;

    while running.load(Ordering::Acquire) && index < timing.iterations {
        let record = should_record(index, timing.iterations);

        if !probe.receive(index) {
            // A false return while the flag was already clear is a
            // cooperative shutdown (Ctrl-C or peer failure), not an error.
            if running.swap(false, Ordering::AcqRel) {
                return Err(DriverError::Receive { index });
            }
            break;
        }

        let current = clock.now_ns();
        if record {
            if let Some(prev) = previous {
                slot.lock().add_observation(current.saturating_sub(prev), index);
            }
        }

        previous = Some(current);
        index += 1;
    }
    Ok(())
}

/// Thread body of the sender: elevate, pin, run, and on any error clear the
/// run flag and leave a one-line diagnostic before returning cleanly.
pub fn run_sender(
    running: &AtomicBool,
    params: &TestParams,
    probe: Probe<'_>,
    slot: &ReportSlot,
) -> Result<(), DriverError> {
    let result = configure_current_thread(params.send_priority, params.send_cpu)
        .map_err(DriverError::from)
        .and_then(|()| sender_loop(&Monotonic, running, &CycleTiming::of(params), probe, slot));
    if let Err(ref error) = result {
        running.store(false, Ordering::Release);
        eprintln!("error in sender thread: {error}");
    }
    result
}

/// Thread body of the receiver; mirrors [`run_sender`].
pub fn run_receiver(
    running: &AtomicBool,
    params: &TestParams,
    probe: &NicProbe<'_>,
    slot: &ReportSlot,
) -> Result<(), DriverError> {
    let result = configure_current_thread(params.receive_priority, params.receive_cpu)
        .map_err(DriverError::from)
        .and_then(|()| receiver_loop(&Monotonic, running, &CycleTiming::of(params), probe, slot));
    if let Err(ref error) = result {
        running.store(false, Ordering::Release);
        eprintln!("error in receiver thread: {error}");
    }
    result
}
