//! Monotonic time and absolute-deadline sleeping.
//!
//! The cyclic driver schedules against absolute deadlines on the monotonic
//! clock: the next wake target is `previous target + period`, never
//! `now + period`, so sleep latency cannot accumulate into the period. The
//! [`Clock`] trait exists so tests can drive the loop with a synthetic
//! jitter-free clock.

use std::sync::atomic::{AtomicBool, Ordering};

pub const NANOS_PER_SEC: u64 = 1_000_000_000;
pub const NANOS_PER_MICRO: u64 = 1_000;

/// Time source for the cyclic driver.
pub trait Clock {
    /// Current monotonic time in nanoseconds.
    fn now_ns(&self) -> u64;

    /// Sleep until the absolute monotonic deadline.
    ///
    /// An early wake (signal delivery) must either re-arm to the *same*
    /// deadline or observe a cleared `running` flag and return; it must
    /// never be treated as an on-time wake.
    fn sleep_until(&self, deadline_ns: u64, running: &AtomicBool);
}

/// Production clock: `CLOCK_MONOTONIC` with `clock_nanosleep(TIMER_ABSTIME)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Monotonic;

impl Clock for Monotonic {
    fn now_ns(&self) -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }
        ns_from_timespec(&ts)
    }

    fn sleep_until(&self, deadline_ns: u64, running: &AtomicBool) {
        let deadline = timespec_from_ns(deadline_ns);
        loop {
            let rc = unsafe {
                libc::clock_nanosleep(
                    libc::CLOCK_MONOTONIC,
                    libc::TIMER_ABSTIME,
                    &deadline,
                    std::ptr::null_mut(),
                )
            };
            // Interrupted by a signal: re-arm to the same absolute deadline
            // unless shutdown was requested.
            if rc != libc::EINTR || !running.load(Ordering::Acquire) {
                break;
            }
        }
    }
}

#[inline]
pub fn ns_from_timespec(ts: &libc::timespec) -> u64 {
    (ts.tv_sec as u64)
        .wrapping_mul(NANOS_PER_SEC)
        .wrapping_add(ts.tv_nsec as u64)
}

#[inline]
pub fn timespec_from_ns(ns: u64) -> libc::timespec {
    libc::timespec {
        tv_sec: (ns / NANOS_PER_SEC) as libc::time_t,
        tv_nsec: (ns % NANOS_PER_SEC) as libc::c_long,
    }
}
