//! Process-wide runtime state and privileged setup.
//!
//! Two atomics are the only global mutable state: `running` is the sole
//! cross-thread control signal (release stores on termination, acquire loads
//! at every loop head), `live_report` gates the reporter thread. Both exist
//! before any thread starts and outlive them all.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SetupError;

static RUNNING: AtomicBool = AtomicBool::new(true);
static LIVE_REPORT: AtomicBool = AtomicBool::new(true);

/// The process-wide run flag; measurement loops take it by reference.
pub fn running() -> &'static AtomicBool {
    &RUNNING
}

pub fn is_running() -> bool {
    RUNNING.load(Ordering::Acquire)
}

pub fn request_stop() {
    RUNNING.store(false, Ordering::Release);
}

pub fn live_report_enabled() -> bool {
    LIVE_REPORT.load(Ordering::Acquire)
}

pub fn stop_live_report() {
    LIVE_REPORT.store(false, Ordering::Release);
}

/// Ctrl-C clears the run flag; every thread notices at its next loop head.
/// There is no forced cancellation.
pub fn install_signal_handler() {
    if let Err(error) = ctrlc::set_handler(|| RUNNING.store(false, Ordering::Release)) {
        tracing::warn!(%error, "could not install Ctrl-C handler");
    }
}

pub fn effective_uid_is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Pin current and future pages; a page fault mid-cycle would dwarf the
/// latencies being measured.
pub fn lock_process_memory() -> Result<(), SetupError> {
    let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
    if rc != 0 {
        return Err(SetupError::MemoryLock(io::Error::last_os_error()));
    }
    Ok(())
}

/// Holds `/dev/cpu_dma_latency` open with a written zero, which keeps the
/// power-management subsystem out of deep C-states for the whole run
/// (cyclictest's latency trick). Closing the file restores the default.
#[derive(Debug)]
pub struct LatencyTarget {
    _file: Option<File>,
}

impl LatencyTarget {
    /// Best effort: a missing or unwritable file is logged, not fatal.
    pub fn acquire() -> Self {
        let mut file = match OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/cpu_dma_latency")
        {
            Ok(file) => file,
            Err(error) => {
                tracing::warn!(%error, "cannot open /dev/cpu_dma_latency; deep C-state exits may add latency");
                return Self { _file: None };
            }
        };
        if let Err(error) = file.write_all(&0i32.to_ne_bytes()) {
            tracing::warn!(%error, "failed to write cpu_dma_latency target");
            return Self { _file: None };
        }
        tracing::debug!("cpu_dma_latency held at 0 for the duration of the test");
        Self { _file: Some(file) }
    }
}

/// Drop a marker into the kernel trace buffer, for correlating test phases
/// with a trace-cmd capture. Opened and closed per event.
pub fn write_trace_marker(message: &str) {
    const PATHS: [&str; 2] = [
        "/sys/kernel/tracing/trace_marker",
        "/sys/kernel/debug/tracing/trace_marker",
    ];
    for path in PATHS {
        if let Ok(mut file) = OpenOptions::new().write(true).open(path) {
            if let Err(error) = file.write_all(message.as_bytes()) {
                tracing::warn!(%error, path, "trace_marker write failed");
            }
            return;
        }
    }
    tracing::debug!("trace_marker not available");
}
