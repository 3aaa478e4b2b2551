//! Real-time scheduling setup for the calling thread.
//!
//! Each measurement thread elevates itself to SCHED_FIFO at an explicit
//! priority and pins itself to a single logical CPU. Both operations apply
//! to the calling thread only; failure of either is fatal to the thread.

use std::io;

use crate::error::SetupError;

/// Switch the calling thread to SCHED_FIFO at `priority` and bind it to
/// `cpu` with a single-CPU affinity mask.
pub fn configure_current_thread(priority: i32, cpu: usize) -> Result<(), SetupError> {
    let thread = unsafe { libc::pthread_self() };

    let params = libc::sched_param {
        sched_priority: priority,
    };
    let rc = unsafe { libc::pthread_setschedparam(thread, libc::SCHED_FIFO, &params) };
    if rc != 0 {
        return Err(SetupError::Priority {
            priority,
            source: io::Error::from_raw_os_error(rc),
        });
    }

    let mut mask: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut mask);
        libc::CPU_SET(cpu, &mut mask);
    }
    let rc = unsafe {
        libc::pthread_setaffinity_np(thread, std::mem::size_of::<libc::cpu_set_t>(), &mask)
    };
    if rc != 0 {
        return Err(SetupError::Affinity {
            cpu,
            source: io::Error::from_raw_os_error(rc),
        });
    }

    tracing::debug!(priority, cpu, "thread switched to SCHED_FIFO and pinned");
    Ok(())
}

/// Index of the last logical CPU, the default home for measurement threads.
pub fn last_logical_cpu() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() - 1)
        .unwrap_or(0)
}
