//! Error types for host evaluation.

use std::io;

use thiserror::Error;

/// Errors that abort the run before or during thread setup.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Raw sockets and most of the configuration evidence need euid 0.
    #[error("not running as root; raw sockets and scheduler setup require euid 0")]
    NotRoot,

    /// `mlockall` failed; measurements would be exposed to paging stalls.
    #[error("failed to lock process memory: {0}")]
    MemoryLock(#[source] io::Error),

    /// The kernel rejected SCHED_FIFO at the requested priority.
    #[error("failed to set thread priority to {priority}: {source}")]
    Priority {
        priority: i32,
        #[source]
        source: io::Error,
    },

    /// The kernel rejected the single-CPU affinity mask.
    #[error("failed to set cpu affinity to CPU {cpu}: {source}")]
    Affinity {
        cpu: usize,
        #[source]
        source: io::Error,
    },
}

/// Errors raised while opening or driving the raw NIC socket.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no interface named {0}")]
    NoSuchInterface(String),

    #[error("interface name {0:?} is not a valid C string")]
    InterfaceName(String),

    #[error("failed to open raw socket: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to bind raw socket to {nic}: {source}")]
    Bind {
        nic: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read hardware address of {nic}: {source}")]
    HardwareAddress {
        nic: String,
        #[source]
        source: io::Error,
    },

    #[error("send failed: {0}")]
    Send(#[source] io::Error),
}

/// Terminal outcome of a measurement thread.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("send failed on iteration {index}: {source}")]
    Send {
        index: u64,
        #[source]
        source: ProbeError,
    },

    #[error("failed to receive message on index {index}")]
    Receive { index: u64 },
}
