//! Cyclic measurement infrastructure.
//!
//! - [`clock`]: monotonic time and absolute-deadline sleeping.
//! - [`thread_setup`]: SCHED_FIFO elevation and single-CPU pinning.
//! - [`driver`]: the sender/receiver cyclic loops and their record rules.

pub mod clock;
pub mod driver;
pub mod thread_setup;

pub use clock::{Clock, Monotonic, NANOS_PER_MICRO, NANOS_PER_SEC};
pub use driver::{
    receiver_loop, run_receiver, run_sender, sender_loop, CycleTiming, Probe, RUN_INDEFINITELY,
};
pub use thread_setup::{configure_current_thread, last_logical_cpu};
