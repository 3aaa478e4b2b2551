//! # metronome
//!
//! Evaluate whether a Linux host is fit to run a hard-real-time EtherCAT
//! motion controller.
//!
//! The evaluator launches tightly scheduled cyclic work on an isolated CPU
//! core, measures per-iteration wake-up jitter against a target period, and
//! redraws latency distributions live. Before (or instead of) measuring, it
//! audits kernel, CPU, and NIC configuration against the preconditions of a
//! deterministic real-time workload.
//!
//! ## Architecture
//!
//! - [`statistics`]: bounded-memory quantile sketches and per-thread
//!   latency reports with severity bands.
//! - [`measurement`]: the absolute-time cyclic driver, SCHED_FIFO thread
//!   setup, and the monotonic clock abstraction.
//! - [`net`]: the raw `AF_PACKET` EtherCAT probe with hardware/software
//!   timestamping.
//! - [`preflight`]: the host configuration audit over an injectable
//!   filesystem-like data source.
//! - [`output`]: the live severity table, redrawn in place at 20 Hz.
//! - [`runtime`]: process-wide run state, memory locking, and the
//!   `cpu_dma_latency` guard.
//!
//! The binary in `main.rs` wires these together; integration tests drive
//! the library pieces directly.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod measurement;
pub mod net;
pub mod output;
pub mod preflight;
pub mod runtime;
pub mod statistics;

pub use config::{Cli, TestParams};
pub use error::{DriverError, ProbeError, SetupError};
