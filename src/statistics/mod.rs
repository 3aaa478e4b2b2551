//! Order statistics over unbounded latency streams in bounded memory.
//!
//! - [`QuantileSketch`]: compressed centroid list with exact bucket counts
//!   and exact maximum tracking.
//! - [`TimerReport`]: a sketch plus the target period and severity bands.
//! - [`ReportSlot`]: a labelled report behind the display mutex.

mod report;
mod sketch;

pub use report::{band_edges, ReportSlot, ReportSnapshot, TimerReport, BAND_COUNT, BAND_LABELS};
pub use sketch::{QuantileSketch, DEFAULT_CAPACITY};
