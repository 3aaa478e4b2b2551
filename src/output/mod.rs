//! Live table rendering and the 20 Hz reporter.

pub mod live;
pub mod table;

pub use live::{live_report_loop, print_final, render_report, REPORT_INTERVAL};
pub use table::{format_hms_ns, format_us, Table};
