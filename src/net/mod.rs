//! Raw-frame exchange over one network interface.
//!
//! - [`frame`]: the fixed EtherCAT-shaped probe frame.
//! - [`socket`]: the shared `AF_PACKET` socket with `SO_TIMESTAMPING`.
//! - [`probe`]: per-cycle send / blocking receive with timestamp accounting.

pub mod frame;
pub mod probe;
pub mod socket;

pub use frame::{build_frame, ECAT_ETHERTYPE, FRAME_LEN};
pub use probe::{NicProbe, VerboseReports};
pub use socket::{RawSocket, WireTimestamps};
