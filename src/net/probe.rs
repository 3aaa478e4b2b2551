//! The NIC probe: one raw frame out per cycle, one frame back.
//!
//! The sender thread transmits the fixed probe frame; the receiver thread
//! blocks until the frame returns through the EtherCAT ring. In verbose mode
//! the probe owns two extra report slots and records `hw_rx - hw_tx` and
//! `sw_rx - sw_tx` per cycle from the kernel's timestamping messages.

use crate::error::ProbeError;
use crate::runtime;
use crate::statistics::ReportSlot;

use super::frame::{build_frame, FRAME_LEN};
use super::socket::{RawSocket, WireTimestamps};

/// A poll slice well above any sane cycle time; two misses in a row count
/// as a persistent timeout and end the test.
const RECEIVE_TIMEOUT_MS: libc::c_int = 2_000;
const MAX_CONSECUTIVE_TIMEOUTS: u32 = 2;

/// Report sinks for the verbose timestamp deltas.
pub struct VerboseReports<'a> {
    pub hardware: &'a ReportSlot,
    pub software: &'a ReportSlot,
}

/// Shared probe state. One owner; sender and receiver threads borrow it and
/// use the one raw socket concurrently (kernel packet queues make the
/// send/recv split safe without a lock).
pub struct NicProbe<'a> {
    socket: RawSocket,
    frame: [u8; FRAME_LEN],
    reports: Option<VerboseReports<'a>>,
}

impl<'a> NicProbe<'a> {
    /// Open the probe on `nic`. Timestamping is armed only when verbose
    /// reports are attached; otherwise the error queue stays silent.
    pub fn open(nic: &str, reports: Option<VerboseReports<'a>>) -> Result<Self, ProbeError> {
        let socket = RawSocket::open(nic, reports.is_some())?;
        let mac = socket.hardware_address(nic)?;
        tracing::debug!(
            nic,
            mac = %format_args!(
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
            ),
            "raw EtherCAT socket ready"
        );
        Ok(Self {
            socket,
            frame: build_frame(mac),
            reports,
        })
    }

    /// Transmit the probe frame. The body is identical on every cycle.
    pub fn send(&self) -> Result<(), ProbeError> {
        self.socket.send(&self.frame).map_err(ProbeError::Send)
    }

    /// Block until the probe frame returns.
    ///
    /// `false` is terminal: persistent timeout, socket error, or shutdown
    /// while waiting. The caller clears the run flag and exits on it.
    pub fn receive(&self, index: u64) -> bool {
        let mut buf = [0u8; 1518];
        let mut timeouts = 0u32;
        let mut tx: Option<WireTimestamps> = None;

        loop {
            let revents = match self.socket.poll_readable(RECEIVE_TIMEOUT_MS) {
                Ok(revents) => revents,
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {
                    if runtime::is_running() {
                        continue;
                    }
                    return false;
                }
                Err(error) => {
                    tracing::warn!(index, %error, "poll failed on raw socket");
                    return false;
                }
            };

            if revents == 0 {
                timeouts += 1;
                if timeouts >= MAX_CONSECUTIVE_TIMEOUTS {
                    tracing::warn!(index, "no frame returned within timeout");
                    return false;
                }
                continue;
            }

            if revents & libc::POLLERR != 0 {
                // Transmit timestamps surface on the error queue; drain them
                // even when unused so POLLERR clears.
                match self.socket.recv_tx_timestamp() {
                    Ok(Some(stamps)) => tx = tx.or(Some(stamps)),
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(index, %error, "error queue read failed");
                        return false;
                    }
                }
            }

            if revents & libc::POLLIN == 0 {
                continue;
            }

            match self.socket.recv_with_timestamps(&mut buf) {
                Ok((_, rx)) => {
                    if self.reports.is_some() {
                        if tx.is_none() {
                            tx = self.socket.recv_tx_timestamp().ok().flatten();
                        }
                        self.record_deltas(tx, rx, index);
                    }
                    return true;
                }
                Err(error) => {
                    tracing::warn!(index, %error, "receive failed on raw socket");
                    return false;
                }
            }
        }
    }

    fn record_deltas(&self, tx: Option<WireTimestamps>, rx: WireTimestamps, index: u64) {
        let Some(reports) = &self.reports else { return };
        let Some(tx) = tx else { return };
        if let (Some(sent), Some(received)) = (tx.hardware_ns, rx.hardware_ns) {
            reports
                .hardware
                .lock()
                .add_observation(received.saturating_sub(sent), index);
        }
        if let (Some(sent), Some(received)) = (tx.software_ns, rx.software_ns) {
            reports
                .software
                .lock()
                .add_observation(received.saturating_sub(sent), index);
        }
    }
}
