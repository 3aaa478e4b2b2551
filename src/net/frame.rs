//! The fixed probe frame.
//!
//! Every cycle transmits the same minimum-size EtherCAT-shaped frame: a
//! broadcast Ethernet header with the EtherCAT ethertype, one frame header,
//! and a single zero-length broadcast-read datagram. The drive at the far
//! end treats it as a trivial round; the evaluator only cares about when the
//! frame comes back, never about its contents.

/// EtherCAT ethertype.
pub const ECAT_ETHERTYPE: u16 = 0x88A4;

/// Minimum Ethernet frame length without FCS.
pub const FRAME_LEN: usize = 60;

const BROADCAST: [u8; 6] = [0xff; 6];

/// EtherCAT BRD (broadcast read) command.
const CMD_BRD: u8 = 0x07;

/// Build the probe frame for the given source MAC.
pub fn build_frame(src_mac: [u8; 6]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0..6].copy_from_slice(&BROADCAST);
    frame[6..12].copy_from_slice(&src_mac);
    frame[12..14].copy_from_slice(&ECAT_ETHERTYPE.to_be_bytes());

    // EtherCAT frame header: 11-bit length of the datagram area (one 10-byte
    // datagram header plus the 2-byte working counter), protocol type 1.
    let header: u16 = 12 | (1 << 12);
    frame[14..16].copy_from_slice(&header.to_le_bytes());

    // One zero-length BRD datagram: cmd, idx, 4-byte slave address, 2-byte
    // length/roundtrip field, 2-byte irq, no data, 2-byte working counter.
    frame[16] = CMD_BRD;
    // Everything else stays zero, including the padding up to 60 bytes.

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_minimum_size_broadcast_ethercat() {
        let frame = build_frame([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(frame.len(), FRAME_LEN);
        assert_eq!(&frame[0..6], &BROADCAST);
        assert_eq!(&frame[12..14], &[0x88, 0xA4]);
    }

    #[test]
    fn frame_body_is_identical_every_cycle() {
        let mac = [0x02, 0x11, 0x22, 0x33, 0x44, 0x55];
        assert_eq!(build_frame(mac), build_frame(mac));
    }

    #[test]
    fn ethercat_header_declares_one_datagram() {
        let frame = build_frame([0; 6]);
        let header = u16::from_le_bytes([frame[14], frame[15]]);
        assert_eq!(header & 0x07ff, 12);
        assert_eq!(header >> 12, 1);
        assert_eq!(frame[16], CMD_BRD);
    }
}
