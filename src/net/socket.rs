//! Raw `AF_PACKET` socket bound to one interface.
//!
//! One socket serves both directions: the sender thread calls [`RawSocket::send`]
//! while the receiver blocks in poll/recvmsg. The kernel's packet queues are
//! safe for that split, so no userland lock sits between the two threads.
//!
//! When timestamping is requested, `SO_TIMESTAMPING` is armed for hardware
//! and software stamps in both directions: receive stamps arrive as
//! `SCM_TIMESTAMPING` control messages on the data path, transmit stamps are
//! drained from the socket error queue.

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use crate::error::ProbeError;

use super::frame::ECAT_ETHERTYPE;

// linux/net_tstamp.h; the libc crate does not carry every flag on every
// target, so the bits are spelled out here.
const SOF_TIMESTAMPING_TX_HARDWARE: libc::c_uint = 1 << 0;
const SOF_TIMESTAMPING_TX_SOFTWARE: libc::c_uint = 1 << 1;
const SOF_TIMESTAMPING_RX_HARDWARE: libc::c_uint = 1 << 2;
const SOF_TIMESTAMPING_RX_SOFTWARE: libc::c_uint = 1 << 3;
const SOF_TIMESTAMPING_SOFTWARE: libc::c_uint = 1 << 4;
const SOF_TIMESTAMPING_RAW_HARDWARE: libc::c_uint = 1 << 6;
const SOF_TIMESTAMPING_OPT_TSONLY: libc::c_uint = 1 << 11;

/// Receive or transmit timestamps pulled from one `SCM_TIMESTAMPING`
/// control message, in nanoseconds on the respective clock. A zero stamp
/// from the kernel means "not taken" and maps to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireTimestamps {
    pub software_ns: Option<u64>,
    pub hardware_ns: Option<u64>,
}

impl WireTimestamps {
    fn from_stamps(stamps: [libc::timespec; 3]) -> Self {
        let to_ns = |ts: &libc::timespec| {
            let ns = (ts.tv_sec as u64) * 1_000_000_000 + ts.tv_nsec as u64;
            (ns != 0).then_some(ns)
        };
        Self {
            software_ns: to_ns(&stamps[0]),
            // stamps[1] is the legacy transformed slot, unused since 2.6.
            hardware_ns: to_ns(&stamps[2]),
        }
    }
}

#[derive(Debug)]
pub struct RawSocket {
    fd: OwnedFd,
}

impl RawSocket {
    /// Open a raw EtherCAT socket bound to `nic`.
    pub fn open(nic: &str, timestamping: bool) -> Result<Self, ProbeError> {
        let name = CString::new(nic).map_err(|_| ProbeError::InterfaceName(nic.to_string()))?;
        let ifindex = unsafe { libc::if_nametoindex(name.as_ptr()) };
        if ifindex == 0 {
            return Err(ProbeError::NoSuchInterface(nic.to_string()));
        }

        let protocol = ECAT_ETHERTYPE.to_be();
        let raw = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, protocol as libc::c_int) };
        if raw < 0 {
            return Err(ProbeError::Socket(io::Error::last_os_error()));
        }
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut addr: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as libc::sa_family_t;
        addr.sll_protocol = protocol;
        addr.sll_ifindex = ifindex as libc::c_int;
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if rc != 0 {
            return Err(ProbeError::Bind {
                nic: nic.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        let socket = Self { fd };
        if timestamping {
            socket.enable_timestamping();
        }
        Ok(socket)
    }

    /// Ask for hardware and software stamps in both directions. Interfaces
    /// without hardware support simply deliver the software stamps only.
    fn enable_timestamping(&self) {
        let flags: libc::c_uint = SOF_TIMESTAMPING_TX_HARDWARE
            | SOF_TIMESTAMPING_TX_SOFTWARE
            | SOF_TIMESTAMPING_RX_HARDWARE
            | SOF_TIMESTAMPING_RX_SOFTWARE
            | SOF_TIMESTAMPING_SOFTWARE
            | SOF_TIMESTAMPING_RAW_HARDWARE
            | SOF_TIMESTAMPING_OPT_TSONLY;
        let rc = unsafe {
            libc::setsockopt(
                self.fd.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_TIMESTAMPING,
                &flags as *const libc::c_uint as *const libc::c_void,
                std::mem::size_of::<libc::c_uint>() as libc::socklen_t,
            )
        };
        if rc != 0 {
            tracing::warn!(
                error = %io::Error::last_os_error(),
                "SO_TIMESTAMPING rejected; timestamp deltas will not be reported"
            );
        }
    }

    /// MAC address of the bound interface, for the frame source field.
    pub fn hardware_address(&self, nic: &str) -> Result<[u8; 6], ProbeError> {
        let mut req: libc::ifreq = unsafe { std::mem::zeroed() };
        for (dst, src) in req.ifr_name.iter_mut().zip(nic.as_bytes()) {
            *dst = *src as libc::c_char;
        }
        let rc = unsafe { libc::ioctl(self.fd.as_raw_fd(), libc::SIOCGIFHWADDR, &mut req) };
        if rc != 0 {
            return Err(ProbeError::HardwareAddress {
                nic: nic.to_string(),
                source: io::Error::last_os_error(),
            });
        }
        let sa_data = unsafe { req.ifr_ifru.ifru_hwaddr.sa_data };
        let mut mac = [0u8; 6];
        for (dst, src) in mac.iter_mut().zip(sa_data.iter()) {
            *dst = *src as u8;
        }
        Ok(mac)
    }

    pub fn send(&self, frame: &[u8]) -> io::Result<()> {
        let n = unsafe {
            libc::send(
                self.fd.as_raw_fd(),
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Wait up to `timeout_ms` for the socket to become readable.
    ///
    /// Returns the raw `revents` mask, `0` on timeout. `POLLERR` alone means
    /// the error queue holds a transmit timestamp, not a failure.
    pub fn poll_readable(&self, timeout_ms: libc::c_int) -> io::Result<libc::c_short> {
        let mut pfd = libc::pollfd {
            fd: self.fd.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        if rc == 0 {
            return Ok(0);
        }
        Ok(pfd.revents)
    }

    /// Receive one frame plus its receive timestamps.
    pub fn recv_with_timestamps(&self, buf: &mut [u8]) -> io::Result<(usize, WireTimestamps)> {
        let (n, stamps) = self.recvmsg(buf, 0)?;
        Ok((n, stamps))
    }

    /// Drain one transmit-timestamp entry from the error queue, if present.
    pub fn recv_tx_timestamp(&self) -> io::Result<Option<WireTimestamps>> {
        let mut scratch = [0u8; 64];
        match self.recvmsg(&mut scratch, libc::MSG_ERRQUEUE | libc::MSG_DONTWAIT) {
            Ok((_, stamps)) => Ok(Some(stamps)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn recvmsg(&self, buf: &mut [u8], flags: libc::c_int) -> io::Result<(usize, WireTimestamps)> {
        let mut iov = libc::iovec {
            iov_base: buf.as_mut_ptr() as *mut libc::c_void,
            iov_len: buf.len(),
        };
        // u64-backed control buffer keeps cmsg headers aligned.
        let mut control = [0u64; 64];
        let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = control.as_mut_ptr() as *mut libc::c_void;
        msg.msg_controllen = std::mem::size_of_val(&control);

        let n = unsafe { libc::recvmsg(self.fd.as_raw_fd(), &mut msg, flags) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok((n as usize, parse_timestamps(&msg)))
    }
}

fn parse_timestamps(msg: &libc::msghdr) -> WireTimestamps {
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(msg);
        while !cmsg.is_null() {
            if (*cmsg).cmsg_level == libc::SOL_SOCKET
                && (*cmsg).cmsg_type == libc::SCM_TIMESTAMPING
            {
                let data = libc::CMSG_DATA(cmsg) as *const libc::timespec;
                let stamps = [
                    std::ptr::read_unaligned(data),
                    std::ptr::read_unaligned(data.add(1)),
                    std::ptr::read_unaligned(data.add(2)),
                ];
                return WireTimestamps::from_stamps(stamps);
            }
            cmsg = libc::CMSG_NXTHDR(msg, cmsg);
        }
    }
    WireTimestamps::default()
}
