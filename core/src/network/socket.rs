//! Blocking ICMP socket used by [`super::icmp::IcmpSender`].

use std::io;
use std::mem::MaybeUninit;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use pathprobe_common::models::EchoStatus;
use pathprobe_common::network::target::AddressFamily;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, warn};

use super::packet::{self, EchoKey};
use crate::echo::{EchoReply, EchoRequest};

const RECV_BUFFER_LEN: usize = 65_536;

pub struct IcmpSocket {
    socket: Socket,
    family: AddressFamily,
    is_dgram: bool,
    ttl: Option<u8>,
    dont_fragment: Option<bool>,
    buffer: Vec<MaybeUninit<u8>>,
}

impl IcmpSocket {
    /// Opens a raw ICMP socket, falling back to the unprivileged datagram kind.
    pub fn open(family: AddressFamily) -> io::Result<Self> {
        let (domain, protocol) = match family {
            AddressFamily::V4 => (Domain::IPV4, Protocol::ICMPV4),
            AddressFamily::V6 => (Domain::IPV6, Protocol::ICMPV6),
        };

        let (socket, is_dgram) = match Socket::new(domain, Type::RAW, Some(protocol)) {
            Ok(socket) => (socket, false),
            Err(raw_err) => {
                let socket = Socket::new(domain, Type::DGRAM, Some(protocol)).map_err(|_| raw_err)?;
                warn!("Raw {family} ICMP socket unavailable, using unprivileged datagram socket (router ICMP errors are not received)");
                (socket, true)
            }
        };
        socket.set_nonblocking(false)?;

        debug!("Opened {family} ICMP socket (dgram: {is_dgram})");
        Ok(Self {
            socket,
            family,
            is_dgram,
            ttl: None,
            dont_fragment: None,
            buffer: vec![MaybeUninit::uninit(); RECV_BUFFER_LEN],
        })
    }

    /// Sends one echo request and waits for the matching reply or the deadline.
    pub fn round_trip(
        &mut self,
        request: &EchoRequest,
        identifier: u16,
        sequence: u16,
    ) -> io::Result<EchoReply> {
        self.apply_ttl(request.ttl)?;
        self.apply_dont_fragment(request.dont_fragment);

        let bytes: Vec<u8> = packet::build_echo_request(self.family, identifier, sequence, &request.payload)?;
        let destination = SockAddr::from(SocketAddr::new(request.address, 0));
        let key = EchoKey {
            identifier,
            sequence,
            check_identifier: !self.is_dgram,
        };

        let started: Instant = Instant::now();
        if let Err(e) = self.socket.send_to(&bytes, &destination) {
            if e.raw_os_error() == Some(libc::EMSGSIZE) {
                return Ok(EchoReply::new(EchoStatus::PacketTooBig, None, Some(started.elapsed())));
            }
            return Err(e);
        }

        let deadline: Instant = started + request.timeout;
        loop {
            let remaining: Duration = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(EchoReply::timed_out());
            }
            self.socket.set_read_timeout(Some(remaining))?;

            let (len, from) = match self.socket.recv_from(&mut self.buffer) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    return Ok(EchoReply::timed_out());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let round_trip: Duration = started.elapsed();

            // SAFETY: recv_from initialized the first `len` bytes of the buffer.
            let data: &[u8] = unsafe { std::slice::from_raw_parts(self.buffer.as_ptr().cast::<u8>(), len) };

            let status: Option<EchoStatus> = match self.family {
                AddressFamily::V4 => packet::classify_v4(data, self.has_ip_header(), &key),
                AddressFamily::V6 => packet::classify_v6(data, &key),
            };
            if let Some(status) = status {
                let responder: Option<IpAddr> = from.as_socket().map(|addr| addr.ip());
                return Ok(EchoReply::new(status, responder, Some(round_trip)));
            }
        }
    }

    // Raw IPv4 sockets deliver the IP header, and so do datagram ones on macOS.
    fn has_ip_header(&self) -> bool {
        self.family == AddressFamily::V4 && (!self.is_dgram || cfg!(target_os = "macos"))
    }

    fn apply_ttl(&mut self, ttl: u8) -> io::Result<()> {
        if self.ttl == Some(ttl) {
            return Ok(());
        }
        match self.family {
            AddressFamily::V4 => self.socket.set_ttl(u32::from(ttl))?,
            AddressFamily::V6 => self.socket.set_unicast_hops_v6(u32::from(ttl))?,
        }
        self.ttl = Some(ttl);
        Ok(())
    }

    fn apply_dont_fragment(&mut self, enabled: bool) {
        if self.dont_fragment == Some(enabled) {
            return;
        }
        if let Err(e) = set_dont_fragment(&self.socket, self.family, enabled) {
            warn!("Could not change the don't-fragment flag: {e}");
        }
        self.dont_fragment = Some(enabled);
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn set_dont_fragment(socket: &Socket, family: AddressFamily, enabled: bool) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    #[cfg(target_os = "linux")]
    const IP_MTU_DISCOVER: libc::c_int = 10;
    #[cfg(target_os = "linux")]
    const IP_PMTUDISC_DO: libc::c_int = 2;
    #[cfg(target_os = "linux")]
    const IP_PMTUDISC_DONT: libc::c_int = 0;
    #[cfg(target_os = "macos")]
    const IP_DONTFRAG: libc::c_int = 28;
    const IPV6_DONTFRAG: libc::c_int = 62;

    let (level, name, value): (libc::c_int, libc::c_int, libc::c_int) = match family {
        #[cfg(target_os = "linux")]
        AddressFamily::V4 => (
            libc::IPPROTO_IP,
            IP_MTU_DISCOVER,
            if enabled { IP_PMTUDISC_DO } else { IP_PMTUDISC_DONT },
        ),
        #[cfg(target_os = "macos")]
        AddressFamily::V4 => (libc::IPPROTO_IP, IP_DONTFRAG, libc::c_int::from(enabled)),
        AddressFamily::V6 => (libc::IPPROTO_IPV6, IPV6_DONTFRAG, libc::c_int::from(enabled)),
    };

    // SAFETY: `value` outlives the call and the length matches its type.
    let ret: libc::c_int = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            level,
            name,
            &value as *const libc::c_int as *const libc::c_void,
            std::mem::size_of_val(&value) as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn set_dont_fragment(_socket: &Socket, _family: AddressFamily, enabled: bool) -> io::Result<()> {
    if enabled {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "don't-fragment is not supported on this platform",
        ));
    }
    Ok(())
}
