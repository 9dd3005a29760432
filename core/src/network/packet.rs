//! ICMP / ICMPv6 echo packet construction and reply classification.

use std::io;

use pathprobe_common::models::EchoStatus;
use pathprobe_common::network::target::AddressFamily;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet::packet::icmp::{self, IcmpCode, IcmpPacket, IcmpType, IcmpTypes};
use pnet::packet::ipv4::Ipv4Packet;

pub const ICMP_HEADER_LEN: usize = 8;
pub const IPV6_HEADER_LEN: usize = 40;
/// Destination-unreachable code for "fragmentation needed and DF set".
const FRAGMENTATION_NEEDED: IcmpCode = IcmpCode(4);

// ICMPv6 shares the echo layout with ICMPv4, only the type numbers differ.
const V6_DESTINATION_UNREACHABLE: IcmpType = IcmpType(1);
const V6_PACKET_TOO_BIG: IcmpType = IcmpType(2);
const V6_TIME_EXCEEDED: IcmpType = IcmpType(3);
const V6_ECHO_REQUEST: IcmpType = IcmpType(128);
const V6_ECHO_REPLY: IcmpType = IcmpType(129);

/// Identifies the echo request a reply must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoKey {
    pub identifier: u16,
    pub sequence: u16,
    /// Datagram ICMP sockets rewrite the identifier, so it cannot be matched.
    pub check_identifier: bool,
}

impl EchoKey {
    fn matches(&self, identifier: u16, sequence: u16) -> bool {
        sequence == self.sequence && (!self.check_identifier || identifier == self.identifier)
    }
}

pub fn build_echo_request(
    family: AddressFamily,
    identifier: u16,
    sequence: u16,
    payload: &[u8],
) -> io::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; ICMP_HEADER_LEN + payload.len()];

    let mut packet = MutableEchoRequestPacket::new(&mut buffer)
        .ok_or_else(|| io::Error::other("buffer too small for ICMP echo request"))?;
    packet.set_icmp_type(match family {
        AddressFamily::V4 => IcmpTypes::EchoRequest,
        AddressFamily::V6 => V6_ECHO_REQUEST,
    });
    packet.set_icmp_code(IcmpCode::new(0));
    packet.set_identifier(identifier);
    packet.set_sequence_number(sequence);
    packet.set_payload(payload);

    // The kernel fills in the ICMPv6 checksum, it covers the pseudo-header.
    if family == AddressFamily::V4 {
        let checksum: u16 = IcmpPacket::new(packet.packet())
            .map(|view| icmp::checksum(&view))
            .ok_or_else(|| io::Error::other("failed to view ICMP packet"))?;
        packet.set_checksum(checksum);
    }

    Ok(buffer)
}

/// Classifies an ICMPv4 message. `None` means it is unrelated to `key`.
pub fn classify_v4(bytes: &[u8], has_ip_header: bool, key: &EchoKey) -> Option<EchoStatus> {
    let icmp_bytes: &[u8] = if has_ip_header {
        strip_ipv4_header(bytes)?
    } else {
        bytes
    };
    let message = IcmpPacket::new(icmp_bytes)?;

    match message.get_icmp_type() {
        IcmpTypes::EchoReply => {
            let reply = EchoReplyPacket::new(icmp_bytes)?;
            key.matches(reply.get_identifier(), reply.get_sequence_number())
                .then_some(EchoStatus::Success)
        }
        IcmpTypes::TimeExceeded => quotes_v4(icmp_bytes, key).then_some(EchoStatus::TtlExpired),
        IcmpTypes::DestinationUnreachable => {
            if !quotes_v4(icmp_bytes, key) {
                return None;
            }
            if message.get_icmp_code() == FRAGMENTATION_NEEDED {
                Some(EchoStatus::PacketTooBig)
            } else {
                Some(EchoStatus::OtherFailure)
            }
        }
        _ => None,
    }
}

/// Classifies an ICMPv6 message. Raw ICMPv6 sockets never deliver the IPv6 header.
pub fn classify_v6(bytes: &[u8], key: &EchoKey) -> Option<EchoStatus> {
    let message = IcmpPacket::new(bytes)?;

    match message.get_icmp_type() {
        V6_ECHO_REPLY => {
            let reply = EchoReplyPacket::new(bytes)?;
            key.matches(reply.get_identifier(), reply.get_sequence_number())
                .then_some(EchoStatus::Success)
        }
        V6_TIME_EXCEEDED => quotes_v6(bytes, key).then_some(EchoStatus::TtlExpired),
        V6_PACKET_TOO_BIG => quotes_v6(bytes, key).then_some(EchoStatus::PacketTooBig),
        V6_DESTINATION_UNREACHABLE => quotes_v6(bytes, key).then_some(EchoStatus::OtherFailure),
        _ => None,
    }
}

fn strip_ipv4_header(bytes: &[u8]) -> Option<&[u8]> {
    let header = Ipv4Packet::new(bytes)?;
    let header_len: usize = usize::from(header.get_header_length()) * 4;
    bytes.get(header_len..)
}

// ICMP errors quote the offending IP header plus the first 8 bytes of our echo request.
fn quotes_v4(icmp_bytes: &[u8], key: &EchoKey) -> bool {
    let Some(inner) = icmp_bytes.get(ICMP_HEADER_LEN..).and_then(strip_ipv4_header) else {
        return false;
    };
    EchoRequestPacket::new(inner).is_some_and(|request| {
        request.get_icmp_type() == IcmpTypes::EchoRequest
            && key.matches(request.get_identifier(), request.get_sequence_number())
    })
}

fn quotes_v6(icmp_bytes: &[u8], key: &EchoKey) -> bool {
    let Some(inner) = icmp_bytes.get(ICMP_HEADER_LEN + IPV6_HEADER_LEN..) else {
        return false;
    };
    EchoRequestPacket::new(inner).is_some_and(|request| {
        request.get_icmp_type() == V6_ECHO_REQUEST
            && key.matches(request.get_identifier(), request.get_sequence_number())
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
