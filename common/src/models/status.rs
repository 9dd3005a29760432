use std::net::IpAddr;
use std::time::Duration;

use super::echo::{EchoResult, EchoStatus};

/// One echo attempt bound to its place in a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingStatus {
    /// Local host name.
    pub source: String,
    pub destination: String,
    pub destination_address: IpAddr,
    /// 1-based index of the attempt.
    pub sequence: u32,
    pub reply: EchoResult,
}

impl PingStatus {
    /// Address that answered, or the destination when nobody did.
    pub fn address(&self) -> IpAddr {
        self.reply.address.unwrap_or(self.destination_address)
    }

    pub fn latency(&self) -> Duration {
        self.reply.round_trip
    }

    pub fn buffer_size(&self) -> usize {
        self.reply.buffer_size
    }

    pub fn status(&self) -> EchoStatus {
        self.reply.status
    }
}

/// Raw per-attempt record emitted by repeat-mode pings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReply {
    pub destination: String,
    pub sequence: u32,
    pub reply: EchoResult,
}

/// One echo attempt of a traceroute hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHopStatus {
    pub hop: u8,
    /// The echo this record was emitted for.
    pub ping: PingStatus,
    /// First responder seen at this hop, fixed for the remaining attempts.
    pub hop_address: Option<IpAddr>,
    pub hop_name: Option<String>,
    pub target: String,
    pub target_address: IpAddr,
}

impl TraceHopStatus {
    /// A router answering with TTL-expired is a hop that worked.
    pub fn status(&self) -> EchoStatus {
        match self.ping.status() {
            EchoStatus::TtlExpired => EchoStatus::Success,
            other => other,
        }
    }

    pub fn latency(&self) -> Duration {
        self.ping.latency()
    }

    /// True when the final destination itself answered.
    pub fn reached_destination(&self) -> bool {
        self.ping.status() == EchoStatus::Success
    }
}

/// Path MTU result; the buffer size reported is the discovered MTU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtuStatus {
    pub ping: PingStatus,
    pub mtu: usize,
}

impl MtuStatus {
    pub fn buffer_size(&self) -> usize {
        self.mtu
    }

    pub fn status(&self) -> EchoStatus {
        self.ping.status()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
