use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Outcome class of a single echo attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EchoStatus {
    Success,
    TimedOut,
    /// An intermediate router dropped the packet because its TTL reached zero.
    TtlExpired,
    /// The packet needed fragmenting but carried the don't-fragment flag.
    PacketTooBig,
    OtherFailure,
}

impl EchoStatus {
    /// Statuses that carry a meaningful responder address.
    pub fn has_responder(&self) -> bool {
        matches!(self, EchoStatus::Success | EchoStatus::TtlExpired)
    }
}

impl fmt::Display for EchoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &str = match self {
            EchoStatus::Success => "Success",
            EchoStatus::TimedOut => "TimedOut",
            EchoStatus::TtlExpired => "TtlExpired",
            EchoStatus::PacketTooBig => "PacketTooBig",
            EchoStatus::OtherFailure => "OtherFailure",
        };
        f.write_str(label)
    }
}

/// What one echo attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoResult {
    pub status: EchoStatus,
    pub round_trip: Duration,
    /// Present only for `Success` and `TtlExpired`.
    pub address: Option<IpAddr>,
    /// Payload bytes actually sent.
    pub buffer_size: usize,
}

impl EchoResult {
    /// Builds a result from a transport reply.
    ///
    /// `measured` is the caller's wall-clock delta for the attempt and stands
    /// in whenever the reply carries no round-trip time of its own.
    pub fn from_reply(
        status: EchoStatus,
        address: Option<IpAddr>,
        round_trip: Option<Duration>,
        measured: Duration,
        buffer_size: usize,
    ) -> Self {
        Self {
            status,
            round_trip: round_trip.unwrap_or(measured),
            address: address.filter(|_| status.has_responder()),
            buffer_size,
        }
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
