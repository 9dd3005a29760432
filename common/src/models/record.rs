use crate::error::ProbeError;

use super::status::{MtuStatus, PingReply, PingStatus, TraceHopStatus};

/// Quiet-mode scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryValue {
    /// Ping: every attempt succeeded. Traceroute: destination reached.
    /// TCP: connection established.
    Reachable(bool),
    /// Discovered path MTU, `None` when the search failed.
    Mtu(Option<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuietSummary {
    pub target: String,
    pub value: SummaryValue,
}

/// Non-fatal error tagged with the target (and attempt) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub target: String,
    /// Traceroute hop the failed attempt belonged to.
    pub hop: Option<u8>,
    pub attempt: Option<u32>,
    pub error: ProbeError,
}

/// Everything a run can emit, in probe-issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeRecord {
    Ping(PingStatus),
    Reply(PingReply),
    Hop(TraceHopStatus),
    Mtu(MtuStatus),
    Summary(QuietSummary),
    Diagnostic(Diagnostic),
}
