//! # Path MTU Discovery
//!
//! Binary search over the echo payload size with the don't-fragment flag set.
//! A `PacketTooBig` answer lowers the upper bound, a `Success` raises the
//! lower bound, anything else is retried at the same size. The search ends
//! once the bounds are adjacent; the lower bound is the path MTU.

use std::time::Duration;

use pathprobe_common::error::ProbeError;
use pathprobe_common::models::{EchoStatus, MtuStatus, PingStatus, ProbeRecord, SummaryValue};
use pathprobe_common::network::payload;
use pathprobe_common::network::target::AddressFamily;
use tracing::debug;

use crate::context::ProbeContext;
use crate::echo::EchoProbe;

/// Smallest size the search may ever settle on for IPv4.
pub const IPV4_FLOOR: usize = 68;
/// IPv6 forbids links with an MTU below 1280.
pub const IPV6_FLOOR: usize = 1280;
pub const SEARCH_CEILING: usize = 10_000;
/// First size probed: a 1500-byte Ethernet frame less the IPv4 and ICMP headers, plus one.
pub const SEARCH_START: usize = 1473;
/// Pause before retrying an inconclusive size.
pub const MTU_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Search state. `low` only grows, `high` only shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtuSearch {
    low: usize,
    high: usize,
    current: usize,
}

impl MtuSearch {
    pub fn new(family: AddressFamily) -> Self {
        let low: usize = match family {
            AddressFamily::V4 => IPV4_FLOOR,
            AddressFamily::V6 => IPV6_FLOOR,
        };
        Self {
            low,
            high: SEARCH_CEILING,
            current: SEARCH_START,
        }
    }

    pub fn low(&self) -> usize {
        self.low
    }

    pub fn high(&self) -> usize {
        self.high
    }

    /// Size to probe next.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_done(&self) -> bool {
        self.high - self.low <= 1
    }

    /// Feeds one probe outcome into the search.
    ///
    /// Returns false when the status was inconclusive and the same size
    /// must be probed again.
    pub fn record(&mut self, status: EchoStatus) -> bool {
        match status {
            EchoStatus::PacketTooBig => self.high = self.current,
            EchoStatus::Success => self.low = self.current,
            _ => return false,
        }
        self.current = (self.low + self.high) / 2;
        true
    }
}

/// Runs the search against the context's target.
pub async fn discover(echo: &mut EchoProbe, ctx: &ProbeContext<'_>) -> Result<MtuStatus, ProbeError> {
    let options = ctx.options;
    let mut search: MtuSearch = MtuSearch::new(ctx.target.family());
    let mut best: Option<PingStatus> = None;
    let mut last_status: EchoStatus = EchoStatus::TimedOut;
    let mut retry: u32 = 1;
    let mut attempt: u32 = 0;

    while !search.is_done() {
        attempt += 1;
        let size: usize = search.current();
        let request = ctx.request(payload::for_size(size), options.hop_limit, true);

        let status: EchoStatus = match echo.send(request).await {
            Ok(reply) => {
                let status: EchoStatus = reply.status;
                if status == EchoStatus::Success {
                    best = Some(ctx.ping_status(attempt, reply));
                }
                status
            }
            Err(ProbeError::Cancelled) => return Err(ProbeError::Cancelled),
            Err(error) => {
                debug!(%error, size, "mtu probe attempt failed");
                EchoStatus::OtherFailure
            }
        };
        last_status = status;
        debug!(size, %status, low = search.low(), high = search.high(), "mtu probe");

        if search.record(status) {
            retry = 1;
            continue;
        }

        if retry >= options.count {
            return Err(no_result(ctx, last_status));
        }
        retry += 1;
        echo.pause(MTU_RETRY_BACKOFF).await?;
    }

    match best {
        Some(ping) => Ok(MtuStatus {
            ping,
            mtu: search.low(),
        }),
        None => Err(no_result(ctx, last_status)),
    }
}

/// Runs [`discover`] and emits its outcome.
pub async fn run(echo: &mut EchoProbe, ctx: &ProbeContext<'_>) -> Result<(), ProbeError> {
    match discover(echo, ctx).await {
        Ok(status) if ctx.options.quiet => ctx.summarize(SummaryValue::Mtu(Some(status.mtu))),
        Ok(status) => ctx.emit(ProbeRecord::Mtu(status)),
        Err(ProbeError::Cancelled) => return Err(ProbeError::Cancelled),
        Err(_) if ctx.options.quiet => ctx.summarize(SummaryValue::Mtu(None)),
        Err(error) => ctx.report(None, None, error),
    }
    Ok(())
}

fn no_result(ctx: &ProbeContext<'_>, status: EchoStatus) -> ProbeError {
    ProbeError::NoPingResult {
        target: ctx.target.input.clone(),
        status,
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
