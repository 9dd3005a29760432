//! # Echo Probe
//!
//! Sends one echo request at a time through an [`EchoTransport`] and turns
//! the reply into an [`EchoResult`].
//!
//! The transport is the host's "send one echo, get one reply or time out"
//! primitive. [`EchoProbe`] adds what every probe mode needs on top of it:
//! cancellation at each wait, a settling pause between sequential sends on
//! the same sender, and the measured-latency fallback.

use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pathprobe_common::error::ProbeError;
use pathprobe_common::models::{EchoResult, EchoStatus};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Minimum gap between one completed send and the next on the same sender.
/// Reusing the sender sooner can fail with an invalid-state error.
pub const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Extra time granted to a transport past the request timeout before the
/// attempt is declared timed out on its behalf.
const TRANSPORT_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct EchoRequest {
    pub address: IpAddr,
    pub payload: Arc<[u8]>,
    pub ttl: u8,
    pub dont_fragment: bool,
    pub timeout: Duration,
}

/// Raw reply as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub status: EchoStatus,
    pub address: Option<IpAddr>,
    pub round_trip: Option<Duration>,
}

impl EchoReply {
    pub fn new(status: EchoStatus, address: Option<IpAddr>, round_trip: Option<Duration>) -> Self {
        Self {
            status,
            address,
            round_trip,
        }
    }

    pub fn timed_out() -> Self {
        Self::new(EchoStatus::TimedOut, None, None)
    }
}

/// Host primitive able to send one echo request and report its outcome.
///
/// Implementations report timeouts as a [`EchoStatus::TimedOut`] reply and
/// reserve `Err` for transport failures.
#[async_trait]
pub trait EchoTransport: Send + Sync {
    async fn echo(&self, request: EchoRequest) -> io::Result<EchoReply>;
}

/// Serial, cancellable front for one [`EchoTransport`].
pub struct EchoProbe {
    transport: Box<dyn EchoTransport>,
    cancel: CancellationToken,
    last_completed: Option<Instant>,
}

impl EchoProbe {
    pub fn new(transport: Box<dyn EchoTransport>, cancel: CancellationToken) -> Self {
        Self {
            transport,
            cancel,
            last_completed: None,
        }
    }

    /// Sends one echo request and waits for its completion.
    ///
    /// Returns [`ProbeError::Cancelled`] if the run is cancelled while waiting
    /// and [`ProbeError::Failure`] if the transport itself fails.
    pub async fn send(&mut self, request: EchoRequest) -> Result<EchoResult, ProbeError> {
        self.settle().await?;

        let buffer_size: usize = request.payload.len();
        let deadline: Duration = request.timeout + TRANSPORT_GRACE;
        debug!(
            address = %request.address,
            ttl = request.ttl,
            size = buffer_size,
            df = request.dont_fragment,
            "sending echo request"
        );

        let started: Instant = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ProbeError::Cancelled),
            outcome = tokio::time::timeout(deadline, self.transport.echo(request)) => outcome,
        };
        let measured: Duration = started.elapsed();
        self.last_completed = Some(Instant::now());

        let reply: EchoReply = match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(error)) => return Err(ProbeError::Failure(error.to_string())),
            Err(_elapsed) => EchoReply::timed_out(),
        };
        debug!(status = %reply.status, "echo completed");

        Ok(EchoResult::from_reply(
            reply.status,
            reply.address,
            reply.round_trip,
            measured,
            buffer_size,
        ))
    }

    /// Sleeps for `duration` unless the run is cancelled first.
    pub async fn pause(&self, duration: Duration) -> Result<(), ProbeError> {
        if self.cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProbeError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    async fn settle(&self) -> Result<(), ProbeError> {
        let wait: Duration = match self.last_completed {
            Some(completed) => SETTLE_DELAY.saturating_sub(completed.elapsed()),
            None => Duration::ZERO,
        };
        self.pause(wait).await
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
