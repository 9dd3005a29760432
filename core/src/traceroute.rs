//! # Traceroute
//!
//! Sweeps the TTL upward from 1, sending [`DEFAULT_HOP_PING_COUNT`] echoes
//! per hop. Routers along the way answer with TTL-expired; the sweep stops
//! when a hop answers with anything other than TTL-expired or a timeout, or
//! when the hop limit is exhausted.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use pathprobe_common::error::ProbeError;
use pathprobe_common::models::{EchoStatus, ProbeRecord, SummaryValue, TraceHopStatus};
use pathprobe_common::network::payload;
use tracing::debug;

use crate::context::ProbeContext;
use crate::echo::EchoProbe;
use crate::resolver::NameService;

pub const DEFAULT_HOP_PING_COUNT: u32 = 3;
/// Throttle between the echoes sent to one hop.
pub const TRACE_ECHO_DELAY: Duration = Duration::from_millis(50);

/// Responder of a hop, fixed by the first attempt that got an answer.
struct HopResponder {
    address: IpAddr,
    name: Option<String>,
}

pub async fn run(
    echo: &mut EchoProbe,
    names: &dyn NameService,
    ctx: &ProbeContext<'_>,
) -> Result<(), ProbeError> {
    let options = ctx.options;
    let payload: Arc<[u8]> = payload::for_size(options.buffer_size);
    let mut last_status: Option<EchoStatus> = None;
    let mut reached: bool = false;

    let mut hop: u8 = 1;
    while hop <= options.hop_limit {
        let mut responder: Option<HopResponder> = None;

        for attempt in 1..=DEFAULT_HOP_PING_COUNT {
            let request = ctx.request(payload.clone(), hop, options.dont_fragment);
            match echo.send(request).await {
                Ok(reply) => {
                    last_status = Some(reply.status);
                    if responder.is_none() {
                        if let Some(address) = reply.address {
                            let name = hop_name(names, address, options.reverse_resolve).await;
                            responder = Some(HopResponder { address, name });
                        }
                    }
                    if !options.quiet {
                        ctx.emit(ProbeRecord::Hop(TraceHopStatus {
                            hop,
                            ping: ctx.ping_status(attempt, reply),
                            hop_address: responder.as_ref().map(|r| r.address),
                            hop_name: responder.as_ref().and_then(|r| r.name.clone()),
                            target: ctx.target.display_name.clone(),
                            target_address: ctx.target.address,
                        }));
                    }
                }
                Err(ProbeError::Cancelled) => return Err(ProbeError::Cancelled),
                Err(error) => {
                    if !options.quiet {
                        ctx.report(Some(hop), Some(attempt), error);
                    }
                }
            }

            if attempt < DEFAULT_HOP_PING_COUNT {
                echo.pause(TRACE_ECHO_DELAY).await?;
            }
        }

        debug!(hop, status = ?last_status, "hop complete");
        match last_status {
            None | Some(EchoStatus::TtlExpired) | Some(EchoStatus::TimedOut) => {}
            Some(status) => {
                reached = status == EchoStatus::Success;
                break;
            }
        }
        hop += 1;
    }

    if options.quiet {
        ctx.summarize(SummaryValue::Reachable(reached));
    }
    Ok(())
}

async fn hop_name(names: &dyn NameService, address: IpAddr, reverse_resolve: bool) -> Option<String> {
    if !reverse_resolve {
        return None;
    }
    match names.reverse_lookup(address).await {
        Ok(name) => Some(name),
        Err(error) => {
            debug!(%address, "hop name lookup failed: {error:#}");
            None
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
