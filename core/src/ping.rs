//! # Ping Series
//!
//! Repeats single echoes against one target with a pause between attempts.
//!
//! Output depends on the options:
//! * default: one [`PingStatus`] per attempt, in order;
//! * quiet: a single boolean, true only if every attempt succeeded;
//! * repeat: the raw [`PingReply`] per attempt until the run is cancelled.

use std::sync::Arc;

use pathprobe_common::error::ProbeError;
use pathprobe_common::models::{EchoStatus, PingReply, ProbeRecord, SummaryValue};
use pathprobe_common::network::payload;

use crate::context::ProbeContext;
use crate::echo::EchoProbe;

pub async fn run(echo: &mut EchoProbe, ctx: &ProbeContext<'_>) -> Result<(), ProbeError> {
    let options = ctx.options;
    let payload: Arc<[u8]> = payload::for_size(options.buffer_size);
    let count: u32 = options.effective_count();
    let quiet: bool = options.quiet && !options.repeat;
    let mut all_succeeded: bool = true;

    let mut sequence: u32 = 1;
    loop {
        let request = ctx.request(payload.clone(), options.hop_limit, options.dont_fragment);
        match echo.send(request).await {
            Ok(reply) => {
                all_succeeded &= reply.status == EchoStatus::Success;
                if options.repeat {
                    ctx.emit(ProbeRecord::Reply(PingReply {
                        destination: ctx.target.display_name.clone(),
                        sequence,
                        reply,
                    }));
                } else if !quiet {
                    ctx.emit(ProbeRecord::Ping(ctx.ping_status(sequence, reply)));
                }
            }
            Err(ProbeError::Cancelled) => return Err(ProbeError::Cancelled),
            Err(error) => {
                all_succeeded = false;
                if !quiet {
                    ctx.report(None, Some(sequence), error);
                }
            }
        }

        if sequence >= count {
            break;
        }
        echo.pause(options.delay).await?;
        sequence += 1;
    }

    if quiet {
        ctx.summarize(SummaryValue::Reachable(all_succeeded));
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
