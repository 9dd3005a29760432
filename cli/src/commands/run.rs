use std::time::Instant;

use anyhow::Context;
use pathprobe_common::config::{ProbeMode, RunConfig};
use pathprobe_common::error::ProbeError;
use pathprobe_common::models::ProbeRecord;
use pathprobe_core::diagnostics::DiagnosticService;
use pathprobe_core::network::icmp::IcmpSender;
use pathprobe_core::resolver::SystemNameService;
use pathprobe_core::sink::RecordSink;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, warn};

use crate::commands::Commands;
use crate::terminal::{format, print, spinner};

pub async fn run(command: Commands) -> anyhow::Result<()> {
    let run: RunConfig = command.into_run_config()?;
    let quiet: bool = run.options.quiet && !run.options.repeat;

    print::header(title(&run.mode), quiet);
    if !is_root::is_root() {
        if let Some(message) = privilege_warning(&run.mode) {
            warn!("{message}");
        }
    }

    let cancel: CancellationToken = CancellationToken::new();
    watch_ctrl_c(cancel.clone());

    let names = SystemNameService::new().context("failed to set up the DNS resolver")?;
    let mut service = DiagnosticService::new(Box::new(names), Box::new(IcmpSender::new()), cancel);
    let (sink, records) = RecordSink::channel();
    let printer = tokio::spawn(print_records(records));

    let start_time: Instant = Instant::now();
    let outcome: Result<(), ProbeError> = service
        .perform(&run, &sink)
        .instrument(progress_span(&run.mode, quiet))
        .await;

    drop(service);
    drop(sink);
    printer.await.context("record printer stopped unexpectedly")?;

    match outcome {
        Ok(()) => {
            print::end_of_program(run.targets.len(), start_time.elapsed(), quiet);
            Ok(())
        }
        Err(ProbeError::Cancelled) => {
            warn!("Cancelled by user");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

async fn print_records(mut records: UnboundedReceiver<ProbeRecord>) {
    while let Some(record) = records.recv().await {
        format::print_record(&record);
    }
}

fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("ctrl-c received, cancelling");
            cancel.cancel();
        }
    });
}

fn title(mode: &ProbeMode) -> &'static str {
    match mode {
        ProbeMode::Ping | ProbeMode::PingRepeat => "pinging targets",
        ProbeMode::Traceroute => "tracing route",
        ProbeMode::MtuDiscover => "discovering path mtu",
        ProbeMode::TcpProbe { .. } => "probing tcp port",
    }
}

/// Unprivileged datagram ICMP sockets never see time-exceeded or
/// fragmentation-needed errors from routers.
fn privilege_warning(mode: &ProbeMode) -> Option<&'static str> {
    match mode {
        ProbeMode::TcpProbe { .. } => None,
        ProbeMode::Ping | ProbeMode::PingRepeat => {
            Some("Not running as root, unprivileged ICMP sockets will be used if the system allows them")
        }
        ProbeMode::Traceroute => Some(
            "Not running as root, intermediate hops cannot be seen over unprivileged ICMP sockets and will show as timed out",
        ),
        ProbeMode::MtuDiscover => Some(
            "Not running as root, only the local link MTU can be detected over unprivileged ICMP sockets",
        ),
    }
}

// The long-running searches get a spinner, ping output already streams.
fn progress_span(mode: &ProbeMode, quiet: bool) -> Span {
    match mode {
        ProbeMode::Traceroute if quiet => spinner::progress_span("Tracing route..."),
        ProbeMode::MtuDiscover => spinner::progress_span("Searching for the largest unfragmented payload..."),
        _ => Span::none(),
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
