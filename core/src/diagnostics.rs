//! # Diagnostic Service
//!
//! Implements the "probe these targets" use case.
//!
//! This service resolves each target in turn and hands it to the engine of
//! the requested mode, streaming every record through a [`RecordSink`].

use pathprobe_common::config::{ProbeMode, RunConfig};
use pathprobe_common::error::ProbeError;
use pathprobe_common::models::{Diagnostic, ProbeRecord};
use pathprobe_common::network::target::ResolvedTarget;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::context::ProbeContext;
use crate::echo::{EchoProbe, EchoTransport};
use crate::network::tcp;
use crate::resolver::{self, NameService};
use crate::sink::RecordSink;
use crate::{mtu, ping, traceroute};

/// Application Service for path diagnostics.
///
/// Orchestrates a run by:
/// 1. resolving each target through the [`NameService`] port.
/// 2. driving the mode's engine over the shared [`EchoProbe`].
pub struct DiagnosticService {
    names: Box<dyn NameService>,
    echo: EchoProbe,
    cancel: CancellationToken,
    source: String,
}

impl DiagnosticService {
    pub fn new(
        names: Box<dyn NameService>,
        transport: Box<dyn EchoTransport>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            names,
            echo: EchoProbe::new(transport, cancel.clone()),
            cancel,
            source: local_host_name(),
        }
    }

    /// Probes every target of `run` in order.
    ///
    /// Resolution failures and failed attempts become [`Diagnostic`] records
    /// and the batch moves on. Only cancellation ends the run early, and in
    /// TCP mode even that ends it quietly with `Ok`.
    pub async fn perform(&mut self, run: &RunConfig, sink: &RecordSink) -> Result<(), ProbeError> {
        let absorb_cancel: bool = matches!(run.mode, ProbeMode::TcpProbe { .. });

        for input in &run.targets {
            let outcome: Result<(), ProbeError> = self.probe_target(run, input, sink).await;
            match outcome {
                Ok(()) => {}
                Err(ProbeError::Cancelled) if absorb_cancel => {
                    info!("TCP probing cancelled, skipping remaining targets");
                    return Ok(());
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => sink.emit(ProbeRecord::Diagnostic(Diagnostic {
                    target: input.clone(),
                    hop: None,
                    attempt: None,
                    error,
                })),
            }
        }
        Ok(())
    }

    async fn probe_target(&mut self, run: &RunConfig, input: &str, sink: &RecordSink) -> Result<(), ProbeError> {
        let options = &run.options;
        let target: ResolvedTarget = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ProbeError::Cancelled),
            resolved = resolver::resolve(self.names.as_ref(), input, options.family, options.reverse_resolve) => resolved?,
        };
        debug!(target = %target.display_name, address = %target.address, mode = ?run.mode, "probing target");

        let ctx = ProbeContext {
            source: &self.source,
            target: &target,
            options,
            sink,
        };

        match run.mode {
            ProbeMode::Ping | ProbeMode::PingRepeat => ping::run(&mut self.echo, &ctx).await,
            ProbeMode::Traceroute => traceroute::run(&mut self.echo, self.names.as_ref(), &ctx).await,
            ProbeMode::MtuDiscover => mtu::run(&mut self.echo, &ctx).await,
            ProbeMode::TcpProbe { port } => {
                tcp::run(&ctx, port, &self.cancel).await;
                if self.cancel.is_cancelled() {
                    return Err(ProbeError::Cancelled);
                }
                Ok(())
            }
        }
    }
}

/// Name of this machine, stamped as the source of every ping record.
pub fn local_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
