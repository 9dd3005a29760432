//! Scripted stand-ins for the echo transport and the resolver.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pathprobe_common::config::RunConfig;
use pathprobe_common::error::ProbeError;
use pathprobe_common::models::ProbeRecord;
use pathprobe_core::diagnostics::DiagnosticService;
use pathprobe_core::echo::{EchoReply, EchoRequest, EchoTransport};
use pathprobe_core::resolver::{HostEntry, NameService};
use pathprobe_core::sink::RecordSink;
use tokio_util::sync::CancellationToken;

type Script = Box<dyn Fn(&EchoRequest) -> io::Result<EchoReply> + Send + Sync>;

/// Transport answering every request through a closure and keeping a log.
pub struct ScriptedPath {
    script: Script,
    log: Arc<Mutex<Vec<EchoRequest>>>,
}

impl ScriptedPath {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&EchoRequest) -> io::Result<EchoReply> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn log(&self) -> Arc<Mutex<Vec<EchoRequest>>> {
        self.log.clone()
    }
}

#[async_trait]
impl EchoTransport for ScriptedPath {
    async fn echo(&self, request: EchoRequest) -> io::Result<EchoReply> {
        let reply = (self.script)(&request);
        self.log.lock().unwrap().push(request);
        reply
    }
}

/// Resolver backed by in-memory zone data.
#[derive(Default)]
pub struct Zone {
    hosts: HashMap<String, HostEntry>,
    pointers: HashMap<IpAddr, String>,
}

impl Zone {
    pub fn host(mut self, name: &str, canonical: &str, addresses: &[IpAddr]) -> Self {
        self.hosts.insert(
            name.to_string(),
            HostEntry {
                canonical_name: canonical.to_string(),
                addresses: addresses.to_vec(),
            },
        );
        self
    }

    pub fn pointer(mut self, address: IpAddr, name: &str) -> Self {
        self.pointers.insert(address, name.to_string());
        self
    }
}

#[async_trait]
impl NameService for Zone {
    async fn lookup_host(&self, name: &str) -> anyhow::Result<HostEntry> {
        self.hosts
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such host is known"))
    }

    async fn reverse_lookup(&self, address: IpAddr) -> anyhow::Result<String> {
        self.pointers
            .get(&address)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no PTR record for {address}"))
    }
}

/// Runs `run` to completion and returns everything it emitted.
pub async fn perform(
    zone: Zone,
    path: ScriptedPath,
    cancel: CancellationToken,
    run: &RunConfig,
) -> (Result<(), ProbeError>, Vec<ProbeRecord>) {
    let mut service = DiagnosticService::new(Box::new(zone), Box::new(path), cancel);
    let (sink, mut rx) = RecordSink::channel();

    let outcome = service.perform(run, &sink).await;
    drop(sink);

    let mut records: Vec<ProbeRecord> = Vec::new();
    while let Some(record) = rx.recv().await {
        records.push(record);
    }
    (outcome, records)
}
