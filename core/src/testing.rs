//! Scripted doubles for the transport and name-service ports.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use pathprobe_common::models::ProbeRecord;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

use crate::echo::{EchoProbe, EchoReply, EchoRequest, EchoTransport};
use crate::resolver::{HostEntry, NameService};

type Responder = Box<dyn Fn(&EchoRequest) -> io::Result<EchoReply> + Send + Sync>;

pub(crate) struct ScriptedTransport {
    responder: Responder,
    requests: Arc<Mutex<Vec<EchoRequest>>>,
    sent_at: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&EchoRequest) -> io::Result<EchoReply> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
            sent_at: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn always(reply: EchoReply) -> Self {
        Self::new(move |_| Ok(reply))
    }

    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<EchoRequest>>> {
        self.requests.clone()
    }

    pub(crate) fn sent_at(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.sent_at.clone()
    }
}

#[async_trait]
impl EchoTransport for ScriptedTransport {
    async fn echo(&self, request: EchoRequest) -> io::Result<EchoReply> {
        self.sent_at.lock().unwrap().push(Instant::now());
        let reply = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        reply
    }
}

pub(crate) fn probe(transport: ScriptedTransport, cancel: CancellationToken) -> EchoProbe {
    EchoProbe::new(Box::new(transport), cancel)
}

/// Name service answering from fixed tables and logging every query.
#[derive(Default)]
pub(crate) struct StaticNames {
    pub(crate) forward: HashMap<String, HostEntry>,
    pub(crate) reverse: HashMap<IpAddr, String>,
    pub(crate) queries: Arc<Mutex<Vec<String>>>,
}

impl StaticNames {
    pub(crate) fn with_host(mut self, name: &str, canonical: &str, addresses: &[IpAddr]) -> Self {
        self.forward.insert(
            name.to_string(),
            HostEntry {
                canonical_name: canonical.to_string(),
                addresses: addresses.to_vec(),
            },
        );
        self
    }

    pub(crate) fn with_ptr(mut self, address: IpAddr, name: &str) -> Self {
        self.reverse.insert(address, name.to_string());
        self
    }
}

#[async_trait]
impl NameService for StaticNames {
    async fn lookup_host(&self, name: &str) -> anyhow::Result<HostEntry> {
        self.queries.lock().unwrap().push(name.to_string());
        self.forward
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such host is known"))
    }

    async fn reverse_lookup(&self, address: IpAddr) -> anyhow::Result<String> {
        self.queries.lock().unwrap().push(address.to_string());
        self.reverse
            .get(&address)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no PTR record for {address}"))
    }
}

pub(crate) fn drain(rx: &mut UnboundedReceiver<ProbeRecord>) -> Vec<ProbeRecord> {
    let mut records: Vec<ProbeRecord> = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records
}
