//! Host ICMP echo transport.
//!
//! One socket per address family is opened on first use and then reused for
//! every request of the run. Sends block, so each one runs on the blocking
//! pool and hands its outcome back over a oneshot channel.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pathprobe_common::network::target::AddressFamily;
use tokio::sync::oneshot;
use tracing::debug;

use super::socket::IcmpSocket;
use crate::echo::{EchoReply, EchoRequest, EchoTransport};

type SharedSocket = Arc<Mutex<IcmpSocket>>;

pub struct IcmpSender {
    identifier: u16,
    sequence: AtomicU16,
    sockets: Mutex<HashMap<AddressFamily, SharedSocket>>,
}

impl IcmpSender {
    pub fn new() -> Self {
        Self {
            identifier: rand::random::<u16>(),
            sequence: AtomicU16::new(0),
            sockets: Mutex::new(HashMap::new()),
        }
    }

    fn socket_for(&self, family: AddressFamily) -> io::Result<SharedSocket> {
        let mut sockets = self
            .sockets
            .lock()
            .map_err(|_| io::Error::other("ICMP socket table poisoned"))?;

        if let Some(socket) = sockets.get(&family) {
            return Ok(socket.clone());
        }
        let socket: SharedSocket = Arc::new(Mutex::new(IcmpSocket::open(family)?));
        sockets.insert(family, socket.clone());
        Ok(socket)
    }
}

impl Default for IcmpSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EchoTransport for IcmpSender {
    async fn echo(&self, request: EchoRequest) -> io::Result<EchoReply> {
        let family: AddressFamily = AddressFamily::of(&request.address);
        let socket: SharedSocket = self.socket_for(family)?;
        let identifier: u16 = self.identifier;
        let sequence: u16 = self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        debug!(
            address = %request.address,
            ttl = request.ttl,
            size = request.payload.len(),
            sequence,
            "sending echo request"
        );

        let (done_tx, done_rx) = oneshot::channel::<io::Result<EchoReply>>();
        tokio::task::spawn_blocking(move || {
            let outcome: io::Result<EchoReply> = match socket.lock() {
                Ok(mut socket) => socket.round_trip(&request, identifier, sequence),
                Err(_) => Err(io::Error::other("ICMP socket poisoned")),
            };
            let _ = done_tx.send(outcome);
        });

        done_rx
            .await
            .map_err(|_| io::Error::other("echo request was dropped before completing"))?
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
