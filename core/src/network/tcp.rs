use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use pathprobe_common::models::SummaryValue;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::ProbeContext;

pub const TCP_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tries to open a TCP connection to `address:port`.
///
/// The connect is polled once per [`TCP_POLL_INTERVAL`] for up to
/// `timeout_secs` polls. Cancellation, connect errors and the timeout all
/// resolve to `false`; the socket is released on every path.
pub async fn connect(address: IpAddr, port: u16, timeout_secs: u64, cancel: &CancellationToken) -> bool {
    let socket_addr: SocketAddr = SocketAddr::new(address, port);
    let connect = TcpStream::connect(socket_addr);
    tokio::pin!(connect);

    for poll in 1..=timeout_secs {
        if cancel.is_cancelled() {
            debug!(%socket_addr, "tcp probe cancelled");
            return false;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%socket_addr, "tcp probe cancelled");
                return false;
            }
            result = &mut connect => {
                return match result {
                    Ok(_stream) => {
                        debug!(%socket_addr, poll, "tcp connection established");
                        true
                    }
                    Err(error) => {
                        debug!(%socket_addr, %error, "tcp connect failed");
                        false
                    }
                };
            }
            _ = tokio::time::sleep(TCP_POLL_INTERVAL) => {}
        }
    }

    debug!(%socket_addr, timeout_secs, "tcp connect timed out");
    false
}

/// Probes the context's target and emits the boolean outcome.
pub async fn run(ctx: &ProbeContext<'_>, port: u16, cancel: &CancellationToken) {
    let timeout_secs: u64 = ctx.options.timeout.as_secs().max(1);
    let connected: bool = connect(ctx.target.address, port, timeout_secs, cancel).await;
    ctx.summarize(SummaryValue::Reachable(connected));
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Instant;
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port: u16 = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn connects_to_listening_port() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port: u16 = listener.local_addr().unwrap().port();

        assert!(connect(LOCALHOST, port, 5, &CancellationToken::new()).await);
    }

    #[tokio::test]
    async fn refused_connection_fails_within_one_poll() {
        let port: u16 = closed_port().await;
        let started: Instant = Instant::now();

        assert!(!connect(LOCALHOST, port, 5, &CancellationToken::new()).await);
        assert!(started.elapsed() < TCP_POLL_INTERVAL);
    }

    #[tokio::test]
    async fn cancellation_before_first_poll_returns_false_immediately() {
        let cancel: CancellationToken = CancellationToken::new();
        cancel.cancel();
        let started: Instant = Instant::now();

        // TEST-NET-3 is unroutable, so only cancellation can end this early.
        let unroutable: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1));
        assert!(!connect(unroutable, 443, 30, &cancel).await);
        assert!(started.elapsed() < TCP_POLL_INTERVAL);
    }

    #[tokio::test]
    #[ignore]
    async fn unroutable_address_times_out() {
        let unroutable: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1));
        let started: Instant = Instant::now();

        assert!(!connect(unroutable, 443, 2, &CancellationToken::new()).await);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
