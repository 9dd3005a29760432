use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use pathprobe_common::config::{ProbeMode, ProbeOptions, RunConfig};
use pathprobe_common::models::{EchoStatus, ProbeRecord, QuietSummary, SummaryValue, TraceHopStatus};
use pathprobe_core::echo::EchoReply;
use tokio_util::sync::CancellationToken;

use crate::support::{self, ScriptedPath, Zone};

const DESTINATION: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7));

fn router(hop: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, hop, 1))
}

fn zone() -> Zone {
    Zone::default().host("dest.example", "dest.example", &[DESTINATION])
}

fn options() -> ProbeOptions {
    ProbeOptions {
        delay: Duration::ZERO,
        ..ProbeOptions::default()
    }
}

fn run(mode: ProbeMode, options: ProbeOptions) -> RunConfig {
    RunConfig::new(mode, vec!["dest.example".to_string()], options).unwrap()
}

#[tokio::test]
async fn ping_three_successful_echoes() {
    let path = ScriptedPath::new(|_| {
        Ok(EchoReply::new(EchoStatus::Success, Some(DESTINATION), Some(Duration::from_millis(8))))
    });
    let config = run(ProbeMode::Ping, ProbeOptions { count: 3, ..options() });

    let (outcome, records) = support::perform(zone(), path, CancellationToken::new(), &config).await;

    assert!(outcome.is_ok());
    let pings: Vec<(u32, EchoStatus)> = records
        .iter()
        .map(|record| match record {
            ProbeRecord::Ping(status) => (status.sequence, status.status()),
            other => panic!("unexpected record {other:?}"),
        })
        .collect();
    assert_eq!(
        pings,
        vec![(1, EchoStatus::Success), (2, EchoStatus::Success), (3, EchoStatus::Success)]
    );
}

#[tokio::test]
async fn quiet_ping_folds_one_timeout_into_false() {
    let calls = AtomicU32::new(0);
    let flaky = ScriptedPath::new(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) == 2 {
            Ok(EchoReply::timed_out())
        } else {
            Ok(EchoReply::new(EchoStatus::Success, Some(DESTINATION), None))
        }
    });
    let config = run(ProbeMode::Ping, ProbeOptions { count: 4, quiet: true, ..options() });

    let (_, records) = support::perform(zone(), flaky, CancellationToken::new(), &config).await;

    assert_eq!(
        records,
        vec![ProbeRecord::Summary(QuietSummary {
            target: "dest.example".to_string(),
            value: SummaryValue::Reachable(false),
        })]
    );
}

#[tokio::test]
async fn mtu_discovery_finds_path_boundary() {
    let path = ScriptedPath::new(|request| {
        let status = if request.payload.len() > 1400 {
            EchoStatus::PacketTooBig
        } else {
            EchoStatus::Success
        };
        Ok(EchoReply::new(status, Some(DESTINATION), Some(Duration::from_millis(2))))
    });
    let log = path.log();
    let config = run(ProbeMode::MtuDiscover, options());

    let (outcome, records) = support::perform(zone(), path, CancellationToken::new(), &config).await;

    assert!(outcome.is_ok());
    match &records[..] {
        [ProbeRecord::Mtu(status)] => {
            assert_eq!(status.mtu, 1400);
            assert_eq!(status.ping.status(), EchoStatus::Success);
        }
        other => panic!("expected one MTU record, got {other:?}"),
    }
    let log = log.lock().unwrap();
    assert!(log.iter().all(|request| request.dont_fragment));
    assert!(log.iter().any(|request| request.payload.len() == 1401));
}

#[tokio::test]
async fn traceroute_stops_at_destination_hop() {
    let path = ScriptedPath::new(|request| {
        if request.ttl < 3 {
            Ok(EchoReply::new(EchoStatus::TtlExpired, Some(router(request.ttl)), None))
        } else {
            Ok(EchoReply::new(EchoStatus::Success, Some(DESTINATION), None))
        }
    });
    let config = run(ProbeMode::Traceroute, ProbeOptions { hop_limit: 5, ..options() });

    let (outcome, records) = support::perform(zone(), path, CancellationToken::new(), &config).await;

    assert!(outcome.is_ok());
    let hops: Vec<TraceHopStatus> = records
        .into_iter()
        .map(|record| match record {
            ProbeRecord::Hop(hop) => hop,
            other => panic!("unexpected record {other:?}"),
        })
        .collect();

    assert_eq!(
        hops.iter().map(|hop| hop.hop).collect::<Vec<u8>>(),
        vec![1, 1, 1, 2, 2, 2, 3, 3, 3]
    );
    for hop in &hops[..6] {
        assert_eq!(hop.ping.status(), EchoStatus::TtlExpired);
        assert_eq!(hop.status(), EchoStatus::Success);
        assert_eq!(hop.hop_address, Some(router(hop.hop)));
    }
    let last = hops.last().unwrap();
    assert!(last.reached_destination());
    assert_eq!(last.hop_address, Some(DESTINATION));
}

#[tokio::test]
async fn traceroute_names_hops_when_resolving() {
    let path = ScriptedPath::new(|request| {
        if request.ttl < 2 {
            Ok(EchoReply::new(EchoStatus::TtlExpired, Some(router(request.ttl)), None))
        } else {
            Ok(EchoReply::new(EchoStatus::Success, Some(DESTINATION), None))
        }
    });
    let zone = zone()
        .pointer(router(1), "gw.example")
        .pointer(DESTINATION, "dest.example");
    let config = run(ProbeMode::Traceroute, ProbeOptions { reverse_resolve: true, ..options() });

    let (_, records) = support::perform(zone, path, CancellationToken::new(), &config).await;

    let names: Vec<Option<String>> = records
        .iter()
        .filter_map(|record| match record {
            ProbeRecord::Hop(hop) => Some(hop.hop_name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(names.len(), 6);
    assert!(names[..3].iter().all(|name| name.as_deref() == Some("gw.example")));
    assert!(names[3..].iter().all(|name| name.as_deref() == Some("dest.example")));
}

#[tokio::test]
async fn tcp_probe_reports_refused_port_as_false() {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port: u16 = listener.local_addr().unwrap().port();
    drop(listener);

    let path = ScriptedPath::new(|_| Ok(EchoReply::timed_out()));
    let config = RunConfig::new(ProbeMode::TcpProbe { port }, vec!["127.0.0.1".to_string()], options()).unwrap();

    let (outcome, records) = support::perform(Zone::default(), path, CancellationToken::new(), &config).await;

    assert!(outcome.is_ok());
    assert_eq!(
        records,
        vec![ProbeRecord::Summary(QuietSummary {
            target: "127.0.0.1".to_string(),
            value: SummaryValue::Reachable(false),
        })]
    );
}
