use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use pathprobe_common::config::{ProbeMode, ProbeOptions, RunConfig};
use pathprobe_common::error::ProbeError;
use pathprobe_common::models::{EchoStatus, ProbeRecord};
use pathprobe_common::network::target::AddressFamily;
use pathprobe_core::echo::EchoReply;
use tokio_util::sync::CancellationToken;

use crate::support::{self, ScriptedPath, Zone};

const FIRST: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1));
const SECOND: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 2));
const SECOND_V6: IpAddr = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2));

fn zone() -> Zone {
    Zone::default()
        .host("first.example", "first.example", &[FIRST])
        .host("second.example", "second.example", &[SECOND, SECOND_V6])
}

fn echo_back() -> ScriptedPath {
    ScriptedPath::new(|request| Ok(EchoReply::new(EchoStatus::Success, Some(request.address), None)))
}

fn ping(targets: &[&str], options: ProbeOptions) -> RunConfig {
    let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
    RunConfig::new(ProbeMode::Ping, targets, options).unwrap()
}

fn quick(count: u32) -> ProbeOptions {
    ProbeOptions {
        count,
        delay: Duration::ZERO,
        ..ProbeOptions::default()
    }
}

#[tokio::test]
async fn resolution_failure_does_not_stop_the_batch() {
    let config = ping(&["first.example", "missing.example", "second.example"], quick(2));

    let (outcome, records) = support::perform(zone(), echo_back(), CancellationToken::new(), &config).await;

    assert!(outcome.is_ok());
    assert_eq!(records.len(), 5);
    let addresses: Vec<IpAddr> = records
        .iter()
        .filter_map(|record| match record {
            ProbeRecord::Ping(status) => Some(status.destination_address),
            _ => None,
        })
        .collect();
    assert_eq!(addresses, vec![FIRST, FIRST, SECOND, SECOND]);

    match &records[2] {
        ProbeRecord::Diagnostic(diagnostic) => {
            assert_eq!(diagnostic.target, "missing.example");
            assert_eq!(diagnostic.attempt, None);
            assert!(matches!(diagnostic.error, ProbeError::Resolution { .. }));
        }
        other => panic!("expected a diagnostic, got {other:?}"),
    }
}

#[tokio::test]
async fn forced_family_is_honoured_per_target() {
    let config = ping(
        &["first.example", "second.example"],
        ProbeOptions {
            family: Some(AddressFamily::V6),
            ..quick(1)
        },
    );
    let path = echo_back();
    let log = path.log();

    let (outcome, records) = support::perform(zone(), path, CancellationToken::new(), &config).await;

    assert!(outcome.is_ok());
    assert!(matches!(
        &records[0],
        ProbeRecord::Diagnostic(d) if matches!(d.error, ProbeError::UnresolvableAddress { .. })
    ));
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].address, SECOND_V6);
}

#[tokio::test]
async fn reverse_resolve_uses_the_canonical_name_address() {
    let zone = Zone::default()
        .host("alias.example", "canonical.example", &[FIRST])
        .host("canonical.example", "canonical.example", &[SECOND]);
    let config = ping(
        &["alias.example"],
        ProbeOptions {
            reverse_resolve: true,
            ..quick(1)
        },
    );

    let (_, records) = support::perform(zone, echo_back(), CancellationToken::new(), &config).await;

    match &records[..] {
        [ProbeRecord::Ping(status)] => {
            assert_eq!(status.destination, "canonical.example");
            assert_eq!(status.destination_address, SECOND);
        }
        other => panic!("expected one ping record, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_attempts_are_reported_and_series_continues() {
    let calls = AtomicU32::new(0);
    let path = ScriptedPath::new(move |request| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(std::io::Error::other("network is unreachable"))
        } else {
            Ok(EchoReply::new(EchoStatus::Success, Some(request.address), None))
        }
    });
    let config = ping(&["first.example"], quick(3));

    let (outcome, records) = support::perform(zone(), path, CancellationToken::new(), &config).await;

    assert!(outcome.is_ok());
    assert_eq!(records.len(), 3);
    assert!(matches!(
        &records[0],
        ProbeRecord::Diagnostic(d) if d.attempt == Some(1) && matches!(d.error, ProbeError::Failure(_))
    ));
    assert!(matches!(&records[2], ProbeRecord::Ping(status) if status.sequence == 3));
}

#[tokio::test]
async fn cancellation_aborts_remaining_targets() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let calls = AtomicU32::new(0);
    let path = ScriptedPath::new(move |request| {
        if calls.fetch_add(1, Ordering::SeqCst) == 1 {
            trigger.cancel();
        }
        Ok(EchoReply::new(EchoStatus::Success, Some(request.address), None))
    });
    let log = path.log();
    let config = ping(&["first.example", "second.example"], quick(10));

    let (outcome, records) = support::perform(zone(), path, cancel, &config).await;

    assert_eq!(outcome, Err(ProbeError::Cancelled));
    assert_eq!(records.len(), 2);
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|request| request.address == FIRST));
}

#[tokio::test]
async fn repeat_ping_runs_until_cancelled() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let calls = AtomicU32::new(0);
    let path = ScriptedPath::new(move |request| {
        if calls.fetch_add(1, Ordering::SeqCst) == 6 {
            trigger.cancel();
        }
        Ok(EchoReply::new(EchoStatus::Success, Some(request.address), None))
    });
    let config = RunConfig::new(ProbeMode::PingRepeat, vec!["first.example".to_string()], quick(1)).unwrap();

    let (outcome, records) = support::perform(zone(), path, cancel, &config).await;

    assert_eq!(outcome, Err(ProbeError::Cancelled));
    assert_eq!(records.len(), 7);
    assert!(records.iter().all(|record| matches!(record, ProbeRecord::Reply(_))));
}
