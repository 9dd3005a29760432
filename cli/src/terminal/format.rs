use std::net::IpAddr;
use std::time::Duration;

use colored::*;
use pathprobe_common::models::{
    Diagnostic, EchoResult, EchoStatus, MtuStatus, PingReply, PingStatus, ProbeRecord, QuietSummary,
    SummaryValue, TraceHopStatus,
};
use tracing::warn;

use crate::terminal::{colors, print};

pub fn print_record(record: &ProbeRecord) {
    match record {
        ProbeRecord::Ping(status) => print::print_status(ping_line(status)),
        ProbeRecord::Reply(reply) => print::print_status(reply_line(reply)),
        ProbeRecord::Hop(hop) => print::print(&hop_line(hop)),
        ProbeRecord::Mtu(status) => print::print_status(mtu_line(status)),
        ProbeRecord::Summary(summary) => print::print(&summary_line(summary)),
        ProbeRecord::Diagnostic(diagnostic) => warn!("{}", diagnostic_line(diagnostic)),
    }
}

pub fn address(ip: &IpAddr) -> ColoredString {
    match ip {
        IpAddr::V4(_) => ip.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(_) => ip.to_string().color(colors::IPV6_ADDR),
    }
}

fn status(status: EchoStatus) -> ColoredString {
    let label: String = status.to_string();
    match status {
        EchoStatus::Success => label.color(colors::SUCCESS),
        _ => label.color(colors::FAILURE),
    }
}

fn latency(round_trip: Duration) -> ColoredString {
    format!("{}ms", round_trip.as_millis()).color(colors::LATENCY)
}

fn echo_line(from: &IpAddr, sequence: u32, reply: &EchoResult) -> String {
    match reply.status {
        EchoStatus::Success => format!(
            "Reply from {}: bytes={} time={} seq={}",
            address(from),
            reply.buffer_size,
            latency(reply.round_trip),
            sequence
        ),
        other => format!("Request to {} seq={}: {}", address(from), sequence, status(other)),
    }
}

pub fn ping_line(ping: &PingStatus) -> String {
    echo_line(&ping.address(), ping.sequence, &ping.reply)
}

pub fn reply_line(reply: &PingReply) -> String {
    match reply.reply.address {
        Some(from) => echo_line(&from, reply.sequence, &reply.reply),
        None => format!(
            "Request to {} seq={}: {}",
            reply.destination.color(colors::PRIMARY),
            reply.sequence,
            status(reply.reply.status)
        ),
    }
}

pub fn hop_line(hop: &TraceHopStatus) -> String {
    let responder: String = match (&hop.hop_address, &hop.hop_name) {
        (Some(ip), Some(name)) => format!("{} [{}]", name.color(colors::PRIMARY), address(ip)),
        (Some(ip), None) => address(ip).to_string(),
        (None, _) => "*".color(colors::SEPARATOR).to_string(),
    };
    let time: ColoredString = match hop.ping.status() {
        EchoStatus::TimedOut => "*".color(colors::SEPARATOR),
        _ => latency(hop.latency()),
    };

    format!(
        "{}{} {}  {}  {}",
        format!("{:>3}", hop.hop).color(colors::ACCENT),
        ".".color(colors::SEPARATOR),
        responder,
        time,
        status(hop.status())
    )
}

pub fn mtu_line(mtu: &MtuStatus) -> String {
    format!(
        "Path MTU to {} [{}]: {} bytes",
        mtu.ping.destination.color(colors::PRIMARY),
        address(&mtu.ping.destination_address),
        mtu.mtu.to_string().bold()
    )
}

/// Quiet output is the bare scalar so it can be consumed by scripts.
pub fn summary_line(summary: &QuietSummary) -> String {
    match summary.value {
        SummaryValue::Reachable(reachable) => reachable.to_string(),
        SummaryValue::Mtu(Some(mtu)) => mtu.to_string(),
        SummaryValue::Mtu(None) => "-1".to_string(),
    }
}

pub fn diagnostic_line(diagnostic: &Diagnostic) -> String {
    let place: String = match (diagnostic.hop, diagnostic.attempt) {
        (Some(hop), Some(attempt)) => format!(" (hop {hop}, attempt {attempt})"),
        (None, Some(attempt)) => format!(" (attempt {attempt})"),
        (Some(hop), None) => format!(" (hop {hop})"),
        (None, None) => String::new(),
    };
    format!("{}{}: {}", diagnostic.target, place, diagnostic.error)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
