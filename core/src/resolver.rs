//! # Address Resolution
//!
//! Turns a user-supplied target into the single address every probe of the
//! invocation uses. Name lookups go through the [`NameService`] port so the
//! engines never depend on a particular DNS library.

use std::net::IpAddr;

use anyhow::Context;
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use hickory_resolver::system_conf;
use hickory_resolver::proto::rr::RecordType;
use pathprobe_common::error::ProbeError;
use pathprobe_common::network::target::{AddressFamily, ResolvedTarget};
use tracing::{debug, warn};

/// Forward lookup answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub canonical_name: String,
    /// Candidates in resolver order.
    pub addresses: Vec<IpAddr>,
}

#[async_trait]
pub trait NameService: Send + Sync {
    async fn lookup_host(&self, name: &str) -> anyhow::Result<HostEntry>;
    async fn reverse_lookup(&self, address: IpAddr) -> anyhow::Result<String>;
}

/// [`NameService`] backed by the system resolver configuration.
pub struct SystemNameService {
    resolver: TokioAsyncResolver,
}

impl SystemNameService {
    pub fn new() -> anyhow::Result<Self> {
        let (config, opts): (ResolverConfig, ResolverOpts) = match system_conf::read_system_conf() {
            Ok(system) => system,
            Err(e) => {
                warn!("Could not read system resolver configuration ({e}), using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        let resolver: TokioAsyncResolver = TokioAsyncResolver::tokio(config, dual_stack(opts));
        Ok(Self { resolver })
    }
}

/// Asks for A and AAAA records together so both families reach [`select_address`].
fn dual_stack(mut opts: ResolverOpts) -> ResolverOpts {
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    opts
}

#[async_trait]
impl NameService for SystemNameService {
    async fn lookup_host(&self, name: &str) -> anyhow::Result<HostEntry> {
        let lookup = self
            .resolver
            .lookup_ip(name)
            .await
            .with_context(|| format!("lookup of '{name}' failed"))?;

        let addresses: Vec<IpAddr> = lookup.iter().collect();

        // The owner of the first address record is the end of any CNAME chain.
        let canonical_name: String = lookup
            .as_lookup()
            .record_iter()
            .find(|record| matches!(record.record_type(), RecordType::A | RecordType::AAAA))
            .map(|record| trim_root(&record.name().to_string()))
            .unwrap_or_else(|| name.to_string());

        Ok(HostEntry {
            canonical_name,
            addresses,
        })
    }

    async fn reverse_lookup(&self, address: IpAddr) -> anyhow::Result<String> {
        let lookup = self
            .resolver
            .reverse_lookup(address)
            .await
            .with_context(|| format!("reverse lookup of {address} failed"))?;

        lookup
            .iter()
            .next()
            .map(|name| trim_root(&name.to_string()))
            .with_context(|| format!("no PTR record for {address}"))
    }
}

fn trim_root(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// Resolves `target` to a display name and one address.
///
/// * A literal address is used as is; with `reverse_resolve` its display
///   name comes from a reverse lookup.
/// * A host name is forward-resolved. With `reverse_resolve` the canonical
///   name becomes the display name and is resolved a second time; the
///   address is then picked from that second answer.
/// * With `family` set, the first candidate of that family wins. Otherwise
///   the first candidate in resolver order wins.
pub async fn resolve(
    names: &dyn NameService,
    target: &str,
    family: Option<AddressFamily>,
    reverse_resolve: bool,
) -> Result<ResolvedTarget, ProbeError> {
    if let Ok(address) = target.parse::<IpAddr>() {
        if family.is_some_and(|family| !family.matches(&address)) {
            return Err(unresolvable(target, family));
        }
        let display_name: String = if reverse_resolve {
            names
                .reverse_lookup(address)
                .await
                .map_err(|e| resolution_error(target, e))?
        } else {
            target.to_string()
        };
        return Ok(ResolvedTarget::new(target, display_name, address));
    }

    let mut entry: HostEntry = names
        .lookup_host(target)
        .await
        .map_err(|e| resolution_error(target, e))?;

    let mut display_name: String = target.to_string();
    if reverse_resolve {
        display_name = entry.canonical_name.clone();
        entry = names
            .lookup_host(&display_name)
            .await
            .map_err(|e| resolution_error(target, e))?;
    }

    let address: IpAddr =
        select_address(&entry.addresses, family).ok_or_else(|| unresolvable(target, family))?;
    debug!(%target, %address, %display_name, "target resolved");

    Ok(ResolvedTarget::new(target, display_name, address))
}

/// First candidate of the requested family, or the first candidate at all.
pub fn select_address(candidates: &[IpAddr], family: Option<AddressFamily>) -> Option<IpAddr> {
    candidates
        .iter()
        .copied()
        .find(|address| family.is_none_or(|family| family.matches(address)))
}

fn resolution_error(target: &str, error: anyhow::Error) -> ProbeError {
    ProbeError::Resolution {
        target: target.to_string(),
        message: format!("{error:#}"),
    }
}

fn unresolvable(target: &str, family: Option<AddressFamily>) -> ProbeError {
    ProbeError::UnresolvableAddress {
        target: target.to_string(),
        family,
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
