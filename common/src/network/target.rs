//! # Probe Target Model
//!
//! A target starts life as whatever the user typed (a hostname or a literal
//! address) and becomes a [`ResolvedTarget`] once the resolver has picked the
//! single address every probe of the invocation will use.

use std::fmt;
use std::net::IpAddr;

/// IP family a caller may force during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    pub fn matches(&self, addr: &IpAddr) -> bool {
        Self::of(addr) == *self
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// A target after resolution. The address never changes for the rest of the
/// invocation, retries included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The string the user supplied.
    pub input: String,
    /// Name shown in records: the literal, the reverse-resolved name or the
    /// canonical name, depending on resolution options.
    pub display_name: String,
    pub address: IpAddr,
}

impl ResolvedTarget {
    pub fn new(input: impl Into<String>, display_name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            input: input.into(),
            display_name: display_name.into(),
            address,
        }
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.address)
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
