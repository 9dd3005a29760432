//! Error taxonomy shared by every probe mode.
//!
//! Only [`ProbeError::Cancelled`] ends a run. Everything else is attached to
//! the offending target or attempt and the run carries on.

use thiserror::Error;

use crate::models::EchoStatus;
use crate::network::target::AddressFamily;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Name lookup failed; carries the resolver's own message.
    #[error("cannot resolve '{target}': {message}")]
    Resolution { target: String, message: String },

    /// The target resolved, but not to an address of the requested family.
    #[error("no {} address found for '{target}'", family_label(.family))]
    UnresolvableAddress {
        target: String,
        family: Option<AddressFamily>,
    },

    /// Transport-level failure of a single attempt (not a timeout).
    #[error("echo request failed: {0}")]
    Failure(String),

    /// MTU discovery ran out of retries without a conclusive reply.
    #[error("no conclusive reply from '{target}' (last status: {status})")]
    NoPingResult { target: String, status: EchoStatus },

    /// User abort. Unwinds the whole run.
    #[error("operation cancelled")]
    Cancelled,
}

impl ProbeError {
    /// True for errors that end the entire run rather than one target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProbeError::Cancelled)
    }
}

fn family_label(family: &Option<AddressFamily>) -> String {
    family.map_or_else(|| "usable".to_string(), |f| f.to_string())
}

/// Rejected probe configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("hop limit {0} is out of range (0..=128)")]
    HopLimit(u8),
    #[error("buffer size {0} is out of range (0..=65500)")]
    BufferSize(usize),
    #[error("timeout must be greater than zero seconds")]
    ZeroTimeout,
    #[error("count must be a positive integer")]
    ZeroCount,
    #[error("at least one target is required")]
    NoTargets,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
