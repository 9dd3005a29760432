use std::time::Duration;

use crate::error::ConfigError;
use crate::network::payload::{DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
use crate::network::target::AddressFamily;

pub const MAX_HOP_LIMIT: u8 = 128;
pub const DEFAULT_COUNT: u32 = 4;

/// Which diagnostic a run performs. Exactly one per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    Ping,
    /// Ping until cancelled, emitting the raw reply per attempt.
    PingRepeat,
    Traceroute,
    MtuDiscover,
    TcpProbe { port: u16 },
}

/// Immutable configuration for one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    /// TTL for pings, upper bound on hops for traceroute.
    pub hop_limit: u8,
    /// Echo attempts per target. Ignored in repeat mode.
    pub count: u32,
    /// Pause between attempts.
    pub delay: Duration,
    pub buffer_size: usize,
    pub dont_fragment: bool,
    /// Per-attempt timeout, never per-run.
    pub timeout: Duration,
    /// Collapse per-attempt records into one summary per target.
    pub quiet: bool,
    pub reverse_resolve: bool,
    pub family: Option<AddressFamily>,
    pub repeat: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            hop_limit: MAX_HOP_LIMIT,
            count: DEFAULT_COUNT,
            delay: Duration::from_secs(1),
            buffer_size: DEFAULT_BUFFER_SIZE,
            dont_fragment: false,
            timeout: Duration::from_secs(5),
            quiet: false,
            reverse_resolve: false,
            family: None,
            repeat: false,
        }
    }
}

impl ProbeOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hop_limit > MAX_HOP_LIMIT {
            return Err(ConfigError::HopLimit(self.hop_limit));
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::BufferSize(self.buffer_size));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.count == 0 && !self.repeat {
            return Err(ConfigError::ZeroCount);
        }
        Ok(())
    }

    /// Attempt count actually used: repeat mode runs until cancelled.
    pub fn effective_count(&self) -> u32 {
        if self.repeat { u32::MAX } else { self.count }
    }
}

/// Everything a run needs: mode, targets and shared options.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: ProbeMode,
    pub targets: Vec<String>,
    pub options: ProbeOptions,
}

impl RunConfig {
    pub fn new(mode: ProbeMode, targets: Vec<String>, mut options: ProbeOptions) -> Result<Self, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if mode == ProbeMode::PingRepeat {
            options.repeat = true;
        }
        options.validate()?;
        Ok(Self { mode, targets, options })
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
