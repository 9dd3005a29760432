pub mod run;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pathprobe_common::config::{DEFAULT_COUNT, MAX_HOP_LIMIT, ProbeMode, ProbeOptions, RunConfig};
use pathprobe_common::error::ConfigError;
use pathprobe_common::network::payload::DEFAULT_BUFFER_SIZE;
use pathprobe_common::network::target::AddressFamily;

#[derive(Parser)]
#[command(name = "pathprobe", version)]
#[command(about = "Ping, traceroute, path MTU discovery and TCP reachability from one tool.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send echo requests to one or more targets
    #[command(alias = "p")]
    Ping {
        /// Keep pinging until interrupted
        #[arg(short = 't', long)]
        repeat: bool,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Trace the route to one or more targets
    #[command(alias = "trace")]
    Traceroute {
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Discover the path MTU to one or more targets
    #[command(alias = "mtu-discover")]
    Mtu {
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Check whether a TCP port accepts connections
    #[command(alias = "tcp-probe")]
    Tcp {
        /// Port to connect to
        #[arg(short, long)]
        port: u16,
        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Host names or addresses to probe
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,

    /// Use IPv4 addresses only
    #[arg(short = '4', long, conflicts_with = "ipv6")]
    pub ipv4: bool,

    /// Use IPv6 addresses only
    #[arg(short = '6', long)]
    pub ipv6: bool,

    /// Resolve addresses to host names
    #[arg(short = 'a', long)]
    pub resolve: bool,

    /// Maximum number of hops (TTL)
    #[arg(short = 'i', long, default_value_t = MAX_HOP_LIMIT,
          value_parser = clap::value_parser!(u8).range(0..=128))]
    pub max_hops: u8,

    /// Number of echo requests per target
    #[arg(short = 'n', long, default_value_t = DEFAULT_COUNT,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Seconds to wait between echo requests
    #[arg(short = 'd', long, default_value_t = 1)]
    pub delay: u64,

    /// Payload size in bytes
    #[arg(short = 'l', long, default_value_t = DEFAULT_BUFFER_SIZE as u16,
          value_parser = clap::value_parser!(u16).range(0..=65500))]
    pub buffer_size: u16,

    /// Set the don't-fragment flag
    #[arg(short = 'f', long)]
    pub dont_fragment: bool,

    /// Print only a true/false (or MTU) result per target
    #[arg(short, long)]
    pub quiet: bool,

    /// Seconds to wait for each reply
    #[arg(short = 'w', long, default_value_t = 5,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

impl ProbeArgs {
    pub fn options(&self) -> ProbeOptions {
        let family: Option<AddressFamily> = match (self.ipv4, self.ipv6) {
            (true, _) => Some(AddressFamily::V4),
            (_, true) => Some(AddressFamily::V6),
            _ => None,
        };

        ProbeOptions {
            hop_limit: self.max_hops,
            count: self.count,
            delay: Duration::from_secs(self.delay),
            buffer_size: usize::from(self.buffer_size),
            dont_fragment: self.dont_fragment,
            timeout: Duration::from_secs(self.timeout),
            quiet: self.quiet,
            reverse_resolve: self.resolve,
            family,
            repeat: false,
        }
    }
}

impl Commands {
    fn parts(&self) -> (ProbeMode, &ProbeArgs) {
        match self {
            Commands::Ping { repeat: true, probe } => (ProbeMode::PingRepeat, probe),
            Commands::Ping { repeat: false, probe } => (ProbeMode::Ping, probe),
            Commands::Traceroute { probe } => (ProbeMode::Traceroute, probe),
            Commands::Mtu { probe } => (ProbeMode::MtuDiscover, probe),
            Commands::Tcp { port, probe } => (ProbeMode::TcpProbe { port: *port }, probe),
        }
    }

    /// Quiet output only applies to bounded runs.
    pub fn is_quiet(&self) -> bool {
        match self.parts() {
            (ProbeMode::PingRepeat, _) => false,
            (_, probe) => probe.quiet,
        }
    }

    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        let (mode, probe) = self.parts();
        RunConfig::new(mode, probe.targets.clone(), probe.options())
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
