//! # Result Model
//!
//! Records produced by the probe engines and streamed to the consumer as
//! each probe completes. Records are immutable once built and are owned by
//! the consumer after emission.
//!
//! The mode-specific records ([`TraceHopStatus`], [`MtuStatus`]) embed a
//! shared [`PingStatus`] instead of extending it.

pub mod echo;
pub mod record;
pub mod status;

pub use echo::{EchoResult, EchoStatus};
pub use record::{Diagnostic, ProbeRecord, QuietSummary, SummaryValue};
pub use status::{MtuStatus, PingReply, PingStatus, TraceHopStatus};
