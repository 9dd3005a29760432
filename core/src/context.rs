use std::sync::Arc;

use pathprobe_common::config::ProbeOptions;
use pathprobe_common::error::ProbeError;
use pathprobe_common::models::{
    Diagnostic, EchoResult, PingStatus, ProbeRecord, QuietSummary, SummaryValue,
};
use pathprobe_common::network::target::ResolvedTarget;

use crate::echo::EchoRequest;
use crate::sink::RecordSink;

/// What a probe engine needs to know about the target it is working on.
pub struct ProbeContext<'a> {
    /// Local host name stamped on every record.
    pub source: &'a str,
    pub target: &'a ResolvedTarget,
    pub options: &'a ProbeOptions,
    pub sink: &'a RecordSink,
}

impl ProbeContext<'_> {
    pub fn request(&self, payload: Arc<[u8]>, ttl: u8, dont_fragment: bool) -> EchoRequest {
        EchoRequest {
            address: self.target.address,
            payload,
            ttl,
            dont_fragment,
            timeout: self.options.timeout,
        }
    }

    pub fn ping_status(&self, sequence: u32, reply: EchoResult) -> PingStatus {
        PingStatus {
            source: self.source.to_string(),
            destination: self.target.display_name.clone(),
            destination_address: self.target.address,
            sequence,
            reply,
        }
    }

    pub fn emit(&self, record: ProbeRecord) {
        self.sink.emit(record);
    }

    /// Reports a non-fatal error against this target.
    pub fn report(&self, hop: Option<u8>, attempt: Option<u32>, error: ProbeError) {
        self.sink.emit(ProbeRecord::Diagnostic(Diagnostic {
            target: self.target.input.clone(),
            hop,
            attempt,
            error,
        }));
    }

    pub fn summarize(&self, value: SummaryValue) {
        self.sink.emit(ProbeRecord::Summary(QuietSummary {
            target: self.target.input.clone(),
            value,
        }));
    }
}
