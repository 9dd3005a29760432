use pathprobe_common::models::ProbeRecord;
use tokio::sync::mpsc;
use tracing::trace;

/// Streams records to the consumer as soon as each probe completes.
#[derive(Debug, Clone)]
pub struct RecordSink {
    tx: mpsc::UnboundedSender<ProbeRecord>,
}

impl RecordSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProbeRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, record: ProbeRecord) {
        if self.tx.send(record).is_err() {
            trace!("record consumer has gone away");
        }
    }
}
