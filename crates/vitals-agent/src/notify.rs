//! Notifier collaborator: sink for every non-fatal failure.

use vitals_core::protocol::ErrorReport;
use vitals_core::VitalsError;

use crate::transport::Outbox;

/// Fire-and-forget error sink. Must not block.
pub trait Notifier: Send + Sync {
    fn error(&self, err: &VitalsError);
}

/// Logs through `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, err: &VitalsError) {
        tracing::error!(code = err.code().as_str(), error = %err, "agent error");
    }
}

/// Logs and forwards an [`ErrorReport`] on the exception channel.
#[derive(Clone)]
pub struct OutboxNotifier {
    outbox: Outbox,
}

impl OutboxNotifier {
    pub fn new(outbox: Outbox) -> Self {
        Self { outbox }
    }
}

impl Notifier for OutboxNotifier {
    fn error(&self, err: &VitalsError) {
        tracing::error!(code = err.code().as_str(), error = %err, "agent error");
        self.outbox.post(ErrorReport::from(err));
    }
}
