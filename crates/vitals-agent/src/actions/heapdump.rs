use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use vitals_core::protocol::{ActionKind, ArtifactKind, ProfilingArtifact};

use crate::dispatch::ActionHandler;
use crate::notify::Notifier;
use crate::profiler::Profiler;
use crate::transport::Outbox;

use super::HEAPDUMP;

/// Synchronous heap snapshot, published as a `heapdump` artifact.
pub struct HeapDump {
    profiler: Arc<dyn Profiler>,
    outbox: Outbox,
    notifier: Arc<dyn Notifier>,
}

impl HeapDump {
    pub fn new(profiler: Arc<dyn Profiler>, outbox: Outbox, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            profiler,
            outbox,
            notifier,
        }
    }
}

#[async_trait]
impl ActionHandler for HeapDump {
    fn name(&self) -> &str {
        HEAPDUMP
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Internal
    }

    async fn invoke(&self, _payload: Value) -> String {
        match self.profiler.heap_dump() {
            Ok(data) => {
                tracing::info!(bytes = data.len(), "heap dump captured");
                self.outbox.post(ProfilingArtifact::new(ArtifactKind::Heapdump, data));
            }
            Err(e) => self.notifier.error(&e),
        }
        String::new()
    }
}
