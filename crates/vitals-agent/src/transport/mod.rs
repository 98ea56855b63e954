//! Transport collaborator and the outbox in front of it.
//!
//! The reporter and the profiling actions never talk to the transport
//! directly: they post into the [`Outbox`], a bounded queue drained in order
//! by a single pump task. Posting never blocks.

pub mod outbox;
pub mod stdout;

use async_trait::async_trait;

use vitals_core::protocol::Outbound;
use vitals_core::Result;

pub use outbox::{spawn_pump, Outbox, OutboxReceiver, OutboxStats};
pub use stdout::StdoutTransport;

/// Link to the remote collector. Must be safe to call from several tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<()>;

    async fn send(&self, channel: &str, payload: &Outbound) -> Result<()>;

    async fn close_and_reconnect(&self) -> Result<()>;
}
