use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use vitals_core::protocol::Outbound;

use super::Transport;

/// Delivery counters, shared by the outbox and its pump.
#[derive(Debug, Default)]
pub struct OutboxStats {
    posted: AtomicU64,
    dropped: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl OutboxStats {
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Lossy, non-blocking front of the transport.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Outbound>,
    stats: Arc<OutboxStats>,
}

/// Receiving half, consumed by [`spawn_pump`].
pub struct OutboxReceiver {
    rx: mpsc::Receiver<Outbound>,
    stats: Arc<OutboxStats>,
}

impl Outbox {
    pub fn channel(capacity: usize) -> (Outbox, OutboxReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(OutboxStats::default());
        (
            Outbox {
                tx,
                stats: Arc::clone(&stats),
            },
            OutboxReceiver { rx, stats },
        )
    }

    /// Queue a payload. Drops it (and returns false) when the queue is full
    /// or the pump is gone.
    pub fn post(&self, out: impl Into<Outbound>) -> bool {
        let out = out.into();
        let channel = out.channel();
        match self.tx.try_send(out) {
            Ok(()) => {
                self.stats.posted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(channel, "outbox full, payload dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(channel, "outbox closed, payload dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> Arc<OutboxStats> {
        Arc::clone(&self.stats)
    }
}

/// Drain the outbox into `transport`, one payload at a time, in post order.
///
/// A failed send is logged and counted; it is never retried here. On shutdown
/// the queue is closed to new posts and whatever is already queued is still
/// delivered before the pump exits.
pub fn spawn_pump(
    recv: OutboxReceiver,
    transport: Arc<dyn Transport>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let OutboxReceiver { mut rx, stats } = recv;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe_out = rx.recv() => {
                    let Some(out) = maybe_out else { break; };
                    deliver(transport.as_ref(), &stats, out).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        rx.close();
                        let mut drained = 0u64;
                        while let Some(out) = rx.recv().await {
                            deliver(transport.as_ref(), &stats, out).await;
                            drained += 1;
                        }
                        tracing::debug!(drained, "outbox drained");
                        break;
                    }
                }
            }
        }
        tracing::debug!("outbox pump stopped");
    })
}

async fn deliver(transport: &dyn Transport, stats: &OutboxStats, out: Outbound) {
    let channel = out.channel();
    match transport.send(channel, &out).await {
        Ok(()) => {
            stats.sent.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(channel, error = %e, "transport send failed");
        }
    }
}
