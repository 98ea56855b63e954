//! CPU profiling session state machine.
//!
//! At most one session is active. A session ends either through
//! `cpu-profiling-stop` or through its optional timeout task, whichever takes
//! it out of the slot first; the other side finds the slot empty (or holding a
//! newer session) and does nothing. The profile is therefore captured and
//! published exactly once per session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use vitals_core::error::{Result, VitalsError};
use vitals_core::protocol::{ActionKind, ArtifactKind, ProfilingArtifact};

use crate::dispatch::ActionHandler;
use crate::notify::Notifier;
use crate::profiler::Profiler;
use crate::transport::Outbox;

use super::{CPU_PROFILING_START, CPU_PROFILING_STOP};

struct ActiveProfile {
    id: u64,
    started: Instant,
    deadline: Option<Duration>,
}

pub struct CpuProfiling {
    profiler: Arc<dyn Profiler>,
    outbox: Outbox,
    notifier: Arc<dyn Notifier>,
    slot: Mutex<Option<ActiveProfile>>,
    next_id: AtomicU64,
    max_timeout: Duration,
}

impl CpuProfiling {
    pub fn new(
        profiler: Arc<dyn Profiler>,
        outbox: Outbox,
        notifier: Arc<dyn Notifier>,
        max_timeout: Duration,
    ) -> Self {
        Self {
            profiler,
            outbox,
            notifier,
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
            max_timeout,
        }
    }

    /// Start a session. A second start while one is active is rejected.
    ///
    /// With `timeout`, a task is spawned that ends this session (and only
    /// this one) once the timeout elapses.
    pub fn start(self: &Arc<Self>, timeout: Option<Duration>) -> Result<u64> {
        if let Some(t) = timeout {
            if t > self.max_timeout {
                return Err(VitalsError::BadRequest(format!(
                    "timeout {}ms exceeds {}ms",
                    t.as_millis(),
                    self.max_timeout.as_millis()
                )));
            }
        }

        let id = {
            let mut slot = self.lock_slot()?;
            if slot.is_some() {
                return Err(VitalsError::ProfilerBusy);
            }
            self.profiler.start_cpu_profile()?;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            *slot = Some(ActiveProfile {
                id,
                started: Instant::now(),
                deadline: timeout,
            });
            id
        };

        tracing::info!(
            session = id,
            timeout_ms = ?timeout.map(|t| t.as_millis()),
            "cpu profiling started"
        );

        if let Some(t) = timeout {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(t).await;
                match this.finish(Some(id)) {
                    Ok(true) => tracing::debug!(session = id, "cpu profile ended by timeout"),
                    Ok(false) => tracing::debug!(session = id, "cpu profile already stopped"),
                    Err(e) => this.notifier.error(&e),
                }
            });
        }

        Ok(id)
    }

    /// End the active session, capture it and publish a `cpuprofile` artifact.
    ///
    /// With `only = Some(id)` a session with another id is left running.
    /// Returns `Ok(false)` when there was nothing to end.
    pub fn finish(&self, only: Option<u64>) -> Result<bool> {
        let captured = {
            let mut slot = self.lock_slot()?;
            let matches = match (slot.as_ref(), only) {
                (Some(active), Some(id)) => active.id == id,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !matches {
                return Ok(false);
            }
            let Some(active) = slot.take() else {
                return Ok(false);
            };
            // Captured under the lock so a new start cannot race the profiler.
            self.profiler.stop_cpu_profile().map(|data| (active, data))
        };

        let (active, data) = captured?;
        tracing::info!(
            session = active.id,
            elapsed_ms = active.started.elapsed().as_millis() as u64,
            deadline_ms = ?active.deadline.map(|d| d.as_millis()),
            bytes = data.len(),
            "cpu profiling stopped"
        );
        self.outbox.post(ProfilingArtifact::new(ArtifactKind::Cpuprofile, data));
        Ok(true)
    }

    fn lock_slot(&self) -> Result<std::sync::MutexGuard<'_, Option<ActiveProfile>>> {
        self.slot
            .lock()
            .map_err(|_| VitalsError::Internal("profiling slot poisoned".into()))
    }
}

/// `payload.opts.timeout` in milliseconds, if present.
fn parse_timeout(payload: &Value) -> Result<Option<Duration>> {
    let Some(raw) = payload.get("opts").and_then(|o| o.get("timeout")) else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    let ms = raw
        .as_f64()
        .ok_or_else(|| VitalsError::BadRequest("opts.timeout must be a number".into()))?;
    if !ms.is_finite() || ms < 0.0 {
        return Err(VitalsError::BadRequest(format!("invalid opts.timeout: {ms}")));
    }
    Ok(Some(Duration::from_micros((ms * 1000.0).round() as u64)))
}

pub struct CpuProfilingStart {
    profiling: Arc<CpuProfiling>,
}

impl CpuProfilingStart {
    pub fn new(profiling: Arc<CpuProfiling>) -> Self {
        Self { profiling }
    }
}

#[async_trait]
impl ActionHandler for CpuProfilingStart {
    fn name(&self) -> &str {
        CPU_PROFILING_START
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Internal
    }

    async fn invoke(&self, payload: Value) -> String {
        let res = parse_timeout(&payload).and_then(|t| self.profiling.start(t));
        if let Err(e) = res {
            self.profiling.notifier.error(&e);
        }
        String::new()
    }
}

pub struct CpuProfilingStop {
    profiling: Arc<CpuProfiling>,
}

impl CpuProfilingStop {
    pub fn new(profiling: Arc<CpuProfiling>) -> Self {
        Self { profiling }
    }
}

#[async_trait]
impl ActionHandler for CpuProfilingStop {
    fn name(&self) -> &str {
        CPU_PROFILING_STOP
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Internal
    }

    /// Idle stop is a silent no-op.
    async fn invoke(&self, _payload: Value) -> String {
        match self.profiling.finish(None) {
            Ok(true) => {}
            Ok(false) => tracing::debug!("cpu profiling stop with nothing active"),
            Err(e) => self.profiling.notifier.error(&e),
        }
        String::new()
    }
}
