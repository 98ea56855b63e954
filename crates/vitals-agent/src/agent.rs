//! Agent wiring and the handle given back to the host.
//!
//! `AgentBuilder::start` does, in order:
//! 1) validate config and resolve collaborators (defaults where unset),
//! 2) build the registry, sampler, dispatcher and internal actions,
//! 3) connect the transport (failure is reported, not fatal),
//! 4) spawn the outbox pump and the reporter.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use vitals_core::error::{Result, VitalsError};
use vitals_core::protocol::StatusSnapshot;
use vitals_core::Metric;

use crate::actions::{CpuProfiling, CpuProfilingStart, CpuProfilingStop, HeapDump};
use crate::config::AgentConfig;
use crate::dispatch::{Dispatcher, FnAction};
use crate::host::{HostProbe, SysinfoHost};
use crate::notify::{Notifier, OutboxNotifier};
use crate::obs::CounterRegistry;
use crate::profiler::{Profiler, RusageProfiler};
use crate::report::{Reporter, StatusOverride};
use crate::runtime::{ProcessRuntime, ResourceSource, Rusage, RuntimeSource};
use crate::sampler::Sampler;
use crate::transport::{spawn_pump, Outbox, OutboxStats, Transport};

pub struct AgentBuilder {
    cfg: AgentConfig,
    transport: Option<Arc<dyn Transport>>,
    host: Option<Arc<dyn HostProbe>>,
    profiler: Option<Arc<dyn Profiler>>,
    runtime: Option<Arc<dyn RuntimeSource>>,
    resources: Option<Arc<dyn ResourceSource>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AgentBuilder {
    pub fn new(cfg: AgentConfig) -> Self {
        Self {
            cfg,
            transport: None,
            host: None,
            profiler: None,
            runtime: None,
            resources: None,
            notifier: None,
        }
    }

    /// Required.
    pub fn transport(mut self, t: Arc<dyn Transport>) -> Self {
        self.transport = Some(t);
        self
    }

    pub fn host(mut self, h: Arc<dyn HostProbe>) -> Self {
        self.host = Some(h);
        self
    }

    pub fn profiler(mut self, p: Arc<dyn Profiler>) -> Self {
        self.profiler = Some(p);
        self
    }

    pub fn runtime(mut self, r: Arc<dyn RuntimeSource>) -> Self {
        self.runtime = Some(r);
        self
    }

    pub fn resources(mut self, r: Arc<dyn ResourceSource>) -> Self {
        self.resources = Some(r);
        self
    }

    /// Defaults to an [`OutboxNotifier`] on the agent's own outbox.
    pub fn notifier(mut self, n: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(n);
        self
    }

    /// Must be called from within a tokio runtime.
    pub async fn start(self) -> Result<AgentHandle> {
        // 1) Config + collaborators
        self.cfg.validate()?;
        let cfg = Arc::new(self.cfg);
        let transport = self
            .transport
            .ok_or_else(|| VitalsError::BadRequest("transport is required".into()))?;

        let (outbox, outbox_rx) = Outbox::channel(cfg.agent.outbox_capacity);
        let notifier: Arc<dyn Notifier> = self
            .notifier
            .unwrap_or_else(|| Arc::new(OutboxNotifier::new(outbox.clone())));
        let host: Arc<dyn HostProbe> = self.host.unwrap_or_else(|| Arc::new(SysinfoHost::new()));
        let profiler: Arc<dyn Profiler> =
            self.profiler.unwrap_or_else(|| Arc::new(RusageProfiler::new()));
        let runtime: Arc<dyn RuntimeSource> =
            self.runtime.unwrap_or_else(|| Arc::new(ProcessRuntime::new()));
        let resources: Arc<dyn ResourceSource> =
            self.resources.unwrap_or_else(|| Arc::new(Rusage));

        // 2) Registry, sampler, actions
        let registry = Arc::new(CounterRegistry::new());
        let sampler = Sampler::install(&registry, runtime, resources, Arc::clone(&notifier))?;

        let dispatcher = Arc::new(Dispatcher::new());
        if cfg.profiling.heapdump {
            dispatcher.register(Arc::new(HeapDump::new(
                Arc::clone(&profiler),
                outbox.clone(),
                Arc::clone(&notifier),
            )));
        }
        if cfg.profiling.cpu {
            let profiling = Arc::new(CpuProfiling::new(
                Arc::clone(&profiler),
                outbox.clone(),
                Arc::clone(&notifier),
                Duration::from_millis(cfg.profiling.max_timeout_ms),
            ));
            dispatcher.register(Arc::new(CpuProfilingStart::new(Arc::clone(&profiling))));
            dispatcher.register(Arc::new(CpuProfilingStop::new(profiling)));
        }

        // 3) Transport
        if let Err(e) = transport.connect().await {
            notifier.error(&e);
        }

        // 4) Background tasks
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let status_override: Arc<RwLock<Option<StatusOverride>>> = Arc::new(RwLock::new(None));

        let reporter = Reporter::new(
            Arc::clone(&cfg),
            Arc::clone(&registry),
            sampler,
            host,
            Arc::clone(&dispatcher),
            outbox.clone(),
            Arc::clone(&notifier),
            Arc::clone(&status_override),
        );
        let period = Duration::from_millis(cfg.agent.report_interval_ms);

        let pump = spawn_pump(outbox_rx, Arc::clone(&transport), shutdown_rx.clone());
        let ticker = reporter.spawn(period, shutdown_rx);

        tracing::info!(
            name = %cfg.agent.name,
            node = %cfg.agent.node,
            period_ms = cfg.agent.report_interval_ms,
            actions = ?dispatcher.registered(),
            "agent started"
        );

        Ok(AgentHandle {
            inner: Arc::new(AgentInner {
                cfg,
                registry,
                dispatcher,
                transport,
                notifier,
                outbox,
                status_override,
                shutdown: shutdown_tx,
                tasks: Mutex::new(vec![ticker, pump]),
            }),
        })
    }
}

struct AgentInner {
    cfg: Arc<AgentConfig>,
    registry: Arc<CounterRegistry>,
    dispatcher: Arc<Dispatcher>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    outbox: Outbox,
    status_override: Arc<RwLock<Option<StatusOverride>>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Host-facing handle. Cheap to clone.
#[derive(Clone)]
pub struct AgentHandle {
    inner: Arc<AgentInner>,
}

impl AgentHandle {
    pub fn builder(cfg: AgentConfig) -> AgentBuilder {
        AgentBuilder::new(cfg)
    }

    pub fn cfg(&self) -> &AgentConfig {
        &self.inner.cfg
    }

    /// Entry point for remote action requests. Returns the action's result
    /// string, or an empty string when the action is unknown.
    pub async fn invoke(&self, name: &str, payload: Value) -> String {
        match self.inner.dispatcher.invoke(name, payload).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(action = %name, error = %e, "action rejected");
                self.inner.notifier.error(&e);
                String::new()
            }
        }
    }

    /// name -> current value; function-backed metrics are evaluated now.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.registry.values()
    }

    /// Register a host metric; it shows up in the next snapshot.
    pub fn add_metric(&self, metric: Metric) -> Result<Arc<Metric>> {
        self.inner.registry.register(metric)
    }

    /// Register a custom action.
    pub fn add_action<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Value) -> String + Send + Sync + 'static,
    {
        self.inner.dispatcher.register(Arc::new(FnAction::new(name, f)));
    }

    /// Replace the status snapshot with `f()` on every tick (skips sampling).
    pub fn set_status_override<F>(&self, f: F)
    where
        F: Fn() -> StatusSnapshot + Send + Sync + 'static,
    {
        if let Ok(mut g) = self.inner.status_override.write() {
            *g = Some(Arc::new(f));
        }
    }

    pub fn clear_status_override(&self) {
        if let Ok(mut g) = self.inner.status_override.write() {
            *g = None;
        }
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.inner.notifier)
    }

    pub fn outbox_stats(&self) -> Arc<OutboxStats> {
        self.inner.outbox.stats()
    }

    /// Drop and re-establish the transport connection.
    pub async fn restart_transport(&self) {
        if let Err(e) = self.inner.transport.close_and_reconnect().await {
            self.inner.notifier.error(&e);
        }
    }

    /// Stop the reporter and the outbox pump and wait for both.
    pub async fn shutdown(&self) {
        let _ = self.inner.shutdown.send(true);
        let tasks: Vec<JoinHandle<()>> = match self.inner.tasks.lock() {
            Ok(mut g) => g.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for t in tasks {
            let _ = t.await;
        }
        tracing::info!("agent stopped");
    }

    /// Report `err` and then panic. Only for hosts that want the agent to
    /// record a fatal error on its way down.
    pub fn fail(&self, err: VitalsError) -> ! {
        self.inner.notifier.error(&err);
        panic!("{err}");
    }
}
