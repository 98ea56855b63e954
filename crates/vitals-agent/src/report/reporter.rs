use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use vitals_core::protocol::{
    unix_millis, AgentOptions, ApmInfo, CpuInfo, ProcessInfo, ServerInfo, StatusSnapshot,
};

use crate::config::AgentConfig;
use crate::dispatch::Dispatcher;
use crate::host::HostProbe;
use crate::notify::Notifier;
use crate::obs::CounterRegistry;
use crate::sampler::Sampler;
use crate::transport::Outbox;

pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host-supplied replacement for the whole status snapshot.
pub type StatusOverride = Arc<dyn Fn() -> StatusSnapshot + Send + Sync>;

/// Builds and posts the status snapshot. Owned by the ticker task.
pub struct Reporter {
    cfg: Arc<AgentConfig>,
    registry: Arc<CounterRegistry>,
    sampler: Sampler,
    host: Arc<dyn HostProbe>,
    dispatcher: Arc<Dispatcher>,
    outbox: Outbox,
    notifier: Arc<dyn Notifier>,
    status_override: Arc<RwLock<Option<StatusOverride>>>,
    ticks: u64,
    started: Instant,
    started_at_ms: i64,
    server_name: String,
}

impl Reporter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: Arc<AgentConfig>,
        registry: Arc<CounterRegistry>,
        sampler: Sampler,
        host: Arc<dyn HostProbe>,
        dispatcher: Arc<Dispatcher>,
        outbox: Outbox,
        notifier: Arc<dyn Notifier>,
        status_override: Arc<RwLock<Option<StatusOverride>>>,
    ) -> Self {
        let server_name = cfg
            .agent
            .server_name
            .clone()
            .unwrap_or_else(|| host.hostname());
        Self {
            cfg,
            registry,
            sampler,
            host,
            dispatcher,
            outbox,
            notifier,
            status_override,
            ticks: 0,
            started: Instant::now(),
            started_at_ms: unix_millis(),
            server_name,
        }
    }

    /// One reporting cycle: sample, build, post.
    pub fn tick(&mut self) {
        let snapshot = match self.current_override() {
            Some(f) => f(),
            None => {
                self.sampler.sample();
                self.build_snapshot()
            }
        };
        self.outbox.post(snapshot);
        self.ticks += 1;
        tracing::debug!(tick = self.ticks, "status posted");
    }

    fn current_override(&self) -> Option<StatusOverride> {
        match self.status_override.read() {
            Ok(g) => g.clone(),
            Err(_) => None,
        }
    }

    /// Snapshot from the current registry and host readings. Commits rate
    /// probes, so it is called once per tick.
    pub fn build_snapshot(&self) -> StatusSnapshot {
        let cpu = self.host.cpu_percent().unwrap_or_else(|e| {
            self.notifier.error(&e);
            0.0
        });
        let memory = self.host.process_memory().unwrap_or_else(|e| {
            self.notifier.error(&e);
            0
        });

        let agent = &self.cfg.agent;
        let process = ProcessInfo {
            pid: std::process::id(),
            name: agent.name.clone(),
            interpreter: "rust".into(),
            restart_time: 0,
            created_at: self.started_at_ms,
            pm_uptime: self.started_at_ms,
            exec_mode: "fork_mode".into(),
            watching: false,
            status: "online".into(),
            pm_id: 0,
            cpu,
            memory,
            node_env: agent.node_env.clone(),
            actions: self.dispatcher.descriptors(),
            monitor: self.registry.commit_readings(),
            options: AgentOptions {
                heapdump: self.cfg.profiling.heapdump,
                profiling: self.cfg.profiling.cpu,
                custom_probes: true,
                apm: ApmInfo {
                    kind: "rust".into(),
                    version: AGENT_VERSION.into(),
                },
            },
        };

        StatusSnapshot {
            process: vec![process],
            server: ServerInfo {
                loadavg: self.host.cpu_load(),
                total_mem: self.host.total_mem(),
                hostname: self.host.hostname(),
                server_name: self.server_name.clone(),
                uptime_ms: self.started.elapsed().as_millis() as u64,
                agent_version: AGENT_VERSION.into(),
                os_type: std::env::consts::OS.into(),
                arch: std::env::consts::ARCH.into(),
                interaction: true,
                cpu: CpuInfo {
                    number: self.host.cpu_count(),
                    info: self.host.cpu_name(),
                },
            },
        }
    }

    /// Tick every `period` until `shutdown` flips to true. The first tick
    /// fires immediately; late ticks are delayed, never bunched.
    pub fn spawn(
        mut self,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(period_ms = period.as_millis() as u64, "reporter started");
            loop {
                tokio::select! {
                    _ = tick.tick() => self.tick(),
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!(ticks = self.ticks, "reporter stopped");
        })
    }
}
