//! Shared fakes for the agent integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

use vitals_agent::config::AgentConfig;
use vitals_agent::host::HostProbe;
use vitals_agent::notify::Notifier;
use vitals_agent::profiler::Profiler;
use vitals_agent::runtime::{
    ResourceSource, ResourceUsage, RuntimeCounters, RuntimeSource,
};
use vitals_agent::transport::Transport;
use vitals_agent::{AgentBuilder, AgentHandle};
use vitals_core::error::{Result, VitalsError};
use vitals_core::protocol::{ArtifactKind, Outbound, StatusSnapshot};

// --------------------
// Transport
// --------------------
#[derive(Debug, Clone)]
pub struct Sent {
    pub channel: String,
    pub payload: Outbound,
    pub at: Instant,
}

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    attempts: AtomicUsize,
    fail_on: Mutex<HashSet<usize>>,
    delay: Mutex<Option<Duration>>,
    pub connects: AtomicUsize,
    pub reconnects: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the n-th send attempt (0-based).
    pub fn fail_attempt(&self, n: usize) {
        self.fail_on.lock().unwrap().insert(n);
    }

    pub fn set_delay(&self, d: Duration) {
        *self.delay.lock().unwrap() = Some(d);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn on_channel(&self, channel: &str) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| s.channel == channel)
            .collect()
    }

    pub fn statuses(&self) -> Vec<(StatusSnapshot, Instant)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s.payload {
                Outbound::Status(st) => Some((st, s.at)),
                _ => None,
            })
            .collect()
    }

    pub fn artifacts(&self, kind: ArtifactKind) -> Vec<(Bytes, Instant)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s.payload {
                Outbound::Profiling(a) if a.kind == kind => Some((a.data, s.at)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, channel: &str, payload: &Outbound) -> Result<()> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        let at = Instant::now();
        self.sent.lock().unwrap().push(Sent {
            channel: channel.to_string(),
            payload: payload.clone(),
            at,
        });

        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        if self.fail_on.lock().unwrap().contains(&n) {
            return Err(VitalsError::Transport("link down".into()));
        }
        Ok(())
    }

    async fn close_and_reconnect(&self) -> Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// --------------------
// Notifier
// --------------------
#[derive(Default)]
pub struct RecordingNotifier {
    codes: Mutex<Vec<&'static str>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.codes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, err: &VitalsError) {
        self.codes.lock().unwrap().push(err.code().as_str());
    }
}

// --------------------
// Profiler
// --------------------
#[derive(Default)]
pub struct FakeProfiler {
    running: AtomicBool,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail_stop: AtomicBool,
    pub fail_heap: AtomicBool,
}

impl FakeProfiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Profiler for FakeProfiler {
    fn start_cpu_profile(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(VitalsError::Profiling("double start".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_cpu_profile(&self) -> Result<Bytes> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(VitalsError::Profiling("not running".into()));
        }
        let n = self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(VitalsError::Profiling("capture failed".into()));
        }
        Ok(Bytes::from(format!("profile-{n}")))
    }

    fn heap_dump(&self) -> Result<Bytes> {
        if self.fail_heap.load(Ordering::SeqCst) {
            return Err(VitalsError::Profiling("heap walk failed".into()));
        }
        Ok(Bytes::from_static(b"heap"))
    }
}

// --------------------
// Host
// --------------------
#[derive(Default)]
pub struct FakeHost {
    pub fail_cpu: AtomicBool,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl HostProbe for FakeHost {
    fn cpu_percent(&self) -> Result<f64> {
        if self.fail_cpu.load(Ordering::SeqCst) {
            return Err(VitalsError::Sampling("cpu times unavailable".into()));
        }
        Ok(12.5)
    }

    fn cpu_load(&self) -> f64 {
        0.75
    }

    fn total_mem(&self) -> u64 {
        16 << 30
    }

    fn cpu_name(&self) -> String {
        "Fake CPU".into()
    }

    fn cpu_count(&self) -> usize {
        4
    }

    fn process_memory(&self) -> Result<u64> {
        Ok(64 << 20)
    }

    fn hostname(&self) -> String {
        "test-host".into()
    }
}

// --------------------
// Runtime + resources
// --------------------
/// Pops one scripted read per sample; `None` entries fail. Repeats the last
/// successful value once the script runs out.
#[derive(Default)]
pub struct ScriptedRuntime {
    script: Mutex<VecDeque<Option<RuntimeCounters>>>,
    last: Mutex<RuntimeCounters>,
    pub tasks: AtomicU64,
    pub foreign: AtomicU64,
}

impl ScriptedRuntime {
    pub fn new(script: Vec<Option<RuntimeCounters>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn gc_only(gc: &[u64]) -> Arc<Self> {
        Self::new(
            gc.iter()
                .map(|g| {
                    Some(RuntimeCounters {
                        gc_cycles: *g,
                        ..Default::default()
                    })
                })
                .collect(),
        )
    }
}

impl RuntimeSource for ScriptedRuntime {
    fn read_counters(&self) -> Result<RuntimeCounters> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Some(c)) => {
                *self.last.lock().unwrap() = c;
                Ok(c)
            }
            Some(None) => Err(VitalsError::Sampling("memstats read failed".into())),
            None => Ok(*self.last.lock().unwrap()),
        }
    }

    fn live_tasks(&self) -> u64 {
        self.tasks.load(Ordering::SeqCst)
    }

    fn foreign_calls(&self) -> u64 {
        self.foreign.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FixedResources {
    pub usage: Mutex<ResourceUsage>,
    pub fail: AtomicBool,
}

impl FixedResources {
    pub fn new(usage: ResourceUsage) -> Arc<Self> {
        Arc::new(Self {
            usage: Mutex::new(usage),
            fail: AtomicBool::new(false),
        })
    }
}

impl ResourceSource for FixedResources {
    fn read_usage(&self) -> Result<ResourceUsage> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(VitalsError::Sampling("getrusage failed".into()));
        }
        Ok(*self.usage.lock().unwrap())
    }
}

// --------------------
// Agent harness
// --------------------
pub struct Harness {
    pub agent: AgentHandle,
    pub transport: Arc<RecordingTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub profiler: Arc<FakeProfiler>,
    pub host: Arc<FakeHost>,
    pub runtime: Arc<ScriptedRuntime>,
    pub started: Instant,
}

pub fn builder_with_fakes(
    cfg: AgentConfig,
    transport: Arc<RecordingTransport>,
    notifier: Arc<RecordingNotifier>,
    profiler: Arc<FakeProfiler>,
    host: Arc<FakeHost>,
    runtime: Arc<ScriptedRuntime>,
) -> AgentBuilder {
    AgentHandle::builder(cfg)
        .transport(transport)
        .notifier(notifier)
        .profiler(profiler)
        .host(host)
        .runtime(runtime)
        .resources(FixedResources::new(ResourceUsage::default()))
}

pub async fn start_agent(cfg: AgentConfig) -> Harness {
    let transport = RecordingTransport::new();
    let notifier = RecordingNotifier::new();
    let profiler = FakeProfiler::new();
    let host = FakeHost::new();
    let runtime = ScriptedRuntime::new(Vec::new());

    let started = Instant::now();
    let agent = builder_with_fakes(
        cfg,
        Arc::clone(&transport),
        Arc::clone(&notifier),
        Arc::clone(&profiler),
        Arc::clone(&host),
        Arc::clone(&runtime),
    )
    .start()
    .await
    .expect("agent start");

    Harness {
        agent,
        transport,
        notifier,
        profiler,
        host,
        runtime,
        started,
    }
}
