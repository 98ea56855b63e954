//! Sampler: delta bookkeeping, absolute values, failure handling.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{FixedResources, RecordingNotifier, ScriptedRuntime};
use vitals_agent::obs::CounterRegistry;
use vitals_agent::runtime::{ResourceUsage, RuntimeCounters};
use vitals_agent::sampler::{names, Sampler};

fn install(
    runtime: Arc<ScriptedRuntime>,
    resources: Arc<FixedResources>,
) -> (CounterRegistry, Sampler, Arc<RecordingNotifier>) {
    let registry = CounterRegistry::new();
    let notifier = RecordingNotifier::new();
    let sampler = Sampler::install(&registry, runtime, resources, notifier.clone()).unwrap();
    (registry, sampler, notifier)
}

#[test]
fn gc_runs_are_reported_as_deltas() {
    let (registry, mut sampler, _) = install(
        ScriptedRuntime::gc_only(&[5, 5, 7, 7]),
        FixedResources::new(ResourceUsage::default()),
    );

    let mut seen = Vec::new();
    for _ in 0..4 {
        sampler.sample();
        seen.push(registry.values()[names::GC_RUNS]);
    }
    assert_eq!(seen, vec![5.0, 0.0, 2.0, 0.0]);
}

#[test]
fn cumulative_and_absolute_counters() {
    let script = vec![
        Some(RuntimeCounters {
            gc_cycles: 1,
            mallocs: 100,
            frees: 40,
            heap_alloc: 4096,
            pause_total_ns: 1_000,
        }),
        Some(RuntimeCounters {
            gc_cycles: 3,
            mallocs: 250,
            frees: 90,
            heap_alloc: 2048,
            pause_total_ns: 1_500,
        }),
    ];
    let usage = ResourceUsage {
        voluntary_switches: 17,
        involuntary_switches: 3,
        soft_page_faults: 900,
        hard_page_faults: 2,
    };
    let (registry, mut sampler, notifier) =
        install(ScriptedRuntime::new(script), FixedResources::new(usage));

    sampler.sample();
    let v = registry.values();
    assert_eq!(v[names::MALLOCS], 100.0);
    assert_eq!(v[names::HEAP_ALLOC], 4096.0);

    sampler.sample();
    let v = registry.values();
    assert_eq!(v[names::GC_RUNS], 2.0);
    assert_eq!(v[names::MALLOCS], 150.0);
    assert_eq!(v[names::FREES], 50.0);
    assert_eq!(v[names::PAUSE], 500.0);
    // heap size is absolute, even when it shrinks
    assert_eq!(v[names::HEAP_ALLOC], 2048.0);
    // rusage fields are absolute
    assert_eq!(v[names::VOLUNTARY_SWITCHES], 17.0);
    assert_eq!(v[names::INVOLUNTARY_SWITCHES], 3.0);
    assert_eq!(v[names::SOFT_PAGE_FAULTS], 900.0);
    assert_eq!(v[names::HARD_PAGE_FAULTS], 2.0);

    assert!(notifier.codes().is_empty());
}

#[test]
fn counter_reset_is_not_clamped() {
    let (registry, mut sampler, _) = install(
        ScriptedRuntime::gc_only(&[40, 2]),
        FixedResources::new(ResourceUsage::default()),
    );
    sampler.sample();
    sampler.sample();
    assert_eq!(registry.values()[names::GC_RUNS], -38.0);
}

#[test]
fn failed_read_keeps_last_value_and_baseline() {
    let runtime = ScriptedRuntime::new(vec![
        Some(RuntimeCounters {
            gc_cycles: 5,
            heap_alloc: 100,
            ..Default::default()
        }),
        None,
        Some(RuntimeCounters {
            gc_cycles: 9,
            heap_alloc: 300,
            ..Default::default()
        }),
    ]);
    let resources = FixedResources::new(ResourceUsage {
        voluntary_switches: 1,
        ..Default::default()
    });
    let (registry, mut sampler, notifier) = install(runtime, Arc::clone(&resources));

    sampler.sample();
    assert_eq!(registry.values()[names::GC_RUNS], 5.0);

    // runtime read fails, rusage still sampled
    resources.usage.lock().unwrap().voluntary_switches = 8;
    sampler.sample();
    let v = registry.values();
    assert_eq!(v[names::GC_RUNS], 5.0);
    assert_eq!(v[names::HEAP_ALLOC], 100.0);
    assert_eq!(v[names::VOLUNTARY_SWITCHES], 8.0);
    assert_eq!(notifier.codes(), vec!["SAMPLING"]);

    // baseline was not advanced by the failed read
    sampler.sample();
    let v = registry.values();
    assert_eq!(v[names::GC_RUNS], 4.0);
    assert_eq!(v[names::HEAP_ALLOC], 300.0);
}

#[test]
fn resource_failure_is_reported_and_tick_completes() {
    let resources = FixedResources::new(ResourceUsage {
        hard_page_faults: 6,
        ..Default::default()
    });
    let (registry, mut sampler, notifier) =
        install(ScriptedRuntime::gc_only(&[1, 4]), Arc::clone(&resources));

    sampler.sample();
    resources.fail.store(true, Ordering::SeqCst);
    sampler.sample();

    let v = registry.values();
    assert_eq!(v[names::HARD_PAGE_FAULTS], 6.0);
    assert_eq!(v[names::GC_RUNS], 3.0);
    assert_eq!(notifier.codes(), vec!["SAMPLING"]);
}

#[test]
fn probes_are_evaluated_at_read_time() {
    let runtime = ScriptedRuntime::new(Vec::new());
    runtime.foreign.store(10, Ordering::SeqCst);
    let (registry, _sampler, _) = install(
        Arc::clone(&runtime),
        FixedResources::new(ResourceUsage::default()),
    );

    runtime.tasks.store(12, Ordering::SeqCst);
    runtime.foreign.store(25, Ordering::SeqCst);
    let v = registry.values();
    assert_eq!(v[names::TASKS], 12.0);
    // baseline taken at install time
    assert_eq!(v[names::FOREIGN_CALLS], 15.0);

    runtime.tasks.store(3, Ordering::SeqCst);
    let v = registry.values();
    assert_eq!(v[names::TASKS], 3.0);
    // plain reads leave the rate baseline alone
    assert_eq!(v[names::FOREIGN_CALLS], 15.0);

    let r = registry.commit_readings();
    assert_eq!(r[names::FOREIGN_CALLS].value, 15.0);
    assert_eq!(registry.values()[names::FOREIGN_CALLS], 0.0);

    let tasks = registry.get(names::TASKS).unwrap();
    assert!(tasks.set(1.0).is_err());
}

#[test]
fn installs_every_internal_metric() {
    let (registry, _, _) = install(
        ScriptedRuntime::new(Vec::new()),
        FixedResources::new(ResourceUsage::default()),
    );
    assert_eq!(registry.len(), 11);
    for name in [
        names::GC_RUNS,
        names::MALLOCS,
        names::FREES,
        names::HEAP_ALLOC,
        names::PAUSE,
        names::VOLUNTARY_SWITCHES,
        names::INVOLUNTARY_SWITCHES,
        names::SOFT_PAGE_FAULTS,
        names::HARD_PAGE_FAULTS,
        names::TASKS,
        names::FOREIGN_CALLS,
    ] {
        assert!(registry.get(name).is_some(), "missing {name}");
    }
}
