//! Allocation accounting.
//!
//! `CountingAllocator` wraps the system allocator and bumps process-wide
//! counters. The host opts in with:
//!
//! ```ignore
//! use vitals_agent::runtime::CountingAllocator;
//!
//! #[global_allocator]
//! static ALLOC: CountingAllocator = CountingAllocator;
//! ```
//!
//! Without it the allocation counters stay at zero. Collection cycles and
//! foreign calls have no native source in Rust; hosts that have them feed
//! `RuntimeStats::record_collection` / `RuntimeStats::record_foreign_call`.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static MALLOCS: AtomicU64 = AtomicU64::new(0);
static FREES: AtomicU64 = AtomicU64::new(0);
static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static COLLECTIONS: AtomicU64 = AtomicU64::new(0);
static PAUSE_NS: AtomicU64 = AtomicU64::new(0);
static FOREIGN_CALLS: AtomicU64 = AtomicU64::new(0);

pub struct CountingAllocator;

// SAFETY: every call is forwarded to `System` unchanged; only counters are
// touched on the side, and they never allocate.
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            MALLOCS.fetch_add(1, Ordering::Relaxed);
            LIVE_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            MALLOCS.fetch_add(1, Ordering::Relaxed);
            LIVE_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        FREES.fetch_add(1, Ordering::Relaxed);
        LIVE_BYTES.fetch_sub(layout.size() as u64, Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            let old = layout.size() as u64;
            let new = new_size as u64;
            if new >= old {
                LIVE_BYTES.fetch_add(new - old, Ordering::Relaxed);
            } else {
                LIVE_BYTES.fetch_sub(old - new, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

/// Read/feed access to the process-wide runtime counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeStats;

impl RuntimeStats {
    pub fn mallocs() -> u64 {
        MALLOCS.load(Ordering::Relaxed)
    }

    pub fn frees() -> u64 {
        FREES.load(Ordering::Relaxed)
    }

    pub fn live_bytes() -> u64 {
        LIVE_BYTES.load(Ordering::Relaxed)
    }

    pub fn collections() -> u64 {
        COLLECTIONS.load(Ordering::Relaxed)
    }

    pub fn pause_total_ns() -> u64 {
        PAUSE_NS.load(Ordering::Relaxed)
    }

    pub fn foreign_calls() -> u64 {
        FOREIGN_CALLS.load(Ordering::Relaxed)
    }

    /// One finished collection cycle that paused the host for `pause`.
    pub fn record_collection(pause: Duration) {
        COLLECTIONS.fetch_add(1, Ordering::Relaxed);
        PAUSE_NS.fetch_add(pause.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_foreign_call() {
        FOREIGN_CALLS.fetch_add(1, Ordering::Relaxed);
    }
}
