//! Process-global atomic counters and derived-rate snapshots.
//!
//! Grounded in `metrics.c`/`metrics.h`: every counter is a relaxed
//! `AtomicU64`, `queue_high_water` is maintained via a compare-and-swap
//! retry loop so it reflects the true historical maximum, and
//! `snapshot()`/`log_summary()` guard every derived rate against a
//! zero denominator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct Metrics {
    events_total: AtomicU64,
    events_p1: AtomicU64,
    events_p2: AtomicU64,
    events_dropped: AtomicU64,

    queue_pushes: AtomicU64,
    queue_pops: AtomicU64,
    queue_high_water: AtomicU64,
    queue_overflows: AtomicU64,

    db_inserts_success: AtomicU64,
    db_inserts_failed: AtomicU64,
    db_batches: AtomicU64,
    db_reconnects: AtomicU64,

    total_event_latency_us: AtomicU64,
    total_db_latency_us: AtomicU64,

    start_time: std::sync::OnceLock<Instant>,
}

#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub events_total: u64,
    pub events_p1: u64,
    pub events_p2: u64,
    pub events_dropped: u64,
    pub queue_pushes: u64,
    pub queue_pops: u64,
    pub queue_high_water: u64,
    pub queue_overflows: u64,
    pub db_inserts_success: u64,
    pub db_inserts_failed: u64,
    pub db_batches: u64,
    pub db_reconnects: u64,
    pub uptime_secs: f64,
    pub events_per_second: f64,
    pub avg_event_latency_us: f64,
    pub avg_db_latency_us: f64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            events_p1: AtomicU64::new(0),
            events_p2: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            queue_pushes: AtomicU64::new(0),
            queue_pops: AtomicU64::new(0),
            queue_high_water: AtomicU64::new(0),
            queue_overflows: AtomicU64::new(0),
            db_inserts_success: AtomicU64::new(0),
            db_inserts_failed: AtomicU64::new(0),
            db_batches: AtomicU64::new(0),
            db_reconnects: AtomicU64::new(0),
            total_event_latency_us: AtomicU64::new(0),
            total_db_latency_us: AtomicU64::new(0),
            start_time: std::sync::OnceLock::new(),
        }
    }

    /// Marks the process start time. Idempotent; only the first call counts.
    pub fn init(&self) {
        let _ = self.start_time.set(Instant::now());
    }

    pub fn inc_events_total(&self) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_p1(&self) {
        self.events_p1.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_p2(&self) {
        self.events_p2.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_queue_pushes(&self) {
        self.queue_pushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_queue_pops(&self) {
        self.queue_pops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_queue_overflows(&self) {
        self.queue_overflows.fetch_add(1, Ordering::Relaxed);
    }

    /// CAS-retry loop: only ever raises the high-water mark, never lowers it.
    pub fn update_queue_high_water(&self, observed: u64) {
        let mut current = self.queue_high_water.load(Ordering::Relaxed);
        while observed > current {
            match self.queue_high_water.compare_exchange_weak(
                current,
                observed,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn inc_db_inserts_success_by(&self, n: u64) {
        self.db_inserts_success.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_db_inserts_failed(&self) {
        self.db_inserts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_db_batches(&self) {
        self.db_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_db_reconnects(&self) {
        self.db_reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_event_latency_us(&self, us: u64) {
        self.total_event_latency_us.fetch_add(us, Ordering::Relaxed);
    }

    pub fn add_db_latency_us(&self, us: u64) {
        self.total_db_latency_us.fetch_add(us, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Snapshot {
        let uptime_secs = self
            .start_time
            .get()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        let events_total = self.events_total.load(Ordering::Relaxed);
        let db_inserts_success = self.db_inserts_success.load(Ordering::Relaxed);
        let total_event_latency_us = self.total_event_latency_us.load(Ordering::Relaxed);
        let total_db_latency_us = self.total_db_latency_us.load(Ordering::Relaxed);

        let events_per_second = if uptime_secs > 0.0 {
            events_total as f64 / uptime_secs
        } else {
            0.0
        };
        let avg_event_latency_us = if events_total > 0 {
            total_event_latency_us as f64 / events_total as f64
        } else {
            0.0
        };
        let avg_db_latency_us = if db_inserts_success > 0 {
            total_db_latency_us as f64 / db_inserts_success as f64
        } else {
            0.0
        };

        Snapshot {
            events_total,
            events_p1: self.events_p1.load(Ordering::Relaxed),
            events_p2: self.events_p2.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            queue_pushes: self.queue_pushes.load(Ordering::Relaxed),
            queue_pops: self.queue_pops.load(Ordering::Relaxed),
            queue_high_water: self.queue_high_water.load(Ordering::Relaxed),
            queue_overflows: self.queue_overflows.load(Ordering::Relaxed),
            db_inserts_success,
            db_inserts_failed: self.db_inserts_failed.load(Ordering::Relaxed),
            db_batches: self.db_batches.load(Ordering::Relaxed),
            db_reconnects: self.db_reconnects.load(Ordering::Relaxed),
            uptime_secs,
            events_per_second,
            avg_event_latency_us,
            avg_db_latency_us,
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        tracing::info!(
            uptime_secs = s.uptime_secs,
            events_total = s.events_total,
            events_p1 = s.events_p1,
            events_p2 = s.events_p2,
            events_dropped = s.events_dropped,
            events_per_second = s.events_per_second,
            queue_high_water = s.queue_high_water,
            db_batches = s.db_batches,
            db_inserts_success = s.db_inserts_success,
            db_inserts_failed = s.db_inserts_failed,
            avg_event_latency_us = s.avg_event_latency_us,
            avg_db_latency_us = s.avg_db_latency_us,
            "metrics summary"
        );
    }
}

/// Process-wide metrics singleton.
pub static METRICS: Metrics = Metrics::new();
