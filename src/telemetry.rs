//! Run-scoped telemetry.
//!
//! A `TelemetryAggregator` is created per run and injected through every call
//! site; there is no module-level shared state. Counters are guarded by a
//! mutex so concurrently-settling pipelines can update them safely.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Snapshot of run counters and timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryState {
    pub total_items: usize,
    /// Items that have settled (fixed or failed).
    pub processed: usize,
    pub fixed: usize,
    pub failed: usize,
    pub queued: usize,
    pub start_time: DateTime<Utc>,
    /// Cumulative mean over all settled items.
    pub avg_processing_time_ms: f64,
    /// Computed once at run end; zero until then.
    pub items_per_second: f64,
}

struct Inner {
    state: TelemetryState,
    total_processing_ms: f64,
}

/// Shared counters updated exactly once per item.
pub struct TelemetryAggregator {
    inner: Mutex<Inner>,
    started: Instant,
}

impl TelemetryAggregator {
    pub fn new(total_items: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: TelemetryState {
                    total_items,
                    processed: 0,
                    fixed: 0,
                    failed: 0,
                    queued: total_items,
                    start_time: Utc::now(),
                    avg_processing_time_ms: 0.0,
                    items_per_second: 0.0,
                },
                total_processing_ms: 0.0,
            }),
            started: Instant::now(),
        }
    }

    pub fn record_success(&self, processing_time_ms: u64) {
        let mut inner = self.inner.lock();
        inner.state.fixed += 1;
        Self::settle(&mut inner, processing_time_ms);
    }

    pub fn record_failure(&self, processing_time_ms: u64) {
        let mut inner = self.inner.lock();
        inner.state.failed += 1;
        Self::settle(&mut inner, processing_time_ms);
    }

    fn settle(inner: &mut Inner, processing_time_ms: u64) {
        inner.state.processed += 1;
        inner.state.queued = inner.state.queued.saturating_sub(1);
        inner.total_processing_ms += processing_time_ms as f64;
        inner.state.avg_processing_time_ms =
            inner.total_processing_ms / inner.state.processed as f64;
    }

    pub fn snapshot(&self) -> TelemetryState {
        self.inner.lock().state.clone()
    }

    /// Compute end-of-run throughput and return the final state.
    pub fn finish(&self) -> TelemetryState {
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut inner = self.inner.lock();
        inner.state.items_per_second = if elapsed > 0.0 {
            inner.state.total_items as f64 / elapsed
        } else {
            0.0
        };
        inner.state.clone()
    }
}
