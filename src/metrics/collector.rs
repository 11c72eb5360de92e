use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Live counters for a benchmark run, shared between backend futures and
/// whoever displays progress.
#[derive(Clone)]
pub struct MetricsCollector {
    backends_launched: Arc<AtomicU64>,
    backends_completed: Arc<AtomicU64>,
    backends_succeeded: Arc<AtomicU64>,
    backends_failed: Arc<AtomicU64>,
    active_backends: Arc<AtomicU64>,
    total_backend_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            backends_launched: Arc::new(AtomicU64::new(0)),
            backends_completed: Arc::new(AtomicU64::new(0)),
            backends_succeeded: Arc::new(AtomicU64::new(0)),
            backends_failed: Arc::new(AtomicU64::new(0)),
            active_backends: Arc::new(AtomicU64::new(0)),
            total_backend_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend_started(&self) {
        self.backends_launched.fetch_add(1, Ordering::SeqCst);
        self.active_backends.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_success(&self, duration: Duration) {
        self.backends_succeeded.fetch_add(1, Ordering::SeqCst);
        self.backend_finished(duration);
    }

    pub fn record_failure(&self, duration: Duration) {
        self.backends_failed.fetch_add(1, Ordering::SeqCst);
        self.backend_finished(duration);
    }

    fn backend_finished(&self, duration: Duration) {
        self.total_backend_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        self.backends_completed.fetch_add(1, Ordering::SeqCst);
        self.active_backends.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let completed = self.backends_completed.load(Ordering::SeqCst);
        let succeeded = self.backends_succeeded.load(Ordering::SeqCst);
        let total_time = self.total_backend_time_ms.load(Ordering::SeqCst);

        let success_rate = if completed > 0 {
            (succeeded as f64 / completed as f64) * 100.0
        } else {
            0.0
        };

        let avg_backend_time_ms = if completed > 0 {
            total_time / completed
        } else {
            0
        };

        MetricsSnapshot {
            backends_launched: self.backends_launched.load(Ordering::SeqCst),
            backends_completed: completed,
            backends_succeeded: succeeded,
            backends_failed: self.backends_failed.load(Ordering::SeqCst),
            active_backends: self.active_backends.load(Ordering::SeqCst),
            success_rate,
            avg_backend_time_ms,
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}
