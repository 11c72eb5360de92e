use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub backends_launched: u64,
    pub backends_completed: u64,
    pub backends_succeeded: u64,
    pub backends_failed: u64,
    pub active_backends: u64,
    pub success_rate: f64,
    pub avg_backend_time_ms: u64,
    pub elapsed_seconds: f64,
}
