//! Orchestrator timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for the orchestration waits.
///
/// Defaults match real hardware; tests shrink them to keep polling fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Interval between job-info polls while waiting for the ready state
    /// (milliseconds).
    #[serde(default = "default_ready_poll_interval")]
    pub ready_poll_interval_ms: u64,

    /// Settle delay after preview and before start transitions
    /// (milliseconds).
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

fn default_ready_poll_interval() -> u64 {
    2000 // 2 seconds
}

fn default_settle_delay() -> u64 {
    2500 // 2.5 seconds
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ready_poll_interval_ms: default_ready_poll_interval(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl OrchestratorConfig {
    /// Ready-poll interval as a duration.
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    /// Settle delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
