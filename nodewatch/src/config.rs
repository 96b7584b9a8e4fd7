//! Poll cadence and display tunables.
//!
//! Defaults match what the backend is built around: nodes heartbeat every few
//! seconds, the server samples history every 2s and the dashboard polls every
//! 3s. Nothing here assumes the poll interval equals the history cadence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::status::ONLINE_THRESHOLD_SECONDS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub grid_ms: u64,
    pub agent_ms: u64,
    pub detail_ms: u64,
    pub logs_ms: u64,
    pub online_threshold_secs: f64,
    pub history_cadence_secs: u64,
    pub label_every: usize,
    pub history_cap: usize,
    pub request_timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            grid_ms: 3000,
            agent_ms: 3000,
            detail_ms: 3000,
            logs_ms: 5000,
            online_threshold_secs: ONLINE_THRESHOLD_SECONDS,
            history_cadence_secs: 2,
            label_every: 10,
            history_cap: 300,
            request_timeout_ms: 5000,
        }
    }
}

impl PollConfig {
    pub fn grid_interval(&self) -> Duration {
        Duration::from_millis(self.grid_ms.max(100))
    }

    pub fn agent_interval(&self) -> Duration {
        Duration::from_millis(self.agent_ms.max(100))
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_millis(self.detail_ms.max(100))
    }

    pub fn logs_interval(&self) -> Duration {
        Duration::from_millis(self.logs_ms.max(100))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(100))
    }

    /// Apply `NODEWATCH_POLL_MS` and `NODEWATCH_ONLINE_THRESHOLD` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|k| std::env::var(k).ok())
    }

    pub fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(ms) = lookup("NODEWATCH_POLL_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            self.grid_ms = ms;
            self.agent_ms = ms;
            self.detail_ms = ms;
        }
        if let Some(secs) = lookup("NODEWATCH_ONLINE_THRESHOLD")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
        {
            self.online_threshold_secs = secs;
        }
        self
    }
}
