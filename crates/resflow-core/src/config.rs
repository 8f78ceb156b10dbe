//! Simulation tuning loaded alongside a scenario.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Global policy and timing for a [`crate::manager::Manager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Upper bound on the manager's wait between drain-and-render cycles.
    #[serde(default = "default_manager_interval_ms")]
    pub manager_interval_ms: u64,
    /// Back-off a system sleeps after a failed consume or store.
    #[serde(default = "default_system_backoff_ms")]
    pub system_backoff_ms: u64,
    /// Resources whose depletion ends the simulation.
    #[serde(default)]
    pub critical_resources: Vec<String>,
    /// Resource whose reaching capacity ends the simulation.
    #[serde(default)]
    pub goal_resource: Option<String>,
    /// Emit a low-availability event when a consume leaves the input below
    /// this percentage of its capacity. Disabled when absent.
    #[serde(default)]
    pub low_watermark_percent: Option<u8>,
    /// Stop after this many manager cycles even if nothing critical happened.
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

fn default_manager_interval_ms() -> u64 {
    100
}

fn default_system_backoff_ms() -> u64 {
    50
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            manager_interval_ms: default_manager_interval_ms(),
            system_backoff_ms: default_system_backoff_ms(),
            critical_resources: Vec::new(),
            goal_resource: None,
            low_watermark_percent: None,
            max_cycles: None,
        }
    }
}

impl SimConfig {
    pub fn manager_interval(&self) -> Duration {
        Duration::from_millis(self.manager_interval_ms)
    }

    /// Timing handed to every system created under this config.
    pub fn system_timing(&self) -> SystemTiming {
        SystemTiming {
            backoff: Duration::from_millis(self.system_backoff_ms),
            low_watermark_percent: self.low_watermark_percent.map(|p| p.min(100)),
        }
    }

    pub fn is_critical(&self, resource_name: &str) -> bool {
        self.critical_resources.iter().any(|n| n == resource_name)
    }

    pub fn is_goal(&self, resource_name: &str) -> bool {
        self.goal_resource.as_deref() == Some(resource_name)
    }
}

/// Per-system timing derived from [`SimConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemTiming {
    pub backoff: Duration,
    pub low_watermark_percent: Option<u8>,
}

impl Default for SystemTiming {
    fn default() -> Self {
        SimConfig::default().system_timing()
    }
}
