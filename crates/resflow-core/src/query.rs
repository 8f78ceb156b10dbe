//! Read-only snapshots of simulation state.
//!
//! All types are owned copies taken under the same locks the mutators use,
//! so they are safe to build while system threads are running.

use crate::id::{ResourceId, SystemId};
use crate::system::SystemStatus;

/// A copy of one resource's level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub id: ResourceId,
    pub name: String,
    pub amount: u32,
    pub max_capacity: u32,
}

/// A copy of one system's externally visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSnapshot {
    pub id: SystemId,
    pub name: String,
    pub status: SystemStatus,
    /// Production waiting for room in the output resource.
    pub amount_stored: u32,
}

/// Everything a display needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimSnapshot {
    pub resources: Vec<ResourceSnapshot>,
    pub systems: Vec<SystemSnapshot>,
    pub running: bool,
}

impl SimSnapshot {
    pub fn resource(&self, name: &str) -> Option<&ResourceSnapshot> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn system(&self, name: &str) -> Option<&SystemSnapshot> {
        self.systems.iter().find(|s| s.name == name)
    }
}
