//! Setup and orchestration errors.
//!
//! Contention outcomes (empty, insufficient, capacity, low) are not errors and
//! never appear here; they travel as [`crate::event::EventStatus`] values.

/// Which configuration field referenced a resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRole {
    Critical,
    Goal,
}

impl std::fmt::Display for ResourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceRole::Critical => write!(f, "critical"),
            ResourceRole::Goal => write!(f, "goal"),
        }
    }
}

/// Errors raised while building or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Initial amount exceeds the resource's capacity.
    #[error("resource '{name}' starts at {amount} but holds at most {max_capacity}")]
    InvalidResource {
        name: String,
        amount: u32,
        max_capacity: u32,
    },

    /// A resource with this name is already registered.
    #[error("duplicate resource '{name}'")]
    DuplicateResource { name: String },

    /// A system with this name is already registered.
    #[error("duplicate system '{name}'")]
    DuplicateSystem { name: String },

    /// The configuration names a resource that was never registered.
    #[error("{role} resource '{name}' is not registered")]
    UnknownResource { name: String, role: ResourceRole },

    /// `run` was already called on this manager.
    #[error("simulation has already run")]
    AlreadyRan,

    /// The OS refused to start a system thread.
    #[error("failed to spawn thread for system '{system}': {source}")]
    ThreadSpawn {
        system: String,
        source: std::io::Error,
    },

    /// A system thread panicked before it could be joined cleanly.
    #[error("system '{system}' panicked")]
    SystemPanicked { system: String },
}
