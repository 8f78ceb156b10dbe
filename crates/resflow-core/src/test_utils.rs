//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::sync::Arc;

use crate::config::SimConfig;
use crate::event::{Event, EventStatus, Priority};
use crate::id::{ResourceId, SystemId};
use crate::manager::Manager;
use crate::resource::{Resource, ResourceAmount};

/// A config with short timings so runs finish in milliseconds.
pub fn fast_config() -> SimConfig {
    SimConfig {
        manager_interval_ms: 5,
        system_backoff_ms: 1,
        ..SimConfig::default()
    }
}

/// Add a resource and return a shared handle to it.
pub fn add_resource(manager: &mut Manager, name: &str, amount: u32, max: u32) -> Arc<Resource> {
    let id = manager
        .create_resource(name, amount, max)
        .expect("resource should be valid");
    Arc::clone(manager.resource(id).expect("just inserted"))
}

/// Add a system consuming `input` and producing `output`, `None` meaning nothing.
pub fn add_system(
    manager: &mut Manager,
    name: &str,
    input: Option<(&Arc<Resource>, u32)>,
    output: Option<(&Arc<Resource>, u32)>,
    processing_time_ms: u64,
) -> SystemId {
    let consumed = input.map_or_else(ResourceAmount::none, |(r, n)| ResourceAmount::of(r, n));
    let produced = output.map_or_else(ResourceAmount::none, |(r, n)| ResourceAmount::of(r, n));
    manager
        .create_system(name, consumed, produced, processing_time_ms)
        .expect("system should be valid")
}

/// A free-standing resource not owned by any manager.
pub fn loose_resource(name: &str, amount: u32, max: u32) -> Arc<Resource> {
    Arc::new(Resource::new(ResourceId::default(), name, amount, max).expect("valid resource"))
}

/// An event with the given priority; `amount` doubles as a tag for ordering tests.
pub fn tagged_event(priority: Priority, amount: u32) -> Event {
    Event {
        system: SystemId::default(),
        system_name: Arc::from("Test"),
        resource: ResourceId::default(),
        resource_name: Arc::from("Test"),
        status: EventStatus::Insufficient,
        priority,
        amount,
    }
}

/// Map a small integer onto a priority level.
pub fn priority_from(n: u8) -> Priority {
    match n % 3 {
        0 => Priority::Low,
        1 => Priority::Medium,
        _ => Priority::High,
    }
}
