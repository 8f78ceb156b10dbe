//! Scenario files: the resources, systems and policy of one simulation.

use resflow_core::config::SimConfig;
use resflow_core::manager::Manager;
use resflow_core::resource::ResourceAmount;
use serde::Deserialize;

use crate::error::ScenarioError;

/// The built-in flight scenario.
pub const FLIGHT_SCENARIO: &str = include_str!("../scenarios/flight.ron");

/// Top-level scenario definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub resources: Vec<ResourceData>,
    pub systems: Vec<SystemData>,
    #[serde(default)]
    pub simulation: SimConfig,
}

/// A resource and its starting level.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub name: String,
    pub amount: u32,
    pub max_capacity: u32,
}

/// A system. Absent `consumes`/`produces` means it takes or makes nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemData {
    pub name: String,
    #[serde(default)]
    pub consumes: Option<AmountData>,
    #[serde(default)]
    pub produces: Option<AmountData>,
    pub processing_time_ms: u64,
}

/// A per-cycle rate against a named resource.
#[derive(Debug, Clone, Deserialize)]
pub struct AmountData {
    pub resource: String,
    pub amount: u32,
}

/// Parse a scenario from RON text.
pub fn load_scenario(text: &str) -> Result<ScenarioData, ScenarioError> {
    ron::from_str(text).map_err(|e| ScenarioError::Parse {
        detail: e.to_string(),
    })
}

/// Create a manager holding every resource and system in `data`.
pub fn build_manager(data: &ScenarioData) -> Result<Manager, ScenarioError> {
    let mut manager = Manager::new(data.simulation.clone());

    for r in &data.resources {
        manager.create_resource(&r.name, r.amount, r.max_capacity)?;
    }

    for s in &data.systems {
        let consumed = resolve(&manager, &s.name, s.consumes.as_ref())?;
        let produced = resolve(&manager, &s.name, s.produces.as_ref())?;
        manager.create_system(&s.name, consumed, produced, s.processing_time_ms)?;
    }

    log::info!(
        "scenario '{}' loaded: {} resources, {} systems",
        data.title,
        manager.resource_count(),
        manager.system_count()
    );
    Ok(manager)
}

fn resolve(
    manager: &Manager,
    system: &str,
    amount: Option<&AmountData>,
) -> Result<ResourceAmount, ScenarioError> {
    let Some(amount) = amount else {
        return Ok(ResourceAmount::none());
    };
    let resource = manager
        .resource_by_name(&amount.resource)
        .ok_or_else(|| ScenarioError::UnresolvedRef {
            system: system.to_string(),
            resource: amount.resource.clone(),
        })?;
    Ok(ResourceAmount::of(resource, amount.amount))
}
