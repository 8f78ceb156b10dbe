//! Flight demo for the Resflow engine.
//!
//! Loads a scenario from RON, builds a [`resflow_core::manager::Manager`]
//! from it, and renders snapshots to the console while the run proceeds.

pub mod display;
pub mod error;
pub mod scenario;

pub use error::ScenarioError;
pub use scenario::{FLIGHT_SCENARIO, ScenarioData, build_manager, load_scenario};
