//! Resflow Core -- a concurrent resource-exchange engine.
//!
//! A set of autonomous [`system::System`]s each run on their own thread,
//! taking units out of one [`resource::Resource`] and putting units into
//! another. Every non-nominal outcome is pushed onto a shared priority
//! [`event::EventQueue`]; a single [`manager::Manager`] drains it, retunes
//! system speeds, and stops everything when a critical resource runs dry or
//! the goal resource fills up.
//!
//! # Cycle
//!
//! Each system repeats, until told to terminate:
//!
//! 1. **Convert** -- if nothing is buffered, consume one cycle of input and
//!    sleep for the processing time scaled by the current status.
//! 2. **Store** -- move buffered output into the produced resource, keeping
//!    whatever does not fit for the next cycle.
//!
//! # Usage
//!
//! ```rust,no_run
//! use resflow_core::config::SimConfig;
//! use resflow_core::manager::Manager;
//! use resflow_core::resource::ResourceAmount;
//!
//! let mut manager = Manager::new(SimConfig {
//!     critical_resources: vec!["Oxygen".into()],
//!     ..SimConfig::default()
//! });
//! let oxygen = manager.create_resource("Oxygen", 20, 50)?;
//! let oxygen = manager.resource(oxygen).cloned().unwrap();
//! manager.create_system("Crew", ResourceAmount::of(&oxygen, 1), ResourceAmount::none(), 2)?;
//! let report = manager.run(|snapshot| println!("{snapshot:?}"))?;
//! println!("{}", report.reason);
//! # Ok::<(), resflow_core::error::SimError>(())
//! ```
//!
//! # Key Types
//!
//! - [`manager::Manager`] -- owns everything and drives the run loop.
//! - [`system::System`] -- the per-thread convert/store state machine.
//! - [`resource::Resource`] -- a mutex-guarded, capacity-bounded quantity.
//! - [`event::EventQueue`] -- priority-major, FIFO-minor mailbox.
//! - [`query::SimSnapshot`] -- owned copies of state for display code.

pub mod config;
pub mod error;
pub mod event;
pub mod id;
pub mod manager;
pub mod query;
pub mod resource;
pub mod system;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
