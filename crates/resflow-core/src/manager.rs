//! Orchestration: owns every resource, system and the event queue.
//!
//! [`Manager::run`] starts one thread per system, then loops on the calling
//! thread: drain queued events in priority order, apply global policy,
//! publish a snapshot, and wait for the next event or the manager interval.
//! Termination is cooperative. The manager marks every system
//! [`SystemStatus::Terminate`] and joins its thread once the in-flight cycle
//! returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use slotmap::SlotMap;

use crate::config::SimConfig;
use crate::error::{ResourceRole, SimError};
use crate::event::{Event, EventQueue, EventStatus};
use crate::id::{ResourceId, SystemId};
use crate::query::SimSnapshot;
use crate::resource::{Resource, ResourceAmount};
use crate::system::{System, SystemStatus};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// A critical resource reported empty.
    CriticalDepleted { resource: String },
    /// The goal resource reported it was at capacity.
    GoalReached { resource: String },
    /// `max_cycles` manager cycles elapsed.
    CycleLimit,
    /// There was nothing to run.
    NoSystems,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::CriticalDepleted { resource } => {
                write!(f, "critical resource '{resource}' depleted")
            }
            TerminationReason::GoalReached { resource } => {
                write!(f, "goal resource '{resource}' reached capacity")
            }
            TerminationReason::CycleLimit => write!(f, "cycle limit reached"),
            TerminationReason::NoSystems => write!(f, "no systems registered"),
        }
    }
}

/// Result of one non-blocking drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub processed: usize,
    pub termination: Option<TerminationReason>,
}

/// Summary returned by [`Manager::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Drain-and-render cycles executed by the manager.
    pub cycles: u64,
    pub events_processed: u64,
    /// Cycles completed across all system threads.
    pub system_cycles: u64,
    pub reason: TerminationReason,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// The simulation context. Built once, populated, then run once.
#[derive(Debug)]
pub struct Manager {
    config: SimConfig,
    resources: SlotMap<ResourceId, Arc<Resource>>,
    systems: SlotMap<SystemId, Arc<System>>,
    events: Arc<EventQueue>,
    running: AtomicBool,
    termination: Option<TerminationReason>,
    events_processed: u64,
    has_run: bool,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Manager {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            resources: SlotMap::with_key(),
            systems: SlotMap::with_key(),
            events: Arc::new(EventQueue::new()),
            running: AtomicBool::new(true),
            termination: None,
            events_processed: 0,
            has_run: false,
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Register a new resource. Names must be unique.
    pub fn create_resource(
        &mut self,
        name: &str,
        initial_amount: u32,
        max_capacity: u32,
    ) -> Result<ResourceId, SimError> {
        if self.resource_by_name(name).is_some() {
            return Err(SimError::DuplicateResource {
                name: name.to_string(),
            });
        }
        self.resources.try_insert_with_key(|id| {
            Resource::new(id, name, initial_amount, max_capacity).map(Arc::new)
        })
    }

    /// Register a new system wired to the shared event queue.
    pub fn create_system(
        &mut self,
        name: &str,
        consumed: ResourceAmount,
        produced: ResourceAmount,
        processing_time_ms: u64,
    ) -> Result<SystemId, SimError> {
        if self.system_by_name(name).is_some() {
            return Err(SimError::DuplicateSystem {
                name: name.to_string(),
            });
        }
        let timing = self.config.system_timing();
        let events = Arc::clone(&self.events);
        Ok(self.systems.insert_with_key(|id| {
            Arc::new(System::new(
                id,
                name,
                consumed,
                produced,
                Duration::from_millis(processing_time_ms),
                timing,
                events,
            ))
        }))
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Arc<Resource>> {
        self.resources.get(id)
    }

    pub fn resource_by_name(&self, name: &str) -> Option<&Arc<Resource>> {
        self.resources.values().find(|r| r.name() == name)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.values()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn resource_capacity(&self) -> usize {
        self.resources.capacity()
    }

    pub fn system(&self, id: SystemId) -> Option<&Arc<System>> {
        self.systems.get(id)
    }

    pub fn system_by_name(&self, name: &str) -> Option<&Arc<System>> {
        self.systems.values().find(|s| s.name() == name)
    }

    pub fn systems(&self) -> impl Iterator<Item = &Arc<System>> {
        self.systems.values()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn system_capacity(&self) -> usize {
        self.systems.capacity()
    }

    pub fn event_queue(&self) -> &Arc<EventQueue> {
        &self.events
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The first termination trigger seen, if any.
    pub fn termination(&self) -> Option<&TerminationReason> {
        self.termination.as_ref()
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Copy every resource level and system status.
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            resources: self.resources.values().map(|r| r.snapshot()).collect(),
            systems: self.systems.values().map(|s| s.snapshot()).collect(),
            running: self.is_running(),
        }
    }

    // -----------------------------------------------------------------------
    // Policy
    // -----------------------------------------------------------------------

    /// Stop the run and order every system to terminate.
    pub fn terminate_all(&self) {
        self.running.store(false, Ordering::Release);
        for system in self.systems.values() {
            system.set_status(SystemStatus::Terminate);
        }
    }

    /// Apply global policy to one event.
    ///
    /// An empty critical resource or a full goal resource ends the run.
    /// Any other event retunes the producers of the event's resource:
    /// shortages speed them up, capacity overflows slow them down.
    pub fn handle_event(&mut self, event: &Event) -> Option<TerminationReason> {
        log::debug!(
            "event: [{}] resource [{}] status [{}] priority [{:?}] amount [{}]",
            event.system_name,
            event.resource_name,
            event.status,
            event.priority,
            event.amount
        );
        self.events_processed += 1;

        let reason = match event.status {
            EventStatus::Empty if self.config.is_critical(&event.resource_name) => {
                Some(TerminationReason::CriticalDepleted {
                    resource: event.resource_name.to_string(),
                })
            }
            EventStatus::Capacity if self.config.is_goal(&event.resource_name) => {
                Some(TerminationReason::GoalReached {
                    resource: event.resource_name.to_string(),
                })
            }
            _ => None,
        };

        if let Some(reason) = reason {
            if self.termination.is_none() {
                log::info!("{reason}; terminating simulation");
                self.termination = Some(reason.clone());
            }
            self.terminate_all();
            return Some(reason);
        }

        let target = if event.status.is_shortage() {
            SystemStatus::Fast
        } else {
            SystemStatus::Slow
        };
        for system in self.systems.values().filter(|s| s.produces(event.resource)) {
            if let Some(previous) = system.adjust_status(target) {
                log::info!(
                    "system '{}' {previous} -> {target} ({} on '{}')",
                    system.name(),
                    event.status,
                    event.resource_name
                );
            }
        }
        None
    }

    /// Pop and handle everything currently queued. Never blocks.
    pub fn drain_events(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(event) = self.events.pop() {
            report.processed += 1;
            if let Some(reason) = self.handle_event(&event) {
                report.termination.get_or_insert(reason);
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // Run loop
    // -----------------------------------------------------------------------

    /// Run the simulation to completion, calling `observer` with a snapshot
    /// after every drain and once more after all threads have joined.
    pub fn run<F>(&mut self, mut observer: F) -> Result<RunReport, SimError>
    where
        F: FnMut(&SimSnapshot),
    {
        if self.has_run {
            return Err(SimError::AlreadyRan);
        }
        self.validate_config()?;
        self.has_run = true;

        if self.systems.is_empty() {
            log::warn!("no systems registered; nothing to run");
            self.termination = Some(TerminationReason::NoSystems);
            self.terminate_all();
        }

        let handles = self.spawn_systems()?;
        let interval = self.config.manager_interval();
        let mut cycles = 0u64;

        while self.is_running() {
            self.drain_events();
            observer(&self.snapshot());
            cycles += 1;

            if let Some(limit) = self.config.max_cycles
                && cycles >= limit
                && self.is_running()
            {
                log::info!("cycle limit {limit} reached; terminating simulation");
                self.termination.get_or_insert(TerminationReason::CycleLimit);
                self.terminate_all();
                break;
            }

            if self.is_running() {
                self.events.wait_timeout(interval);
            }
        }

        self.terminate_all();
        let system_cycles = join_systems(handles)?;
        observer(&self.snapshot());

        let reason = self
            .termination
            .clone()
            .unwrap_or(TerminationReason::CycleLimit);
        log::info!(
            "simulation finished after {cycles} cycles ({} events, {} left queued): {reason}",
            self.events_processed,
            self.events.len()
        );

        Ok(RunReport {
            cycles,
            events_processed: self.events_processed,
            system_cycles,
            reason,
        })
    }

    fn validate_config(&self) -> Result<(), SimError> {
        for name in &self.config.critical_resources {
            if self.resource_by_name(name).is_none() {
                return Err(SimError::UnknownResource {
                    name: name.clone(),
                    role: ResourceRole::Critical,
                });
            }
        }
        if let Some(name) = &self.config.goal_resource
            && self.resource_by_name(name).is_none()
        {
            return Err(SimError::UnknownResource {
                name: name.clone(),
                role: ResourceRole::Goal,
            });
        }
        Ok(())
    }

    fn spawn_systems(&self) -> Result<Vec<(Arc<System>, JoinHandle<u64>)>, SimError> {
        let mut handles = Vec::with_capacity(self.systems.len());
        for system in self.systems.values() {
            let worker = Arc::clone(system);
            let spawned = thread::Builder::new()
                .name(format!("system-{}", system.name()))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push((Arc::clone(system), handle)),
                Err(source) => {
                    self.terminate_all();
                    if let Err(err) = join_systems(handles) {
                        log::warn!("while unwinding failed spawn: {err}");
                    }
                    return Err(SimError::ThreadSpawn {
                        system: system.name().to_string(),
                        source,
                    });
                }
            }
        }
        Ok(handles)
    }
}

/// Join every handle, even after a panic. Reports the first panicked system.
fn join_systems(handles: Vec<(Arc<System>, JoinHandle<u64>)>) -> Result<u64, SimError> {
    let mut total = 0u64;
    let mut first_panic = None;
    for (system, handle) in handles {
        match handle.join() {
            Ok(cycles) => total += cycles,
            Err(_) => {
                log::warn!("system '{}' panicked", system.name());
                first_panic.get_or_insert_with(|| system.name().to_string());
            }
        }
    }
    match first_panic {
        Some(system) => Err(SimError::SystemPanicked { system }),
        None => Ok(total),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
