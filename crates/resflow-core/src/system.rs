//! Autonomous converters that turn one resource into another.
//!
//! Each [`System`] is driven by exactly one thread calling [`System::run`].
//! A cycle has two phases:
//!
//! 1. **Convert** (only when nothing is buffered) -- take one cycle's input,
//!    sleep for the scaled processing time, then buffer one batch of output.
//! 2. **Store** (whenever something is buffered) -- move as much of the
//!    buffer as fits into the output resource and keep the rest.
//!
//! Any deviation from success is pushed to the shared [`EventQueue`]. The
//! system's status is written only by the controller (the manager); the
//! system thread only reads it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::time::Duration;

use crate::config::SystemTiming;
use crate::event::{Event, EventQueue, EventStatus, Priority};
use crate::id::{ResourceId, SystemId};
use crate::query::SystemSnapshot;
use crate::resource::{ConsumeOutcome, Resource, ResourceAmount, StoreOutcome};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Execution speed of a system, or the terminal command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SystemStatus {
    Standard = 0,
    Slow = 1,
    Fast = 2,
    Terminate = 3,
}

impl SystemStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SystemStatus::Standard,
            1 => SystemStatus::Slow,
            2 => SystemStatus::Fast,
            _ => SystemStatus::Terminate,
        }
    }

    /// Processing time after applying this status' speed.
    ///
    /// Works in whole milliseconds: a fast 1ms cycle sleeps 0ms.
    pub fn scale(self, processing_time: Duration) -> Duration {
        let ms = u64::try_from(processing_time.as_millis()).unwrap_or(u64::MAX);
        match self {
            SystemStatus::Slow => Duration::from_millis(ms.saturating_mul(2)),
            SystemStatus::Fast => Duration::from_millis(ms / 2),
            SystemStatus::Standard | SystemStatus::Terminate => processing_time,
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SystemStatus::Standard => "STANDARD",
            SystemStatus::Slow => "SLOW",
            SystemStatus::Fast => "FAST",
            SystemStatus::Terminate => "TERMINATE",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// What a single [`System::run_cycle`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Phase 1 took its input and finished processing.
    pub converted: bool,
    /// Units moved into the output resource.
    pub stored: u32,
    /// Events pushed to the queue.
    pub events_pushed: u32,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// A producer/consumer unit running on its own thread.
#[derive(Debug)]
pub struct System {
    id: SystemId,
    name: Arc<str>,
    consumed: ResourceAmount,
    produced: ResourceAmount,
    processing_time: Duration,
    timing: SystemTiming,
    status: AtomicU8,
    amount_stored: AtomicU32,
    events: Arc<EventQueue>,
}

impl System {
    pub fn new(
        id: SystemId,
        name: &str,
        consumed: ResourceAmount,
        produced: ResourceAmount,
        processing_time: Duration,
        timing: SystemTiming,
        events: Arc<EventQueue>,
    ) -> Self {
        Self {
            id,
            name: Arc::from(name),
            consumed,
            produced,
            processing_time,
            timing,
            status: AtomicU8::new(SystemStatus::Standard as u8),
            amount_stored: AtomicU32::new(0),
            events,
        }
    }

    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn consumed(&self) -> &ResourceAmount {
        &self.consumed
    }

    pub fn produced(&self) -> &ResourceAmount {
        &self.produced
    }

    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Controller-side status write. The system's own thread never calls this.
    pub fn set_status(&self, status: SystemStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Change speed unless the system was already told to terminate.
    /// Returns the previous status if it changed.
    pub fn adjust_status(&self, status: SystemStatus) -> Option<SystemStatus> {
        self.status
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let current = SystemStatus::from_u8(current);
                (current != SystemStatus::Terminate && current != status)
                    .then_some(status as u8)
            })
            .ok()
            .map(SystemStatus::from_u8)
    }

    /// Production buffered while waiting for room downstream.
    pub fn amount_stored(&self) -> u32 {
        self.amount_stored.load(Ordering::Acquire)
    }

    /// Whether this system writes into the resource `id`.
    pub fn produces(&self, id: ResourceId) -> bool {
        self.produced.resource().is_some_and(|r| r.id() == id)
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            id: self.id,
            name: self.name.to_string(),
            status: self.status(),
            amount_stored: self.amount_stored(),
        }
    }

    /// Run cycles until the status reads [`SystemStatus::Terminate`].
    /// Returns the number of completed cycles.
    pub fn run(&self) -> u64 {
        log::info!("system '{}' started", self.name);
        let mut cycles = 0u64;
        while self.status() != SystemStatus::Terminate {
            let report = self.run_cycle();
            log::trace!("system '{}' cycle {cycles}: {report:?}", self.name);
            cycles += 1;
        }
        log::info!("system '{}' stopped after {cycles} cycles", self.name);
        cycles
    }

    /// One pass of convert-then-store.
    pub fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        if self.amount_stored() == 0 {
            self.convert(&mut report);
        }

        if self.amount_stored() > 0 {
            self.store(&mut report);
        }

        report
    }

    fn convert(&self, report: &mut CycleReport) {
        if let Some(input) = self.consumed.resource() {
            match input.try_consume(self.consumed.amount()) {
                ConsumeOutcome::Consumed { remaining } => {
                    if let Some(percent) = self.timing.low_watermark_percent
                        && input.is_below_watermark(remaining, percent)
                    {
                        self.report(input, EventStatus::Low, Priority::Medium, remaining);
                        report.events_pushed += 1;
                    }
                }
                ConsumeOutcome::Empty => {
                    self.report(input, EventStatus::Empty, Priority::High, 0);
                    report.events_pushed += 1;
                    self.back_off();
                    return;
                }
                ConsumeOutcome::Insufficient { available } => {
                    self.report(input, EventStatus::Insufficient, Priority::High, available);
                    report.events_pushed += 1;
                    self.back_off();
                    return;
                }
            }
        }

        std::thread::sleep(self.status().scale(self.processing_time));

        if self.produced.resource().is_some() {
            self.amount_stored
                .store(self.produced.amount(), Ordering::Release);
        }
        report.converted = true;
    }

    fn store(&self, report: &mut CycleReport) {
        let Some(output) = self.produced.resource() else {
            self.amount_stored.store(0, Ordering::Release);
            return;
        };

        let pending = self.amount_stored();
        match output.try_store(pending) {
            StoreOutcome::Stored { .. } => {
                self.amount_stored.store(0, Ordering::Release);
                report.stored += pending;
            }
            StoreOutcome::Capacity {
                stored,
                unstored,
                level,
            } => {
                self.amount_stored.store(unstored, Ordering::Release);
                report.stored += stored;
                self.report(output, EventStatus::Capacity, Priority::Low, level);
                report.events_pushed += 1;
                self.back_off();
            }
        }
    }

    fn report(&self, resource: &Resource, status: EventStatus, priority: Priority, amount: u32) {
        self.events.push(Event {
            system: self.id,
            system_name: Arc::clone(&self.name),
            resource: resource.id(),
            resource_name: resource.shared_name(),
            status,
            priority,
            amount,
        });
    }

    fn back_off(&self) {
        if !self.timing.backoff.is_zero() {
            std::thread::sleep(self.timing.backoff);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str, amount: u32, max: u32) -> Arc<Resource> {
        Arc::new(Resource::new(ResourceId::default(), name, amount, max).unwrap())
    }

    fn quick_timing() -> SystemTiming {
        SystemTiming {
            backoff: Duration::ZERO,
            low_watermark_percent: None,
        }
    }

    fn system(
        consumed: ResourceAmount,
        produced: ResourceAmount,
        timing: SystemTiming,
    ) -> (System, Arc<EventQueue>) {
        let queue = Arc::new(EventQueue::new());
        let sys = System::new(
            SystemId::default(),
            "Test",
            consumed,
            produced,
            Duration::ZERO,
            timing,
            Arc::clone(&queue),
        );
        (sys, queue)
    }

    #[test]
    fn status_scaling() {
        let t = Duration::from_millis(50);
        assert_eq!(SystemStatus::Standard.scale(t), t);
        assert_eq!(SystemStatus::Slow.scale(t), Duration::from_millis(100));
        assert_eq!(SystemStatus::Fast.scale(t), Duration::from_millis(25));
    }

    #[test]
    fn fast_scaling_truncates_to_whole_millis() {
        assert_eq!(SystemStatus::Fast.scale(Duration::from_millis(1)), Duration::ZERO);
        assert_eq!(
            SystemStatus::Fast.scale(Duration::from_millis(5)),
            Duration::from_millis(2)
        );
        assert_eq!(
            SystemStatus::Slow.scale(Duration::from_millis(3)),
            Duration::from_millis(6)
        );
    }

    #[test]
    fn converts_then_stores_in_one_cycle() {
        let fuel = resource("Fuel", 10, 10);
        let energy = resource("Energy", 0, 50);
        let (sys, queue) = system(
            ResourceAmount::of(&fuel, 5),
            ResourceAmount::of(&energy, 10),
            quick_timing(),
        );

        let report = sys.run_cycle();
        assert!(report.converted);
        assert_eq!(report.stored, 10);
        assert_eq!(fuel.amount(), 5);
        assert_eq!(energy.amount(), 10);
        assert_eq!(sys.amount_stored(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_input_reports_high_priority() {
        let oxygen = resource("Oxygen", 0, 50);
        let (sys, queue) = system(
            ResourceAmount::of(&oxygen, 1),
            ResourceAmount::none(),
            quick_timing(),
        );

        let report = sys.run_cycle();
        assert!(!report.converted);
        let event = queue.pop().unwrap();
        assert_eq!(event.status, EventStatus::Empty);
        assert_eq!(event.priority, Priority::High);
        assert_eq!(event.amount, 0);
        assert_eq!(&*event.resource_name, "Oxygen");
    }

    #[test]
    fn short_input_is_not_decremented() {
        let energy = resource("Energy", 3, 50);
        let oxygen = resource("Oxygen", 0, 50);
        let (sys, queue) = system(
            ResourceAmount::of(&energy, 7),
            ResourceAmount::of(&oxygen, 4),
            quick_timing(),
        );

        sys.run_cycle();
        assert_eq!(energy.amount(), 3);
        assert_eq!(oxygen.amount(), 0);
        let event = queue.pop().unwrap();
        assert_eq!(event.status, EventStatus::Insufficient);
        assert_eq!(event.amount, 3);
    }

    #[test]
    fn overflow_is_buffered_then_flushed() {
        let fuel = resource("Fuel", 100, 100);
        let distance = resource("Distance", 90, 100);
        let (sys, queue) = system(
            ResourceAmount::of(&fuel, 5),
            ResourceAmount::of(&distance, 25),
            quick_timing(),
        );

        let report = sys.run_cycle();
        assert_eq!(report.stored, 10);
        assert_eq!(sys.amount_stored(), 15);
        assert_eq!(distance.amount(), 100);
        let event = queue.pop().unwrap();
        assert_eq!(event.status, EventStatus::Capacity);
        assert_eq!(event.priority, Priority::Low);
        assert_eq!(event.amount, 100);

        // While buffered, no further input is taken.
        sys.run_cycle();
        assert_eq!(fuel.amount(), 95);
        assert_eq!(sys.amount_stored(), 15);

        // Free room downstream; the remainder flushes.
        assert_eq!(
            distance.try_consume(50),
            ConsumeOutcome::Consumed { remaining: 50 }
        );
        let report = sys.run_cycle();
        assert!(!report.converted);
        assert_eq!(report.stored, 15);
        assert_eq!(sys.amount_stored(), 0);
        assert_eq!(distance.amount(), 65);
    }

    #[test]
    fn sink_never_buffers() {
        let oxygen = resource("Oxygen", 5, 50);
        let (sys, queue) = system(
            ResourceAmount::of(&oxygen, 1),
            ResourceAmount::none(),
            quick_timing(),
        );
        let report = sys.run_cycle();
        assert!(report.converted);
        assert_eq!(sys.amount_stored(), 0);
        assert_eq!(oxygen.amount(), 4);
        assert!(queue.is_empty());
    }

    #[test]
    fn source_needs_no_input() {
        let ore = resource("Ore", 0, 10);
        let (sys, _queue) = system(
            ResourceAmount::none(),
            ResourceAmount::of(&ore, 3),
            quick_timing(),
        );
        sys.run_cycle();
        sys.run_cycle();
        assert_eq!(ore.amount(), 6);
    }

    #[test]
    fn low_watermark_reports_medium_priority() {
        let oxygen = resource("Oxygen", 12, 50);
        let timing = SystemTiming {
            low_watermark_percent: Some(20),
            ..quick_timing()
        };
        let (sys, queue) = system(ResourceAmount::of(&oxygen, 1), ResourceAmount::none(), timing);

        sys.run_cycle();
        assert!(queue.is_empty(), "11/50 is above 20%");
        sys.run_cycle();
        sys.run_cycle();
        let event = queue.pop().unwrap();
        assert_eq!(event.status, EventStatus::Low);
        assert_eq!(event.priority, Priority::Medium);
        assert_eq!(event.amount, 9);
    }

    #[test]
    fn adjust_never_leaves_terminate() {
        let (sys, _queue) = system(ResourceAmount::none(), ResourceAmount::none(), quick_timing());
        assert_eq!(sys.adjust_status(SystemStatus::Fast), Some(SystemStatus::Standard));
        assert_eq!(sys.adjust_status(SystemStatus::Fast), None);
        sys.set_status(SystemStatus::Terminate);
        assert_eq!(sys.adjust_status(SystemStatus::Slow), None);
        assert_eq!(sys.status(), SystemStatus::Terminate);
    }

    #[test]
    fn run_returns_once_terminated() {
        let fuel = resource("Fuel", 0, 10);
        let queue = Arc::new(EventQueue::new());
        let sys = Arc::new(System::new(
            SystemId::default(),
            "Idle",
            ResourceAmount::of(&fuel, 1),
            ResourceAmount::none(),
            Duration::from_millis(5),
            SystemTiming {
                backoff: Duration::from_millis(5),
                low_watermark_percent: None,
            },
            queue,
        ));
        let handle = {
            let sys = Arc::clone(&sys);
            std::thread::spawn(move || sys.run())
        };
        std::thread::sleep(Duration::from_millis(20));
        sys.set_status(SystemStatus::Terminate);
        let cycles = handle.join().unwrap();
        assert!(cycles >= 1);
    }
}
