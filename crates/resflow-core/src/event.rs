//! Notifications from systems to the manager, delivered in priority order.
//!
//! [`EventQueue`] is a binary heap keyed by `(priority, sequence)`. The
//! sequence number is taken from a per-queue counter at push time, so among
//! equal priorities the oldest event always pops first.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::id::{ResourceId, SystemId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Delivery priority. Higher values pop first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

/// Why a system reported an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    /// The consumed resource was at zero.
    Empty,
    /// The consumed resource held less than one cycle's worth.
    Insufficient,
    /// The produced resource could not take the whole batch.
    Capacity,
    /// A consume succeeded but left the resource below the low watermark.
    Low,
}

impl EventStatus {
    /// Shortage statuses ask upstream producers to speed up.
    pub fn is_shortage(self) -> bool {
        matches!(
            self,
            EventStatus::Empty | EventStatus::Insufficient | EventStatus::Low
        )
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Empty => "EMPTY",
            EventStatus::Insufficient => "INSUFFICIENT",
            EventStatus::Capacity => "CAPACITY",
            EventStatus::Low => "LOW",
        };
        f.write_str(s)
    }
}

/// A snapshot of a non-nominal outcome. Never a live view of later state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub system: SystemId,
    pub system_name: Arc<str>,
    pub resource: ResourceId,
    pub resource_name: Arc<str>,
    pub status: EventStatus,
    pub priority: Priority,
    /// Resource level observed when the outcome happened.
    pub amount: u32,
}

// ---------------------------------------------------------------------------
// Heap entry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Queued {
    seq: u64,
    event: Event,
}

impl Queued {
    fn key(&self) -> (Priority, Reverse<u64>) {
        (self.event.priority, Reverse(self.seq))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

// ---------------------------------------------------------------------------
// EventQueue
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct QueueState {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

/// Thread-safe priority mailbox shared by every system and the manager.
#[derive(Debug, Default)]
pub struct EventQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event behind every queued event of equal or higher priority.
    pub fn push(&self, event: Event) {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Queued { seq, event });
        drop(state);
        self.available.notify_one();
    }

    /// Remove the highest-priority, oldest event. Never blocks.
    pub fn pop(&self) -> Option<Event> {
        self.state.lock().heap.pop().map(|q| q.event)
    }

    /// Pop everything currently queued, in delivery order.
    pub fn drain(&self) -> Vec<Event> {
        let mut state = self.state.lock();
        let mut out = Vec::with_capacity(state.heap.len());
        while let Some(q) = state.heap.pop() {
            out.push(q.event);
        }
        out
    }

    /// Block until an event is queued or `timeout` elapses.
    /// Returns whether the queue is non-empty.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.heap.is_empty() {
            if self.available.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        !state.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }

    /// Events pushed since creation, including ones already popped.
    pub fn total_pushed(&self) -> u64 {
        self.state.lock().next_seq
    }

    /// Discard all queued events.
    pub fn clear(&self) {
        self.state.lock().heap.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn make_event(priority: Priority, amount: u32) -> Event {
        Event {
            system: SystemId::default(),
            system_name: Arc::from("Crew"),
            resource: ResourceId::default(),
            resource_name: Arc::from("Oxygen"),
            status: EventStatus::Empty,
            priority,
            amount,
        }
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn pops_highest_priority_first() {
        let queue = EventQueue::new();
        queue.push(make_event(Priority::Low, 1));
        queue.push(make_event(Priority::High, 2));
        queue.push(make_event(Priority::Medium, 3));

        let order: Vec<u32> = queue.drain().iter().map(|e| e.amount).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn equal_priorities_are_fifo() {
        let queue = EventQueue::new();
        for i in 0..5 {
            queue.push(make_event(Priority::High, i));
        }
        queue.push(make_event(Priority::Low, 100));
        for i in 5..10 {
            queue.push(make_event(Priority::High, i));
        }

        let order: Vec<u32> = queue.drain().iter().map(|e| e.amount).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 100]);
    }

    #[test]
    fn size_tracks_push_and_pop() {
        let queue = EventQueue::new();
        queue.push(make_event(Priority::Low, 0));
        queue.push(make_event(Priority::Low, 1));
        assert_eq!(queue.len(), 2);
        assert!(queue.pop().is_some());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.total_pushed(), 2);
    }

    #[test]
    fn clear_drops_pending() {
        let queue = EventQueue::new();
        queue.push(make_event(Priority::High, 0));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.total_pushed(), 1);
    }

    #[test]
    fn wait_times_out_when_empty() {
        let queue = EventQueue::new();
        assert!(!queue.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn wait_wakes_on_push() {
        let queue = Arc::new(EventQueue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                queue.push(make_event(Priority::Low, 7));
            })
        };
        assert!(queue.wait_timeout(Duration::from_secs(5)));
        producer.join().unwrap();
        assert_eq!(queue.pop().map(|e| e.amount), Some(7));
    }

    #[test]
    fn shortage_statuses() {
        assert!(EventStatus::Empty.is_shortage());
        assert!(EventStatus::Low.is_shortage());
        assert!(!EventStatus::Capacity.is_shortage());
        assert_eq!(EventStatus::Insufficient.to_string(), "INSUFFICIENT");
    }
}
