//! Capacity-bounded shared quantities.
//!
//! A [`Resource`] keeps its amount behind its own mutex. Every read-modify-write
//! happens inside one critical section in the methods below; the guard never
//! leaves this module, so `0 <= amount <= max_capacity` holds at every
//! observable point.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SimError;
use crate::event::EventStatus;
use crate::id::ResourceId;
use crate::query::ResourceSnapshot;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of [`Resource::try_consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a failed consume must be reported"]
pub enum ConsumeOutcome {
    /// The amount was removed. `remaining` is the level left behind.
    Consumed { remaining: u32 },
    /// Nothing left at all.
    Empty,
    /// Some left, but less than requested. Nothing was removed.
    Insufficient { available: u32 },
}

impl ConsumeOutcome {
    /// The event status to report, or `None` on success.
    pub fn status(self) -> Option<EventStatus> {
        match self {
            ConsumeOutcome::Consumed { .. } => None,
            ConsumeOutcome::Empty => Some(EventStatus::Empty),
            ConsumeOutcome::Insufficient { .. } => Some(EventStatus::Insufficient),
        }
    }

    /// Resource level observed inside the critical section.
    pub fn level(self) -> u32 {
        match self {
            ConsumeOutcome::Consumed { remaining } => remaining,
            ConsumeOutcome::Empty => 0,
            ConsumeOutcome::Insufficient { available } => available,
        }
    }
}

/// Result of [`Resource::try_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "unstored remainder must be kept by the caller"]
pub enum StoreOutcome {
    /// Everything fit.
    Stored { level: u32 },
    /// Only `stored` fit; `unstored` is handed back to the caller.
    Capacity {
        stored: u32,
        unstored: u32,
        level: u32,
    },
}

impl StoreOutcome {
    /// Amount the caller still holds after the store.
    pub fn unstored(self) -> u32 {
        match self {
            StoreOutcome::Stored { .. } => 0,
            StoreOutcome::Capacity { unstored, .. } => unstored,
        }
    }

    pub fn level(self) -> u32 {
        match self {
            StoreOutcome::Stored { level } | StoreOutcome::Capacity { level, .. } => level,
        }
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A named quantity bounded by `max_capacity`.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    name: Arc<str>,
    max_capacity: u32,
    amount: Mutex<u32>,
}

impl Resource {
    /// Create a resource. Fails if `initial_amount > max_capacity`.
    pub fn new(
        id: ResourceId,
        name: &str,
        initial_amount: u32,
        max_capacity: u32,
    ) -> Result<Self, SimError> {
        if initial_amount > max_capacity {
            return Err(SimError::InvalidResource {
                name: name.to_string(),
                amount: initial_amount,
                max_capacity,
            });
        }
        Ok(Self {
            id,
            name: Arc::from(name),
            max_capacity,
            amount: Mutex::new(initial_amount),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the name, cheap to copy into events.
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    /// Current level. Stale as soon as the lock is released.
    pub fn amount(&self) -> u32 {
        *self.amount.lock()
    }

    /// Remove `amount` if fully available, otherwise leave the level untouched.
    pub fn try_consume(&self, amount: u32) -> ConsumeOutcome {
        let mut current = self.amount.lock();
        if amount <= *current {
            *current -= amount;
            ConsumeOutcome::Consumed { remaining: *current }
        } else if *current == 0 {
            ConsumeOutcome::Empty
        } else {
            ConsumeOutcome::Insufficient {
                available: *current,
            }
        }
    }

    /// Add as much of `amount` as fits and hand the rest back.
    pub fn try_store(&self, amount: u32) -> StoreOutcome {
        let mut current = self.amount.lock();
        let available = self.max_capacity - *current;
        if available >= amount {
            *current += amount;
            StoreOutcome::Stored { level: *current }
        } else {
            *current += available;
            StoreOutcome::Capacity {
                stored: available,
                unstored: amount - available,
                level: *current,
            }
        }
    }

    /// Whether `level` sits strictly below `percent` of capacity.
    pub fn is_below_watermark(&self, level: u32, percent: u8) -> bool {
        (level as u64) * 100 < (self.max_capacity as u64) * (percent as u64)
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            id: self.id,
            name: self.name.to_string(),
            amount: self.amount(),
            max_capacity: self.max_capacity,
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceAmount
// ---------------------------------------------------------------------------

/// A per-cycle rate against a resource, or nothing at all.
///
/// With no resource the amount is forced to 0: a system that consumes or
/// produces "nothing".
#[derive(Debug, Clone, Default)]
pub struct ResourceAmount {
    resource: Option<Arc<Resource>>,
    amount: u32,
}

impl ResourceAmount {
    pub fn new(resource: Option<Arc<Resource>>, amount: u32) -> Self {
        let amount = if resource.is_some() { amount } else { 0 };
        Self { resource, amount }
    }

    /// Shorthand for `new(Some(resource), amount)`.
    pub fn of(resource: &Arc<Resource>, amount: u32) -> Self {
        Self::new(Some(Arc::clone(resource)), amount)
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn resource(&self) -> Option<&Arc<Resource>> {
        self.resource.as_ref()
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn is_none(&self) -> bool {
        self.resource.is_none()
    }
}
