//! Persistence seams for soil profiles and simulation results.
//!
//! The engine only talks to the [`ProfileStore`] and [`ResultStore`] traits,
//! handed in by the caller. Identifiers are handed out by each store's own
//! [`SequenceAllocator`], so two concurrent creators can never receive the
//! same id.

mod memory;

pub use memory::{MemoryProfileStore, MemoryResultStore};

use crate::error::Result;
use crate::series::{ConcentrationSeries, SimulationId};
use crate::soil::{ProfileId, SoilProfile};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id source starting at 1.
#[derive(Debug)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Reserve the next id; each call returns a value no other call receives.
    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Next id that would be handed out, without reserving it.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds soil profile definitions keyed by profile id.
pub trait ProfileStore: Send + Sync {
    /// Store a new profile under a freshly allocated id and return that id.
    ///
    /// The profile's own `id` field is overwritten.
    fn insert(&self, profile: SoilProfile) -> Result<ProfileId>;

    /// Fails with `ProfileNotFound` when absent.
    fn get(&self, id: ProfileId) -> Result<SoilProfile>;

    /// Replace the stored profile with `apply(current)` under one write lock.
    ///
    /// The stored profile is left as it was when `apply` fails. Fails with
    /// `ProfileNotFound` when absent.
    fn update(
        &self,
        id: ProfileId,
        apply: &dyn Fn(&SoilProfile) -> Result<SoilProfile>,
    ) -> Result<SoilProfile>;

    /// Fails with `ProfileNotFound` when absent.
    fn remove(&self, id: ProfileId) -> Result<()>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every profile. Ids already handed out are not reused.
    fn clear(&self) -> Result<()>;
}

/// Holds finished simulation series keyed by simulation id.
pub trait ResultStore: Send + Sync {
    /// Reserve the id the next series will be stored under.
    fn allocate_id(&self) -> SimulationId;

    fn insert(&self, series: ConcentrationSeries) -> Result<()>;

    /// Fails with `SimulationNotFound` when absent.
    fn get(&self, id: SimulationId) -> Result<ConcentrationSeries>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every result. Ids already handed out are not reused.
    fn clear(&self) -> Result<()>;
}
