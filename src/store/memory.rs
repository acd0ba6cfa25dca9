use crate::error::{BioturbationError, Result};
use crate::series::{ConcentrationSeries, SimulationId};
use crate::soil::{ProfileId, SoilProfile};
use crate::store::{ProfileStore, ResultStore, SequenceAllocator};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Profile store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<BTreeMap<ProfileId, SoilProfile>>,
    ids: SequenceAllocator,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<ProfileId, SoilProfile>>> {
        self.profiles
            .read()
            .map_err(|_| BioturbationError::StoreUnavailable("profile"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<ProfileId, SoilProfile>>> {
        self.profiles
            .write()
            .map_err(|_| BioturbationError::StoreUnavailable("profile"))
    }
}

impl ProfileStore for MemoryProfileStore {
    fn insert(&self, mut profile: SoilProfile) -> Result<ProfileId> {
        let id = ProfileId(self.ids.allocate());
        profile.id = id;
        self.write()?.insert(id, profile);
        debug!(profile_id = %id, "profile stored");
        Ok(id)
    }

    fn get(&self, id: ProfileId) -> Result<SoilProfile> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(BioturbationError::ProfileNotFound(id))
    }

    fn update(
        &self,
        id: ProfileId,
        apply: &dyn Fn(&SoilProfile) -> Result<SoilProfile>,
    ) -> Result<SoilProfile> {
        let mut profiles = self.write()?;
        let slot = profiles
            .get_mut(&id)
            .ok_or(BioturbationError::ProfileNotFound(id))?;
        let mut updated = apply(&*slot)?;
        updated.id = id;
        *slot = updated.clone();
        Ok(updated)
    }

    fn remove(&self, id: ProfileId) -> Result<()> {
        self.write()?
            .remove(&id)
            .map(|_| ())
            .ok_or(BioturbationError::ProfileNotFound(id))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }
}

/// Result store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: RwLock<BTreeMap<SimulationId, ConcentrationSeries>>,
    ids: SequenceAllocator,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored ids in ascending order.
    pub fn ids(&self) -> Result<Vec<SimulationId>> {
        Ok(self.read()?.keys().copied().collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<SimulationId, ConcentrationSeries>>> {
        self.results
            .read()
            .map_err(|_| BioturbationError::StoreUnavailable("result"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<SimulationId, ConcentrationSeries>>> {
        self.results
            .write()
            .map_err(|_| BioturbationError::StoreUnavailable("result"))
    }
}

impl ResultStore for MemoryResultStore {
    fn allocate_id(&self) -> SimulationId {
        SimulationId(self.ids.allocate())
    }

    fn insert(&self, series: ConcentrationSeries) -> Result<()> {
        let id = series.simulation_id;
        self.write()?.insert(id, series);
        debug!(simulation_id = %id, "result stored");
        Ok(())
    }

    fn get(&self, id: SimulationId) -> Result<ConcentrationSeries> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(BioturbationError::SimulationNotFound(id))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }
}
