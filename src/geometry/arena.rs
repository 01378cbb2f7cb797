//! Per-section mesh ownership.
//!
//! Every section owns at most one slot. Installing a mesh yields a handle, and the
//! owner must hand that handle back through `release` before installing again.

use super::mesh_data::MeshData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    slot: usize,
    generation: u64,
}

impl MeshHandle {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

pub trait MeshTarget {
    fn install(&mut self, slot: usize, mesh: MeshData) -> MeshHandle;

    /// Releases the mesh behind `handle`. Returns `false` for a stale handle.
    fn release(&mut self, handle: MeshHandle) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStats {
    pub installs: u64,
    pub releases: u64,
    /// Installs that found the slot still occupied.
    pub overwrites: u64,
}

#[derive(Debug)]
pub struct Slots<T> {
    entries: Vec<Option<(u64, T)>>,
    next_generation: u64,
    stats: SlotStats,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_generation: 0,
            stats: SlotStats::default(),
        }
    }
}

impl<T> Slots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` in `slot`, returning its handle and whatever was displaced.
    pub fn insert(&mut self, slot: usize, value: T) -> (MeshHandle, Option<T>) {
        if self.entries.len() <= slot {
            self.entries.resize_with(slot + 1, || None);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.stats.installs += 1;

        let displaced = self.entries[slot].replace((generation, value)).map(|(_, old)| old);
        if displaced.is_some() {
            self.stats.overwrites += 1;
            log::warn!("mesh slot {slot} overwritten without release");
        }

        (MeshHandle { slot, generation }, displaced)
    }

    pub fn remove(&mut self, handle: MeshHandle) -> Option<T> {
        let entry = self.entries.get_mut(handle.slot)?;
        if entry.as_ref().map(|(generation, _)| *generation) != Some(handle.generation) {
            return None;
        }
        self.stats.releases += 1;
        entry.take().map(|(_, value)| value)
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.entries.get(slot)?.as_ref().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|(_, value)| (slot, value)))
    }

    pub fn live(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn stats(&self) -> SlotStats {
        self.stats
    }

    /// Empties every slot, handing the values back for disposal.
    pub fn drain(&mut self) -> Vec<T> {
        let drained: Vec<T> = self
            .entries
            .iter_mut()
            .filter_map(|entry| entry.take().map(|(_, value)| value))
            .collect();
        self.stats.releases += drained.len() as u64;
        drained
    }
}

#[derive(Debug, Default)]
pub struct MeshArena {
    slots: Slots<MeshData>,
}

impl MeshArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> Option<&MeshData> {
        self.slots.get(slot)
    }

    pub fn live(&self) -> usize {
        self.slots.live()
    }

    pub fn stats(&self) -> SlotStats {
        self.slots.stats()
    }
}

impl MeshTarget for MeshArena {
    fn install(&mut self, slot: usize, mesh: MeshData) -> MeshHandle {
        self.slots.insert(slot, mesh).0
    }

    fn release(&mut self, handle: MeshHandle) -> bool {
        self.slots.remove(handle).is_some()
    }
}
