//! Row storage for one table.
//!
//! Rows live in a generational arena: a [`RowId`] names a slot plus the
//! generation it was issued for, so a handle kept after its row was removed
//! fails to resolve instead of reaching whichever row reused the slot.

use crate::{RecordId, RecordSequence, RowState};
use std::fmt;

/// Handle of a row inside its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId {
    index: u32,
    generation: u32,
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row{}v{}", self.index, self.generation)
    }
}

/// The record versions held by one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RowData {
    pub(crate) original: Option<RecordId>,
    pub(crate) current: Option<RecordId>,
    pub(crate) proposed: Option<RecordId>,
    /// Sequential position id, set while the row is attached.
    pub(crate) position: Option<u64>,
}

impl RowData {
    pub(crate) fn state(&self) -> RowState {
        RowState::derive(self.original, self.current)
    }

    /// Distinct record ids held by the row.
    pub(crate) fn records(&self) -> Vec<RecordId> {
        let mut records = Vec::with_capacity(3);
        for record in [self.original, self.current, self.proposed].into_iter().flatten() {
            if !records.contains(&record) {
                records.push(record);
            }
        }
        records
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<RowData>,
}

/// All rows of a table plus the table's record id sequence.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<RowId>,
    next_position: u64,
    records: RecordSequence,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached rows.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Attached rows in insertion order.
    pub fn ids(&self) -> &[RowId] {
        &self.order
    }

    /// Whether `id` names a live row, attached or not.
    pub fn contains(&self, id: RowId) -> bool {
        self.get(id).is_some()
    }

    pub fn record_sequence(&self) -> &RecordSequence {
        &self.records
    }

    pub(crate) fn next_record(&mut self) -> RecordId {
        self.records.next_id()
    }

    /// Reserve a slot for a new, detached row.
    pub(crate) fn allocate(&mut self) -> RowId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.data = Some(RowData::default());
                RowId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(RowData::default()),
                });
                RowId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub(crate) fn get(&self, id: RowId) -> Option<&RowData> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: RowId) -> Option<&mut RowData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    /// Append a row to the attached order and give it a position id.
    pub(crate) fn attach(&mut self, id: RowId) {
        let position = self.next_position;
        if let Some(data) = self.get_mut(id) {
            data.position = Some(position);
            self.next_position += 1;
            self.order.push(id);
        }
    }

    /// Free a row's slot. The handle and any copies of it stop resolving.
    pub(crate) fn release(&mut self, id: RowId) {
        if self.get(id).is_none() {
            return;
        }
        if let Some(pos) = self.order.iter().position(|r| *r == id) {
            self.order.remove(pos);
        }
        let slot = &mut self.slots[id.index as usize];
        slot.data = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Every record id held by any live row.
    pub(crate) fn live_records(&self) -> Vec<RecordId> {
        self.slots
            .iter()
            .filter_map(|slot| slot.data.as_ref())
            .flat_map(RowData::records)
            .collect()
    }

    /// Drop every row, attached or detached.
    pub(crate) fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.data.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.order.clear();
    }
}
