//! Row handles and the edit protocol.
//!
//! A row holds up to three record ids: `original` (the last accepted
//! version), `current` (the live version) and `proposed` (an open edit).
//! Its [`RowState`] is derived from the first two and never stored.
//!
//! Edits follow begin/end/cancel semantics:
//!
//! ```text
//! begin_edit   proposed := copy(current)
//! set          write into proposed (opening and closing an edit if none is open)
//! end_edit     current := proposed, old current purged unless it is original
//! cancel_edit  proposed purged
//! accept       original := current
//! reject       current := original
//! delete       original := original or current, current := none
//! ```

pub use crate::rowset::RowId;

use crate::{error::Result, rowset::RowData, Error, RecordId, RowState, RowVersion, Table, Value};

fn resolve(data: &RowData, version: RowVersion) -> Result<RecordId> {
    match version {
        RowVersion::Original => data.original.ok_or(Error::NoOriginalData),
        RowVersion::Current => data.current.ok_or(Error::NoCurrentData),
        RowVersion::Proposed => data.proposed.ok_or(Error::NoProposedData),
        RowVersion::Default => data.proposed.or(data.current).ok_or_else(|| {
            if data.state() == RowState::Deleted {
                Error::DeletedRowInaccessible
            } else {
                Error::NoCurrentData
            }
        }),
    }
}

/// Read-only view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    id: RowId,
    data: &'a RowData,
}

impl<'a> Row<'a> {
    pub(crate) fn new(table: &'a Table, id: RowId, data: &'a RowData) -> Self {
        Self { table, id, data }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn state(&self) -> RowState {
        self.data.state()
    }

    /// Sequential position id, present while the row is attached.
    pub fn position(&self) -> Option<u64> {
        self.data.position
    }

    pub fn is_editing(&self) -> bool {
        self.data.proposed.is_some()
    }

    pub fn has_version(&self, version: RowVersion) -> bool {
        resolve(self.data, version).is_ok()
    }

    /// Record id behind a version of the row.
    pub fn record(&self, version: RowVersion) -> Result<RecordId> {
        resolve(self.data, version)
    }

    /// Value of a column in the default version.
    pub fn get(&self, column: &str) -> Result<Value> {
        self.get_version(column, RowVersion::Default)
    }

    pub fn get_version(&self, column: &str, version: RowVersion) -> Result<Value> {
        let column = self
            .table
            .column(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        Ok(column.get(self.record(version)?))
    }

    /// Every column value of a version, in ordinal order.
    pub fn values(&self, version: RowVersion) -> Result<Vec<Value>> {
        let record = self.record(version)?;
        Ok(self.table.columns().iter().map(|c| c.get(record)).collect())
    }
}

/// Mutable handle to one row, carrying the edit protocol.
#[derive(Debug)]
pub struct RowMut<'a> {
    table: &'a mut Table,
    id: RowId,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(table: &'a mut Table, id: RowId) -> Self {
        Self { table, id }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    fn data(&self) -> Result<RowData> {
        self.table.data(self.id).cloned()
    }

    pub fn state(&self) -> Result<RowState> {
        Ok(self.data()?.state())
    }

    pub fn get(&self, column: &str) -> Result<Value> {
        self.table.row(self.id)?.get(column)
    }

    pub fn get_version(&self, column: &str, version: RowVersion) -> Result<Value> {
        self.table.row(self.id)?.get_version(column, version)
    }

    /// Open an edit. Returns whether this call opened it.
    pub fn begin_edit(&mut self) -> Result<bool> {
        let data = self.data()?;
        if data.proposed.is_some() {
            return Ok(false);
        }
        if data.state() == RowState::Deleted {
            return Err(Error::DeletedRowInaccessible);
        }
        let record = match data.current {
            Some(current) => self.table.duplicate_record(current),
            None => self.table.alloc_record()?,
        };
        self.table.data_mut(self.id)?.proposed = Some(record);
        Ok(true)
    }

    /// Promote the open edit to current. A row without current data is
    /// detached and keeps its proposed record.
    pub fn end_edit(&mut self) -> Result<()> {
        let data = self.data()?;
        let Some(proposed) = data.proposed else {
            return Ok(());
        };
        let Some(old) = data.current else {
            return Ok(());
        };
        {
            let target = self.table.data_mut(self.id)?;
            target.current = Some(proposed);
            target.proposed = None;
        }
        if data.original != Some(old) {
            self.table.free_record(old);
        }
        Ok(())
    }

    /// Discard the open edit, if any.
    pub fn cancel_edit(&mut self) -> Result<()> {
        let data = self.data()?;
        if let Some(proposed) = data.proposed {
            self.table.data_mut(self.id)?.proposed = None;
            self.table.free_record(proposed);
        }
        Ok(())
    }

    /// Set a column by name. Outside an explicit edit the write is
    /// committed immediately.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let ordinal = self
            .table
            .ordinal(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        self.set_at(ordinal, value)
    }

    /// Set a column by ordinal.
    pub fn set_at(&mut self, ordinal: usize, value: impl Into<Value>) -> Result<()> {
        let attached = self.data()?.position.is_some();
        let column = self
            .table
            .columns
            .get(ordinal)
            .ok_or_else(|| Error::ColumnNotFound(ordinal.to_string()))?;
        if attached && column.is_read_only() {
            return Err(Error::ReadOnlyColumn(column.name().to_string()));
        }
        let value = value.into().coerce(column.data_type())?;
        column.check_null(&value)?;

        let began = self.begin_edit()?;
        let proposed = self.data()?.proposed.ok_or(Error::NoProposedData)?;
        if let Err(err) = self.table.columns[ordinal].set(proposed, value) {
            if began {
                self.cancel_edit()?;
            }
            return Err(err);
        }
        if began {
            self.end_edit()?;
        }
        Ok(())
    }

    /// Commit the row: close any open edit and make current the new
    /// original. A deleted row is removed from its table, after which the
    /// handle reports [`Error::RowNotFound`].
    pub fn accept_changes(&mut self) -> Result<()> {
        self.end_edit()?;
        let data = self.data()?;
        match data.state() {
            RowState::Detached | RowState::Unchanged => Ok(()),
            RowState::Deleted => self.table.remove_row(self.id),
            RowState::Added | RowState::Modified => {
                self.table.data_mut(self.id)?.original = data.current;
                if let Some(original) = data.original {
                    self.table.free_record(original);
                }
                Ok(())
            }
        }
    }

    /// Discard the open edit and restore current from original.
    pub fn reject_changes(&mut self) -> Result<()> {
        let original = self
            .data()?
            .original
            .ok_or(Error::NoOriginalDataToRollback)?;
        self.cancel_edit()?;
        let current = self.data()?.current;
        if current != Some(original) {
            self.table.data_mut(self.id)?.current = Some(original);
            if let Some(current) = current {
                self.table.free_record(current);
            }
        }
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.reject_changes()
    }

    /// Mark the row deleted. Its values stay readable as the original
    /// version until the deletion is accepted or rejected.
    pub fn delete(&mut self) -> Result<()> {
        match self.data()?.state() {
            RowState::Deleted => return Err(Error::DeletedRowInaccessible),
            RowState::Detached => return Err(Error::RowDetached(self.table.name().to_string())),
            _ => {}
        }
        self.cancel_edit()?;
        let data = self.data()?;
        {
            let target = self.table.data_mut(self.id)?;
            target.original = data.original.or(data.current);
            target.current = None;
        }
        if let (Some(original), Some(current)) = (data.original, data.current) {
            if original != current {
                self.table.free_record(current);
            }
        }
        Ok(())
    }

    /// Force an unchanged row to read as Added.
    pub fn set_added(&mut self) -> Result<()> {
        self.require_unchanged()?;
        self.table.data_mut(self.id)?.original = None;
        Ok(())
    }

    /// Force an unchanged row to read as Modified, giving it an original
    /// copy of its current data.
    pub fn set_modified(&mut self) -> Result<()> {
        self.require_unchanged()?;
        let current = self.data()?.current.ok_or(Error::NoCurrentData)?;
        let original = self.table.duplicate_record(current);
        self.table.data_mut(self.id)?.original = Some(original);
        Ok(())
    }

    fn require_unchanged(&self) -> Result<()> {
        let state = self.data()?.state();
        if state != RowState::Unchanged {
            return Err(Error::InvalidRowState {
                expected: RowState::Unchanged.to_string(),
                actual: state.to_string(),
            });
        }
        Ok(())
    }
}
