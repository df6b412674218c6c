//! Flat wire snapshots of table data.
//!
//! Every row travels as one array: slot 0 is the row-state code, the
//! remaining slots are the column values in ordinal order. Deleted rows carry
//! their original values, every other row its current values.
//!
//! Rebuilding replays the edit sequence matching each state, so the rebuilt
//! row has the same classification as the row it came from:
//!
//! | state     | replay                      |
//! |-----------|-----------------------------|
//! | Unchanged | accept                      |
//! | Added     | nothing                     |
//! | Deleted   | accept, delete              |
//! | Modified  | accept, force modified      |

use crate::{error::Result, Error, RowId, RowState, RowStates, RowVersion, Set, Table, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Rows of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub name: String,
    #[serde(default)]
    pub schema: String,
    /// `[stateCode, col0, col1, ...]` per row
    pub rows: Vec<Vec<Value>>,
}

impl TableSnapshot {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Rows of every table in a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    pub tables: Vec<TableSnapshot>,
}

impl Default for SetSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SetSnapshot {
    pub fn new() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            tables: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(TableSnapshot::row_count).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Parse a snapshot, rejecting formats newer than this build knows.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: SetSnapshot =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported format version {}",
                snapshot.format_version
            )));
        }
        Ok(snapshot)
    }
}

impl Table {
    /// Flatten the rows whose state is in `states`.
    pub fn to_snapshot(&self, states: RowStates) -> Result<TableSnapshot> {
        let mut rows = Vec::new();
        for row in self.rows_with_state(states) {
            let state = row.state();
            let version = match state {
                RowState::Deleted => RowVersion::Original,
                _ => RowVersion::Current,
            };
            let mut flat = Vec::with_capacity(self.column_count() + 1);
            flat.push(Value::Int64(state.code()));
            flat.extend(row.values(version)?);
            rows.push(flat);
        }
        Ok(TableSnapshot {
            name: self.name().to_string(),
            schema: self.schema().to_string(),
            rows,
        })
    }

    /// Rebuild snapshot rows into this table. Values are coerced to the
    /// declared column types. A row that fails is removed and the error
    /// returned; rows rebuilt before it stay.
    pub fn apply_snapshot(&mut self, snapshot: &TableSnapshot) -> Result<Vec<RowId>> {
        let mut ids = Vec::with_capacity(snapshot.rows.len());
        for flat in &snapshot.rows {
            if let Some(id) = self.apply_snapshot_row(flat)? {
                ids.push(id);
            }
        }
        debug!(table = %self.name(), rows = ids.len(), "rebuilt rows from snapshot");
        Ok(ids)
    }

    fn apply_snapshot_row(&mut self, flat: &[Value]) -> Result<Option<RowId>> {
        if flat.len() != self.column_count() + 1 {
            return Err(Error::SnapshotRowLength {
                table: self.name().to_string(),
                expected: self.column_count() + 1,
                actual: flat.len(),
            });
        }
        let code = flat[0]
            .as_i64()
            .ok_or_else(|| Error::InvalidSnapshot(format!("row state code {:?}", flat[0])))?;
        let state = RowState::from_code(code)?;
        if state == RowState::Detached {
            return Ok(None);
        }

        let id = self.new_row()?;
        match self.replay(id, state, &flat[1..]) {
            Ok(()) => Ok(Some(id)),
            Err(err) => {
                self.remove_row(id)?;
                Err(err)
            }
        }
    }

    fn replay(&mut self, id: RowId, state: RowState, values: &[Value]) -> Result<()> {
        {
            let mut row = self.row_mut(id)?;
            for (ordinal, value) in values.iter().enumerate() {
                row.set_at(ordinal, value.clone())?;
            }
        }
        self.add_row(id)?;

        match state {
            RowState::Added | RowState::Detached => Ok(()),
            RowState::Unchanged => self.row_mut(id)?.accept_changes(),
            RowState::Deleted => {
                self.row_mut(id)?.accept_changes()?;
                self.row_mut(id)?.delete()
            }
            RowState::Modified => {
                self.row_mut(id)?.accept_changes()?;
                self.row_mut(id)?.set_modified()
            }
        }
    }
}

impl Set {
    /// Flatten the rows whose state is in `states`, table by table.
    pub fn to_snapshot(&self, states: RowStates) -> Result<SetSnapshot> {
        Ok(SetSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            tables: self
                .tables()
                .iter()
                .map(|t| t.to_snapshot(states))
                .collect::<Result<_>>()?,
        })
    }

    /// Rebuild snapshot rows into the tables of this set, matched by name
    /// and schema. Returns the number of rows rebuilt.
    pub fn apply_snapshot(&mut self, snapshot: &SetSnapshot) -> Result<usize> {
        let mut total = 0;
        for data in &snapshot.tables {
            let table = self
                .table_with_schema_mut(&data.name, &data.schema)
                .ok_or_else(|| Error::TableNotFound(data.name.clone()))?;
            total += table.apply_snapshot(data)?.len();
        }
        debug!(set = %self.name(), rows = total, "applied snapshot");
        Ok(total)
    }
}
