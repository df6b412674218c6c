//! Record identifiers and row-state classification.
//!
//! A record is one stored version of a row's data. Columns keep one value per
//! record id, and a row holds up to three record ids (original, current,
//! proposed). The row's [`RowState`] is derived from which of those it holds.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Handle of one stored record version inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(u64);

impl RecordId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-table generator of record ids.
///
/// Ids are handed out monotonically and never reused while the table lives.
/// The sequence is owned by its table and is not safe for concurrent use;
/// callers sharing a table across threads must serialize access themselves.
#[derive(Debug, Clone, Default)]
pub struct RecordSequence {
    next: u64,
}

impl RecordSequence {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next record id.
    pub fn next_id(&mut self) -> RecordId {
        let id = RecordId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Derived state of a row.
///
/// The discriminants are the codes used by the flat wire snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    Detached = 1,
    Unchanged = 2,
    Added = 4,
    Deleted = 8,
    Modified = 16,
}

impl RowState {
    /// Classify a row from the presence of its original and current records.
    pub fn derive(original: Option<RecordId>, current: Option<RecordId>) -> RowState {
        match (original, current) {
            (None, None) => RowState::Detached,
            (None, Some(_)) => RowState::Added,
            (Some(_), None) => RowState::Deleted,
            (Some(o), Some(c)) if o == c => RowState::Unchanged,
            (Some(_), Some(_)) => RowState::Modified,
        }
    }

    pub fn code(&self) -> i64 {
        *self as i64
    }

    pub fn from_code(code: i64) -> Result<RowState> {
        match code {
            1 => Ok(RowState::Detached),
            2 => Ok(RowState::Unchanged),
            4 => Ok(RowState::Added),
            8 => Ok(RowState::Deleted),
            16 => Ok(RowState::Modified),
            other => Err(Error::InvalidRowStateCode(other)),
        }
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowState::Detached => "Detached",
            RowState::Unchanged => "Unchanged",
            RowState::Added => "Added",
            RowState::Deleted => "Deleted",
            RowState::Modified => "Modified",
        };
        f.write_str(name)
    }
}

/// A bitmask of row states, used to filter rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RowStates(u8);

impl RowStates {
    pub const NONE: RowStates = RowStates(0);
    pub const DETACHED: RowStates = RowStates(RowState::Detached as u8);
    pub const UNCHANGED: RowStates = RowStates(RowState::Unchanged as u8);
    pub const ADDED: RowStates = RowStates(RowState::Added as u8);
    pub const DELETED: RowStates = RowStates(RowState::Deleted as u8);
    pub const MODIFIED: RowStates = RowStates(RowState::Modified as u8);
    /// Every state a change extraction cares about.
    pub const CHANGES: RowStates = RowStates(
        RowState::Added as u8 | RowState::Deleted as u8 | RowState::Modified as u8,
    );
    /// Every state a row attached to a table can have.
    pub const ALL: RowStates = RowStates(
        RowState::Unchanged as u8
            | RowState::Added as u8
            | RowState::Deleted as u8
            | RowState::Modified as u8,
    );

    pub fn contains(&self, state: RowState) -> bool {
        self.0 & state as u8 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<RowState> for RowStates {
    fn from(state: RowState) -> Self {
        RowStates(state as u8)
    }
}

impl BitOr for RowStates {
    type Output = RowStates;

    fn bitor(self, rhs: RowStates) -> RowStates {
        RowStates(self.0 | rhs.0)
    }
}

impl BitOr<RowState> for RowStates {
    type Output = RowStates;

    fn bitor(self, rhs: RowState) -> RowStates {
        RowStates(self.0 | rhs as u8)
    }
}

impl BitOr for RowState {
    type Output = RowStates;

    fn bitor(self, rhs: RowState) -> RowStates {
        RowStates::from(self) | rhs
    }
}

impl BitOrAssign for RowStates {
    fn bitor_assign(&mut self, rhs: RowStates) {
        self.0 |= rhs.0;
    }
}

/// Which stored version of a row to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowVersion {
    Original,
    Current,
    Proposed,
    /// Proposed while an edit is open, current otherwise.
    #[default]
    Default,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let mut seq = RecordSequence::new();
        let a = seq.next_id();
        let b = seq.next_id();
        assert!(a < b);
        assert_eq!(seq.issued(), 2);
    }

    #[test]
    fn derive_covers_every_case() {
        let mut seq = RecordSequence::new();
        let a = seq.next_id();
        let b = seq.next_id();

        assert_eq!(RowState::derive(None, None), RowState::Detached);
        assert_eq!(RowState::derive(Some(a), Some(a)), RowState::Unchanged);
        assert_eq!(RowState::derive(None, Some(a)), RowState::Added);
        assert_eq!(RowState::derive(Some(a), None), RowState::Deleted);
        assert_eq!(RowState::derive(Some(a), Some(b)), RowState::Modified);
    }

    #[test]
    fn state_codes_roundtrip() {
        for state in [
            RowState::Detached,
            RowState::Unchanged,
            RowState::Added,
            RowState::Deleted,
            RowState::Modified,
        ] {
            assert_eq!(RowState::from_code(state.code()).unwrap(), state);
        }
        assert!(matches!(
            RowState::from_code(3),
            Err(Error::InvalidRowStateCode(3))
        ));
    }

    #[test]
    fn state_mask() {
        let mask = RowState::Added | RowState::Modified;
        assert!(mask.contains(RowState::Added));
        assert!(mask.contains(RowState::Modified));
        assert!(!mask.contains(RowState::Deleted));
        assert!(RowStates::CHANGES.contains(RowState::Deleted));
        assert!(!RowStates::CHANGES.contains(RowState::Unchanged));
        assert!(RowStates::NONE.is_empty());
    }
}
