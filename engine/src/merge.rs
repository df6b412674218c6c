//! Merging rows from an external table into a table that may hold local,
//! unsaved edits.
//!
//! Each source row is matched to a destination row by primary key. What
//! happens next depends only on the two row states, see [`MergeCase`]:
//!
//! | source    | destination | original      | current                                    |
//! |-----------|-------------|---------------|--------------------------------------------|
//! | Unchanged | Unchanged   | from source   | kept (preserve) or from source             |
//! | Deleted   | any         | from source   | kept (preserve) or cleared                 |
//! | other     | other       | from source * | kept (preserve) or from source             |
//!
//! `*` only when the source row has an original version.

use crate::{
    error::Result, rowset::RowData, Error, Key, RecordId, RowId, RowState, Set, Table, Value,
};
use serde::Serialize;
use std::ops::{Add, AddAssign};
use tracing::debug;

/// How one source row is reconciled with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeCase {
    /// Detached source rows carry nothing to merge.
    Skip,
    /// No destination row matches; the source row is imported as is.
    Import,
    BothUnchanged,
    SourceDeleted,
    SourceChanged,
}

impl MergeCase {
    pub fn classify(source: RowState, target: Option<RowState>) -> MergeCase {
        match (source, target) {
            (RowState::Detached, _) => MergeCase::Skip,
            (_, None) => MergeCase::Import,
            (RowState::Deleted, Some(_)) => MergeCase::SourceDeleted,
            (RowState::Unchanged, Some(RowState::Unchanged)) => MergeCase::BothUnchanged,
            (_, Some(_)) => MergeCase::SourceChanged,
        }
    }
}

/// Counters describing what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Source rows with no destination match, imported as new rows
    pub imported: usize,
    /// Source rows merged into an existing destination row
    pub merged: usize,
    /// Detached source rows ignored
    pub skipped: usize,
    /// Columns added to destination tables
    pub added_columns: usize,
}

impl Add for MergeReport {
    type Output = MergeReport;

    fn add(mut self, rhs: MergeReport) -> MergeReport {
        self += rhs;
        self
    }
}

impl AddAssign for MergeReport {
    fn add_assign(&mut self, rhs: MergeReport) {
        self.imported += rhs.imported;
        self.merged += rhs.merged;
        self.skipped += rhs.skipped;
        self.added_columns += rhs.added_columns;
    }
}

/// Merges tables under one conflict policy.
///
/// With `preserve_changes` the destination keeps its pending local edits
/// and only refreshes its original (baseline) values. Without it the
/// source wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Merger {
    preserve_changes: bool,
}

impl Merger {
    pub fn new(preserve_changes: bool) -> Self {
        Self { preserve_changes }
    }

    pub fn preserve_changes(&self) -> bool {
        self.preserve_changes
    }

    /// Merge schema and every attached row of `source` into `target`.
    pub fn merge_table(&self, target: &mut Table, source: &Table) -> Result<MergeReport> {
        let rows = source.row_ids();
        self.merge_rows(target, source, &rows)
    }

    /// Merge schema and the given rows of `source` into `target`.
    pub fn merge_rows(
        &self,
        target: &mut Table,
        source: &Table,
        rows: &[RowId],
    ) -> Result<MergeReport> {
        let mut report = MergeReport {
            added_columns: self.merge_schema(target, source)?,
            ..MergeReport::default()
        };

        for id in rows {
            match self.merge_row(target, source, *id)? {
                MergeCase::Skip => report.skipped += 1,
                MergeCase::Import => report.imported += 1,
                _ => report.merged += 1,
            }
        }

        debug!(
            table = %target.name(),
            preserve_changes = self.preserve_changes,
            imported = report.imported,
            merged = report.merged,
            skipped = report.skipped,
            added_columns = report.added_columns,
            "merged table"
        );
        Ok(report)
    }

    /// Add source columns missing from the target (matched ignoring case)
    /// and adopt the source's primary key when the target has none.
    fn merge_schema(&self, target: &mut Table, source: &Table) -> Result<usize> {
        let mut added = 0;
        for column in source.columns() {
            if target.column(column.name()).is_none() {
                target.add_column(column.clone_schema())?;
                added += 1;
            }
        }
        if target.primary_key().is_none() {
            if let Some(key) = source.primary_key() {
                let key = key.rebind(source, target)?;
                target.set_primary_key(key)?;
            }
        }
        Ok(added)
    }

    fn merge_row(&self, target: &mut Table, source: &Table, id: RowId) -> Result<MergeCase> {
        let src = source.data(id)?.clone();
        let src_state = src.state();
        if src_state == RowState::Detached {
            return Ok(MergeCase::Skip);
        }

        let matched = match target.primary_key() {
            Some(key) => {
                let values = source_key_values(key, target, source, src.original.or(src.current))?;
                target.find_baseline(&values)?
            }
            None => None,
        };
        let target_state = match matched {
            Some(t) => Some(target.data(t)?.state()),
            None => None,
        };

        let case = MergeCase::classify(src_state, target_state);
        let Some(t) = matched else {
            target.import_row(source, id)?;
            return Ok(case);
        };

        let dst = target.data(t)?.clone();
        let mut staged = Vec::new();
        match self.stage_records(target, source, &src, &dst, case, &mut staged) {
            Ok((current, original)) => set_merge_records(target, t, current, original)?,
            Err(err) => {
                for record in staged {
                    target.free_record(record);
                }
                return Err(err);
            }
        }
        Ok(case)
    }

    /// Work out the merged `(current, original)` pair. Source data is copied
    /// into fresh records pushed onto `staged`; the destination row is not
    /// touched, so a failed copy leaves it exactly as it was.
    fn stage_records(
        &self,
        target: &mut Table,
        source: &Table,
        src: &RowData,
        dst: &RowData,
        case: MergeCase,
        staged: &mut Vec<RecordId>,
    ) -> Result<(Option<RecordId>, Option<RecordId>)> {
        let original = match src.original {
            Some(record) => Some(stage(target, source, record, staged)?),
            None => dst.original,
        };
        let current = match case {
            MergeCase::BothUnchanged if !self.preserve_changes => original,
            MergeCase::SourceDeleted if !self.preserve_changes => None,
            MergeCase::SourceChanged if !self.preserve_changes => match src.current {
                Some(record) if src.original == Some(record) => original,
                Some(record) => Some(stage(target, source, record, staged)?),
                None => dst.current,
            },
            _ => dst.current,
        };
        Ok((current, original))
    }
}

/// The source row's key, read through the target key's column names.
fn source_key_values(
    key: &Key,
    target: &Table,
    source: &Table,
    record: Option<RecordId>,
) -> Result<Vec<Value>> {
    let record = record.ok_or(Error::NoCurrentData)?;
    key.column_names(target)?
        .iter()
        .map(|name| {
            source
                .column(name)
                .map(|c| c.get(record))
                .ok_or_else(|| Error::ColumnNotFound(name.clone()))
        })
        .collect()
}

/// Copy a source record into a fresh target record.
fn stage(
    target: &mut Table,
    source: &Table,
    src: RecordId,
    staged: &mut Vec<RecordId>,
) -> Result<RecordId> {
    let record = target.import_record(source, src)?;
    staged.push(record);
    Ok(record)
}

/// Install the merged record pair on a row, purging records it no longer
/// holds. An open edit is left alone.
fn set_merge_records(
    target: &mut Table,
    id: RowId,
    current: Option<RecordId>,
    original: Option<RecordId>,
) -> Result<()> {
    let old = target.data(id)?.clone();
    {
        let data = target.data_mut(id)?;
        data.current = current;
        data.original = original;
    }
    let mut released = old.records();
    released.retain(|r| {
        Some(*r) != current && Some(*r) != original && Some(*r) != old.proposed
    });
    for record in released {
        target.free_record(record);
    }
    Ok(())
}

impl Set {
    /// Merge every table of `source` into this set. Missing tables are
    /// created from the source schema and missing relations re-created by
    /// name.
    pub fn merge(&mut self, source: &Set, preserve_changes: bool) -> Result<MergeReport> {
        let merger = Merger::new(preserve_changes);
        let mut report = MergeReport::default();

        for table in source.tables() {
            if self.table_with_schema(table.name(), table.schema()).is_none() {
                self.add_table(table.clone_schema())?;
            }
            let target = self
                .table_with_schema_mut(table.name(), table.schema())
                .ok_or_else(|| Error::TableNotFound(table.name().to_string()))?;
            report += merger.merge_table(target, table)?;
        }

        for relation in source.relations() {
            if self.relation(relation.name()).is_none() {
                let relation = relation.rebind(source, self)?;
                self.add_relation(relation)?;
            }
        }

        debug!(
            set = %self.name(),
            imported = report.imported,
            merged = report.merged,
            "merged set"
        );
        Ok(report)
    }
}
