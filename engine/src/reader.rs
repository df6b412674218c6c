//! Loading tables from forward-only record readers.

use crate::{error::Result, Column, DataType, RowId, Table, Value};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A forward-only source of records, such as a database cursor.
pub trait RecordReader {
    fn field_count(&self) -> usize;

    fn field_name(&self, index: usize) -> &str;

    fn field_type(&self, index: usize) -> DataType;

    /// Next record, or `None` once the reader is exhausted. Records hold one
    /// value per field.
    fn read(&mut self) -> Result<Option<Vec<Value>>>;
}

/// An in-memory [`RecordReader`].
#[derive(Debug, Clone, Default)]
pub struct RowsReader {
    fields: Vec<(String, DataType)>,
    rows: VecDeque<Vec<Value>>,
}

impl RowsReader {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = (S, DataType)>) -> Self {
        Self {
            fields: fields.into_iter().map(|(n, t)| (n.into(), t)).collect(),
            rows: VecDeque::new(),
        }
    }

    pub fn with_row<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.push_row(values);
        self
    }

    pub fn push_row<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) {
        self.rows
            .push_back(values.into_iter().map(Into::into).collect());
    }
}

impl RecordReader for RowsReader {
    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field_name(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |(name, _)| name)
    }

    fn field_type(&self, index: usize) -> DataType {
        self.fields
            .get(index)
            .map_or(DataType::String, |(_, data_type)| *data_type)
    }

    fn read(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

impl Table {
    /// Append every record of `reader` as an Unchanged row.
    ///
    /// A table without columns takes its columns from the reader. Fields
    /// are matched to columns by name; unmatched fields are ignored. When
    /// the reader exposes fewer fields than the table has columns nothing is
    /// loaded. Returns the number of rows appended.
    pub fn load<R: RecordReader + ?Sized>(&mut self, reader: &mut R) -> Result<usize> {
        if self.column_count() == 0 {
            for index in 0..reader.field_count() {
                self.add_column(Column::new(
                    reader.field_name(index),
                    reader.field_type(index),
                ))?;
            }
        }

        if reader.field_count() < self.column_count() {
            warn!(
                table = %self.name(),
                fields = reader.field_count(),
                columns = self.column_count(),
                "reader has fewer fields than the table has columns, nothing loaded"
            );
            return Ok(0);
        }

        let mapping: Vec<Option<usize>> = (0..reader.field_count())
            .map(|index| self.ordinal(reader.field_name(index)))
            .collect();

        let mut loaded = 0;
        while let Some(values) = reader.read()? {
            let id = self.new_row()?;
            if let Err(err) = self.load_row(id, &mapping, values) {
                self.remove_row(id)?;
                return Err(err);
            }
            loaded += 1;
        }

        debug!(table = %self.name(), rows = loaded, "loaded rows from reader");
        Ok(loaded)
    }

    fn load_row(&mut self, id: RowId, mapping: &[Option<usize>], values: Vec<Value>) -> Result<()> {
        {
            let mut row = self.row_mut(id)?;
            for (value, ordinal) in values.into_iter().zip(mapping) {
                if let Some(ordinal) = ordinal {
                    row.set_at(*ordinal, value)?;
                }
            }
        }
        self.add_row(id)?;
        self.row_mut(id)?.accept_changes()
    }
}
