//! Keys: ordered column tuples used for primary keys and relation endpoints.

use crate::{error::Result, Column, ColumnId, Error, RecordId, Row, RowVersion, Table, Value};
use std::cmp::Ordering;

/// An ordered list of columns from one table.
///
/// A key only references its columns; it never owns them. Equality (`==`)
/// is element-wise and order-dependent, while [`Key::columns_equal`] compares
/// the column sets regardless of order. Relation validation relies on the
/// latter; lookups rely on the column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    table: String,
    schema: String,
    columns: Vec<ColumnId>,
}

impl Key {
    /// Build a key over the named columns of `table`.
    pub fn new(table: &Table, column_names: &[&str]) -> Result<Key> {
        if column_names.is_empty() {
            return Err(Error::EmptyKey);
        }
        let columns = column_names
            .iter()
            .map(|name| {
                table
                    .column(name)
                    .map(Column::id)
                    .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Key {
            table: table.name().to_string(),
            schema: table.schema().to_string(),
            columns,
        })
    }

    /// Build the same key, by column names, over another table.
    pub fn rebind(&self, from: &Table, to: &Table) -> Result<Key> {
        let names = self.column_names(from)?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        Key::new(to, &names)
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn table_schema(&self) -> &str {
        &self.schema
    }

    pub fn column_ids(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: ColumnId) -> bool {
        self.columns.contains(&column)
    }

    /// Whether this key was built on `table`.
    pub fn belongs_to(&self, table: &Table) -> bool {
        self.table == table.name() && self.schema == table.schema()
    }

    /// Order-independent comparison of the underlying column sets.
    pub fn columns_equal(&self, other: &Key) -> bool {
        if self.table != other.table || self.schema != other.schema {
            return false;
        }
        if self.columns.len() != other.columns.len() {
            return false;
        }
        let mut mine = self.columns.clone();
        let mut theirs = other.columns.clone();
        mine.sort();
        theirs.sort();
        mine == theirs
    }

    /// Resolve the key's columns in `table`, in key order.
    pub fn columns<'a>(&self, table: &'a Table) -> Result<Vec<&'a Column>> {
        if !self.belongs_to(table) {
            return Err(Error::KeyTableMismatch {
                key_table: self.table.clone(),
                table: table.name().to_string(),
            });
        }
        self.columns
            .iter()
            .map(|id| {
                table
                    .column_by_id(*id)
                    .ok_or_else(|| Error::ColumnNotFound(id.to_string()))
            })
            .collect()
    }

    pub fn column_names(&self, table: &Table) -> Result<Vec<String>> {
        Ok(self
            .columns(table)?
            .into_iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    /// Current literal tuple stored for `record`.
    pub fn key_values(&self, table: &Table, record: RecordId) -> Result<Vec<Value>> {
        Ok(self
            .columns(table)?
            .into_iter()
            .map(|c| c.get(record))
            .collect())
    }

    /// Compare `record` against literal values, column by column, stopping
    /// at the first mismatch.
    pub fn values_equal(&self, table: &Table, record: RecordId, values: &[Value]) -> Result<bool> {
        if values.len() != self.columns.len() {
            return Err(Error::KeyLengthMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        let case_sensitive = table.is_case_sensitive();
        for (column, value) in self.columns(table)?.into_iter().zip(values) {
            if column.compare_to_literal(record, value, case_sensitive) != Ordering::Equal {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Compare a row's default version against literal values.
    pub fn row_values_equal(&self, row: &Row<'_>, values: &[Value]) -> Result<bool> {
        let record = row.record(RowVersion::Default)?;
        self.values_equal(row.table(), record, values)
    }

    /// Compare two records of the same table over the key columns.
    pub fn records_equal(&self, table: &Table, a: RecordId, b: RecordId) -> Result<bool> {
        let case_sensitive = table.is_case_sensitive();
        for column in self.columns(table)? {
            if column.compare(a, b, case_sensitive) != Ordering::Equal {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataType;

    fn orders() -> Table {
        let mut table = Table::new("Orders");
        table.add_column(Column::new("OrderId", DataType::Int32)).unwrap();
        table.add_column(Column::new("LineId", DataType::Int32)).unwrap();
        table.add_column(Column::new("Product", DataType::String)).unwrap();
        table
    }

    #[test]
    fn columns_equal_ignores_order_but_eq_does_not() {
        let table = orders();
        let a = Key::new(&table, &["OrderId", "LineId"]).unwrap();
        let b = Key::new(&table, &["LineId", "OrderId"]).unwrap();

        assert!(a.columns_equal(&b));
        assert_ne!(a, b);
        assert_eq!(a, Key::new(&table, &["OrderId", "LineId"]).unwrap());
    }

    #[test]
    fn unknown_column_rejected() {
        let table = orders();
        assert!(matches!(
            Key::new(&table, &["Missing"]),
            Err(Error::ColumnNotFound(c)) if c == "Missing"
        ));
        assert!(matches!(Key::new(&table, &[]), Err(Error::EmptyKey)));
    }

    #[test]
    fn values_equal_short_circuits_and_checks_length() {
        let mut table = orders();
        let id = table.new_row().unwrap();
        {
            let mut row = table.row_mut(id).unwrap();
            row.set("OrderId", 10).unwrap();
            row.set("LineId", 2).unwrap();
        }
        table.add_row(id).unwrap();

        let key = Key::new(&table, &["OrderId", "LineId"]).unwrap();
        let row = table.row(id).unwrap();

        assert!(key
            .row_values_equal(&row, &[Value::Int64(10), Value::Int64(2)])
            .unwrap());
        assert!(!key
            .row_values_equal(&row, &[Value::Int64(10), Value::Int64(3)])
            .unwrap());
        assert!(matches!(
            key.row_values_equal(&row, &[Value::Int32(10)]),
            Err(Error::KeyLengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn records_equal_compares_key_columns_only() {
        let mut table = orders();
        let mut ids = Vec::new();
        for product in ["Tea", "Coffee"] {
            let id = table.new_row().unwrap();
            {
                let mut row = table.row_mut(id).unwrap();
                row.set("OrderId", 1).unwrap();
                row.set("LineId", 1).unwrap();
                row.set("Product", product).unwrap();
            }
            table.add_row(id).unwrap();
            ids.push(id);
        }

        let key = Key::new(&table, &["OrderId", "LineId"]).unwrap();
        let a = table.row(ids[0]).unwrap().record(RowVersion::Current).unwrap();
        let b = table.row(ids[1]).unwrap().record(RowVersion::Current).unwrap();
        assert!(key.records_equal(&table, a, b).unwrap());

        let product = Key::new(&table, &["Product"]).unwrap();
        assert!(!product.records_equal(&table, a, b).unwrap());
    }

    #[test]
    fn key_from_other_table_rejected() {
        let orders = orders();
        let mut lines = Table::new("Lines");
        lines.add_column(Column::new("OrderId", DataType::Int32)).unwrap();

        let key = Key::new(&orders, &["OrderId"]).unwrap();
        assert!(matches!(
            key.columns(&lines),
            Err(Error::KeyTableMismatch { .. })
        ));

        let rebound = key.rebind(&orders, &lines).unwrap();
        assert!(rebound.belongs_to(&lines));
    }
}
