//! Read-only, filtered and ordered projections of a table's rows.

use crate::{error::Result, Error, Row, RowId, RowStates, Table};
use std::cmp::Ordering;

/// A materialised list of rows from one table.
///
/// The row list is computed when the view is built; because the view
/// borrows its table immutably, it cannot go stale while it lives.
/// `filter` and `order_by*` consume the view and return a narrowed or
/// reordered one, leaving the table untouched.
#[derive(Debug, Clone)]
pub struct View<'a> {
    table: &'a Table,
    rows: Vec<RowId>,
}

impl<'a> View<'a> {
    /// Every attached row in insertion order.
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            rows: table.row_ids(),
        }
    }

    /// Attached rows whose state is in `states`.
    pub fn with_states(table: &'a Table, states: RowStates) -> Self {
        Self {
            table,
            rows: table.rows_with_state(states).map(|r| r.id()).collect(),
        }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn filter<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&Row<'a>) -> bool,
    {
        let table = self.table;
        let rows = self
            .rows
            .into_iter()
            .filter(|id| table.row(*id).is_ok_and(|row| predicate(&row)))
            .collect();
        Self { table, rows }
    }

    /// Stable sort by an arbitrary row comparison.
    pub fn order_by<F>(mut self, mut compare: F) -> Self
    where
        F: FnMut(&Row<'a>, &Row<'a>) -> Ordering,
    {
        let table = self.table;
        let mut rows: Vec<Row<'a>> = self
            .rows
            .iter()
            .filter_map(|id| table.row(*id).ok())
            .collect();
        rows.sort_by(|a, b| compare(a, b));
        self.rows = rows.iter().map(Row::id).collect();
        self
    }

    /// Stable sort by a column's default-version value. Rows without a
    /// readable value (deleted rows) sort before all others when ascending.
    pub fn order_by_column(self, column: &str, descending: bool) -> Result<Self> {
        let column = self
            .table
            .column(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        let case_sensitive = self.table.is_case_sensitive();
        Ok(self.order_by(|a, b| {
            let ordering = match (a.get(column.name()), b.get(column.name())) {
                (Ok(x), Ok(y)) => x.compare(&y, case_sensitive),
                (Err(_), Ok(_)) => Ordering::Less,
                (Ok(_), Err(_)) => Ordering::Greater,
                (Err(_), Err(_)) => Ordering::Equal,
            };
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<Row<'a>> {
        self.rows.get(index).and_then(|id| self.table.row(*id).ok())
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'a>> + '_ {
        self.rows.iter().filter_map(|id| self.table.row(*id).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, DataType, RowState, Value};

    fn scores() -> Table {
        let mut table = Table::new("Scores");
        table.add_column(Column::new("Name", DataType::String)).unwrap();
        table.add_column(Column::new("Score", DataType::Int32)).unwrap();
        for (name, score) in [("bob", 7), ("Alice", 9), ("carol", 3), ("dave", 5)] {
            table.add_values([Value::from(name), Value::from(score)]).unwrap();
        }
        table.accept_changes().unwrap();
        table
    }

    fn names(view: &View<'_>) -> Vec<String> {
        view.rows()
            .map(|r| r.get("Name").unwrap().to_text())
            .collect()
    }

    #[test]
    fn filter_then_order_chain() {
        let table = scores();
        let view = View::new(&table)
            .filter(|row| row.get("Score").unwrap().as_i64().unwrap_or(0) > 4)
            .order_by_column("Score", true)
            .unwrap();
        assert_eq!(names(&view), vec!["Alice", "bob", "dave"]);
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn text_order_follows_case_sensitivity() {
        let table = scores();
        let view = View::new(&table).order_by_column("Name", false).unwrap();
        assert_eq!(names(&view), vec!["Alice", "bob", "carol", "dave"]);
    }

    #[test]
    fn with_states_selects_changed_rows() {
        let mut table = scores();
        let first = table.row_ids()[0];
        table.row_mut(first).unwrap().set("Score", 1).unwrap();
        let last = table.row_ids()[3];
        table.row_mut(last).unwrap().delete().unwrap();

        let view = View::with_states(&table, RowState::Modified | RowState::Deleted);
        assert_eq!(view.len(), 2);

        let ordered = view.order_by_column("Score", false).unwrap();
        assert_eq!(ordered.get(0).unwrap().state(), RowState::Deleted);
        assert_eq!(ordered.get(1).unwrap().id(), first);
    }

    #[test]
    fn unknown_column_rejected() {
        let table = scores();
        assert!(matches!(
            View::new(&table).order_by_column("Missing", false),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(View::new(&Table::new("Empty")).is_empty());
    }
}
