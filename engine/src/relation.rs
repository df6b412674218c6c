//! Relations: named parent/child key pairs between tables of one set.

use crate::{error::Result, Error, Key, RowId, RowVersion, Set, Table, Value};

/// A foreign-key style link from a parent key to a child key.
///
/// A relation references its tables by name and never owns them. It is
/// validated against its [`Set`] when added to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    parent_key: Key,
    child_key: Key,
}

/// Rows reached by navigating a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelatedRows {
    /// The starting row's key is entirely null, so it has no related rows
    /// by definition.
    NullKey,
    Rows(Vec<RowId>),
}

impl RelatedRows {
    pub fn rows(&self) -> &[RowId] {
        match self {
            RelatedRows::NullKey => &[],
            RelatedRows::Rows(rows) => rows,
        }
    }

    pub fn is_null_key(&self) -> bool {
        matches!(self, RelatedRows::NullKey)
    }
}

impl Relation {
    pub fn new(name: impl Into<String>, parent_key: Key, child_key: Key) -> Self {
        Self {
            name: name.into(),
            parent_key,
            child_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_key(&self) -> &Key {
        &self.parent_key
    }

    pub fn child_key(&self) -> &Key {
        &self.child_key
    }

    /// Whether either end of the relation lives in `table`.
    pub fn references(&self, table: &Table) -> bool {
        self.parent_key.belongs_to(table) || self.child_key.belongs_to(table)
    }

    pub fn parent_table<'a>(&self, set: &'a Set) -> Result<&'a Table> {
        self.table_of(set, &self.parent_key)
    }

    pub fn child_table<'a>(&self, set: &'a Set) -> Result<&'a Table> {
        self.table_of(set, &self.child_key)
    }

    fn table_of<'a>(&self, set: &'a Set, key: &Key) -> Result<&'a Table> {
        set.table_with_schema(key.table_name(), key.table_schema())
            .ok_or_else(|| Error::TablesNotInSameSet(self.name.clone()))
    }

    /// Validate the relation against the set that will hold it.
    pub fn check_state(&self, set: &Set) -> Result<()> {
        let parent = self.parent_table(set)?;
        let child = self.child_table(set)?;

        if self.parent_key.columns_equal(&self.child_key) {
            return Err(Error::SelfReferencingRelation(self.name.clone()));
        }
        if self.parent_key.len() != self.child_key.len() {
            return Err(Error::KeyLengthMismatch {
                expected: self.parent_key.len(),
                actual: self.child_key.len(),
            });
        }

        let parent_columns = self.parent_key.columns(parent)?;
        let child_columns = self.child_key.columns(child)?;
        for (p, c) in parent_columns.iter().zip(&child_columns) {
            if p.data_type() != c.data_type() {
                return Err(Error::RelationTypeMismatch {
                    relation: self.name.clone(),
                    parent: format!("{}.{} ({})", parent.name(), p.name(), p.data_type()),
                    child: format!("{}.{} ({})", child.name(), c.name(), c.data_type()),
                });
            }
        }
        Ok(())
    }

    /// Child rows whose key matches `parent_row`'s key at `version`.
    pub fn child_rows(
        &self,
        set: &Set,
        parent_row: RowId,
        version: RowVersion,
    ) -> Result<RelatedRows> {
        let parent = self.parent_table(set)?;
        let child = self.child_table(set)?;
        navigate(parent, &self.parent_key, parent_row, child, &self.child_key, version)
    }

    /// Parent rows whose key matches `child_row`'s key at `version`.
    pub fn parent_rows(
        &self,
        set: &Set,
        child_row: RowId,
        version: RowVersion,
    ) -> Result<RelatedRows> {
        let parent = self.parent_table(set)?;
        let child = self.child_table(set)?;
        navigate(child, &self.child_key, child_row, parent, &self.parent_key, version)
    }

    /// The same relation with its keys rebuilt, by column name, over the
    /// tables of another set.
    pub(crate) fn rebind(&self, from: &Set, to: &Set) -> Result<Relation> {
        let parent_key = self
            .parent_key
            .rebind(self.parent_table(from)?, self.parent_table(to)?)?;
        let child_key = self
            .child_key
            .rebind(self.child_table(from)?, self.child_table(to)?)?;
        Ok(Relation::new(self.name.clone(), parent_key, child_key))
    }
}

fn navigate(
    from: &Table,
    from_key: &Key,
    row: RowId,
    to: &Table,
    to_key: &Key,
    version: RowVersion,
) -> Result<RelatedRows> {
    let record = from.row(row)?.record(version)?;
    let values = from_key.key_values(from, record)?;
    if values.iter().all(Value::is_null) {
        return Ok(RelatedRows::NullKey);
    }

    let mut rows = Vec::new();
    for candidate in to.rows() {
        let Ok(record) = candidate.record(version) else {
            continue;
        };
        if to_key.values_equal(to, record, &values)? {
            rows.push(candidate.id());
        }
    }
    Ok(RelatedRows::Rows(rows))
}
