//! Sets: the root container of tables and relations.

use crate::{
    error::Result, Config, Error, NamingConvention, RelatedRows, Relation, RowId, RowStates,
    RowVersion, Table,
};
use tracing::debug;

/// A schema graph of tables and the relations between them.
///
/// Locale, case sensitivity and naming settings belong to the set and are
/// pushed down to every table it owns.
#[derive(Debug, Clone)]
pub struct Set {
    name: String,
    locale: String,
    case_sensitive: bool,
    naming: NamingConvention,
    tables: Vec<Table>,
    relations: Vec<Relation>,
}

impl Set {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(name, &Config::default())
    }

    pub fn from_config(name: impl Into<String>, config: &Config) -> Self {
        Self {
            name: name.into(),
            locale: config.locale.clone(),
            case_sensitive: config.case_sensitive,
            naming: config.naming.clone(),
            tables: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
        for table in &mut self.tables {
            table.set_locale(self.locale.clone());
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
        for table in &mut self.tables {
            table.set_case_sensitive(case_sensitive);
        }
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    pub fn set_naming(&mut self, naming: NamingConvention) {
        for table in &mut self.tables {
            table.set_naming(naming.clone());
        }
        self.naming = naming;
    }

    // ---- tables ----

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    fn position(&self, name: &str, schema: Option<&str>) -> Option<usize> {
        let schema_matches = |t: &Table| schema.map_or(true, |s| t.schema() == s);
        self.tables
            .iter()
            .position(|t| t.name() == name && schema_matches(t))
            .or_else(|| {
                if self.case_sensitive {
                    return None;
                }
                let lower = name.to_lowercase();
                self.tables
                    .iter()
                    .position(|t| t.name().to_lowercase() == lower && schema_matches(t))
            })
    }

    /// First table with this name, in any schema.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.position(name, None).map(|i| &self.tables[i])
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.position(name, None).map(move |i| &mut self.tables[i])
    }

    pub fn table_with_schema(&self, name: &str, schema: &str) -> Option<&Table> {
        self.position(name, Some(schema)).map(|i| &self.tables[i])
    }

    pub fn table_with_schema_mut(&mut self, name: &str, schema: &str) -> Option<&mut Table> {
        self.position(name, Some(schema))
            .map(move |i| &mut self.tables[i])
    }

    /// Take ownership of a table. The set's settings are applied to it.
    pub fn add_table(&mut self, mut table: Table) -> Result<()> {
        let duplicate = if self.case_sensitive {
            self.tables
                .iter()
                .any(|t| t.name() == table.name() && t.schema() == table.schema())
        } else {
            let lower = table.name().to_lowercase();
            self.tables
                .iter()
                .any(|t| t.name().to_lowercase() == lower && t.schema() == table.schema())
        };
        if duplicate {
            return Err(Error::DuplicateTable(table.name().to_string()));
        }
        table.set_locale(self.locale.clone());
        table.set_case_sensitive(self.case_sensitive);
        table.set_naming(self.naming.clone());
        self.tables.push(table);
        Ok(())
    }

    /// Remove a table. Tables still referenced by a relation are kept.
    pub fn remove_table(&mut self, name: &str) -> Result<Table> {
        let index = self
            .position(name, None)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        let table = &self.tables[index];
        if self.relations.iter().any(|r| r.references(table)) {
            return Err(Error::TableInRelation(table.name().to_string()));
        }
        Ok(self.tables.remove(index))
    }

    // ---- relations ----

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    pub fn add_relation(&mut self, relation: Relation) -> Result<()> {
        if self.relation(relation.name()).is_some() {
            return Err(Error::DuplicateRelation(relation.name().to_string()));
        }
        relation.check_state(self)?;
        self.relations.push(relation);
        Ok(())
    }

    pub fn remove_relation(&mut self, name: &str) -> Result<Relation> {
        let index = self
            .relations
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| Error::RelationNotFound(name.to_string()))?;
        Ok(self.relations.remove(index))
    }

    pub fn child_rows(
        &self,
        relation: &str,
        parent_row: RowId,
        version: RowVersion,
    ) -> Result<RelatedRows> {
        self.relation(relation)
            .ok_or_else(|| Error::RelationNotFound(relation.to_string()))?
            .child_rows(self, parent_row, version)
    }

    pub fn parent_rows(
        &self,
        relation: &str,
        child_row: RowId,
        version: RowVersion,
    ) -> Result<RelatedRows> {
        self.relation(relation)
            .ok_or_else(|| Error::RelationNotFound(relation.to_string()))?
            .parent_rows(self, child_row, version)
    }

    // ---- change tracking ----

    pub fn has_changes(&self, states: RowStates) -> bool {
        self.tables.iter().any(|t| t.has_changes(states))
    }

    /// A schema clone holding only rows whose state is in `states`, or
    /// `None` when no row matches.
    pub fn get_changes(&self, states: RowStates) -> Result<Option<Set>> {
        let mut changes = self.clone_schema();
        let mut total = 0;
        for (slot, table) in changes.tables.iter_mut().zip(&self.tables) {
            *slot = table.get_changes(states)?;
            total += slot.row_count();
        }
        debug!(set = %self.name, rows = total, "extracted set changes");
        Ok((total > 0).then_some(changes))
    }

    pub fn accept_changes(&mut self) -> Result<()> {
        for table in &mut self.tables {
            table.accept_changes()?;
        }
        Ok(())
    }

    pub fn reject_changes(&mut self) -> Result<()> {
        for table in &mut self.tables {
            table.reject_changes()?;
        }
        Ok(())
    }

    /// Drop every row of every table.
    pub fn clear(&mut self) {
        for table in &mut self.tables {
            table.clear();
        }
    }

    /// Copy of tables, columns and relations without rows.
    pub fn clone_schema(&self) -> Set {
        Set {
            name: self.name.clone(),
            locale: self.locale.clone(),
            case_sensitive: self.case_sensitive,
            naming: self.naming.clone(),
            tables: self.tables.iter().map(Table::clone_schema).collect(),
            relations: self.relations.clone(),
        }
    }

    /// Copy of schema and data.
    pub fn copy(&self) -> Set {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, DataType, Key, Value};

    fn set_with(names: &[&str]) -> Set {
        let mut set = Set::new("S");
        for name in names {
            let mut table = Table::new(*name);
            table.add_column(Column::new("Id", DataType::Int32)).unwrap();
            table.add_column(Column::new("ParentId", DataType::Int32)).unwrap();
            set.add_table(table).unwrap();
        }
        set
    }

    #[test]
    fn settings_cascade_to_tables() {
        let mut set = set_with(&["A"]);
        set.set_case_sensitive(true);
        set.set_locale("fr-FR");

        let mut late = Table::new("B");
        late.set_locale("xx");
        set.add_table(late).unwrap();

        for table in set.tables() {
            assert!(table.is_case_sensitive());
            assert_eq!(table.locale(), "fr-FR");
        }
    }

    #[test]
    fn from_config_applies_naming() {
        let mut config = Config::default();
        config.naming.tracking_tables_prefix = "sync_".into();
        let mut set = Set::from_config("S", &config);
        set.add_table(Table::new("Orders")).unwrap();

        assert_eq!(
            set.table("Orders").unwrap().tracking_table_name(),
            "sync_Orders_tracking"
        );
    }

    #[test]
    fn duplicate_table_names_follow_case_scope() {
        let mut set = set_with(&["Orders"]);
        assert!(matches!(
            set.add_table(Table::new("ORDERS")),
            Err(Error::DuplicateTable(_))
        ));
        set.add_table(Table::with_schema("Orders", "archive")).unwrap();
        assert_eq!(set.table_with_schema("orders", "archive").unwrap().schema(), "archive");

        set.set_case_sensitive(true);
        set.add_table(Table::new("ORDERS")).unwrap();
        assert_eq!(set.tables().len(), 3);
    }

    #[test]
    fn referenced_table_cannot_be_removed() {
        let mut set = set_with(&["Parent", "Child"]);
        let relation = Relation::new(
            "R",
            Key::new(set.table("Parent").unwrap(), &["Id"]).unwrap(),
            Key::new(set.table("Child").unwrap(), &["ParentId"]).unwrap(),
        );
        set.add_relation(relation.clone()).unwrap();
        assert!(matches!(
            set.add_relation(relation),
            Err(Error::DuplicateRelation(_))
        ));

        assert!(matches!(
            set.remove_table("Child"),
            Err(Error::TableInRelation(_))
        ));
        set.remove_relation("R").unwrap();
        set.remove_table("Child").unwrap();
        assert!(matches!(
            set.remove_table("Child"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn get_changes_returns_none_without_matching_rows() {
        let mut set = set_with(&["A", "B"]);
        assert!(set.get_changes(RowStates::CHANGES).unwrap().is_none());

        set.table_mut("B")
            .unwrap()
            .add_values([Value::from(1), Value::Null])
            .unwrap();
        assert!(set.has_changes(RowStates::ADDED));

        let changes = set.get_changes(RowStates::CHANGES).unwrap().unwrap();
        assert_eq!(changes.table("A").unwrap().row_count(), 0);
        assert_eq!(changes.table("B").unwrap().row_count(), 1);

        set.accept_changes().unwrap();
        assert!(!set.has_changes(RowStates::CHANGES));
        assert!(set.get_changes(RowStates::CHANGES).unwrap().is_none());
    }

    #[test]
    fn reject_and_clear() {
        let mut set = set_with(&["A"]);
        set.table_mut("A")
            .unwrap()
            .add_values([Value::from(1), Value::Null])
            .unwrap();
        let copy = set.copy();

        set.reject_changes().unwrap();
        assert_eq!(set.table("A").unwrap().row_count(), 0);
        assert_eq!(copy.table("A").unwrap().row_count(), 1);

        let mut copy = copy;
        copy.clear();
        assert_eq!(copy.table("A").unwrap().row_count(), 0);
        assert_eq!(copy.clone_schema().tables().len(), 1);
    }
}
