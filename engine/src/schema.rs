//! Schema surrogates: serializer-friendly descriptions of columns, tables,
//! relations and sets.
//!
//! Surrogates reference tables and columns by name only, so a whole [`Set`]
//! schema can be rebuilt on a remote peer without shared object identity.

use crate::{
    error::Result, AutoIncrement, Column, DataType, Error, Key, NamingConvention, Relation, Set,
    Table, Value,
};
use serde::{Deserialize, Serialize};

/// Flat description of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSurrogate {
    pub name: String,
    /// Declared type name, as rendered by [`DataType::name`]
    pub data_type: String,
    /// Provider type name the column was read with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_type_name: Option<String>,
    pub allow_null: bool,
    pub unique: bool,
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,
    pub is_unicode: bool,
    pub is_unsigned: bool,
    pub is_compute: bool,
    pub auto_increment: bool,
    pub auto_increment_seed: i64,
    pub auto_increment_step: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    pub ordinal: usize,
}

impl ColumnSurrogate {
    pub fn from_column(column: &Column, ordinal: usize) -> Self {
        let (seed, step) = column
            .auto_increment()
            .map_or((0, 1), |a| (a.seed(), a.step()));
        Self {
            name: column.name().to_string(),
            data_type: column.data_type().name().to_string(),
            original_type_name: column.original_type_name().map(str::to_string),
            allow_null: column.allow_null(),
            unique: column.is_unique(),
            read_only: column.is_read_only(),
            max_length: column.max_length(),
            precision: column.precision(),
            scale: column.scale(),
            is_unicode: column.is_unicode(),
            is_unsigned: column.is_unsigned(),
            is_compute: column.is_compute(),
            auto_increment: column.is_auto_increment(),
            auto_increment_seed: seed,
            auto_increment_step: step,
            default_value: column.default_value().cloned(),
            ordinal,
        }
    }

    /// Rebuild a typed column. Unknown type names fail with
    /// [`Error::UnknownDataType`].
    pub fn to_column(&self) -> Result<Column> {
        let data_type: DataType = self.data_type.parse()?;
        let mut column = Column::new(self.name.clone(), data_type)
            .with_allow_null(self.allow_null)
            .with_unicode(self.is_unicode)
            .with_unsigned(self.is_unsigned)
            .with_compute(self.is_compute);
        if self.unique {
            column = column.unique();
        }
        if self.read_only {
            column = column.read_only();
        }
        if let Some(max_length) = self.max_length {
            column = column.with_max_length(max_length);
        }
        if let (Some(precision), Some(scale)) = (self.precision, self.scale) {
            column = column.with_precision(precision, scale);
        }
        if let Some(name) = &self.original_type_name {
            column = column.with_original_type_name(name.clone());
        }
        if let Some(value) = &self.default_value {
            column = column.with_default(value.clone());
        }
        if self.auto_increment {
            column = column.with_auto_increment(AutoIncrement::new(
                self.auto_increment_seed,
                self.auto_increment_step,
            )?);
        }
        Ok(column)
    }
}

/// Flat description of one table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSurrogate {
    pub name: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_provider: Option<String>,
    pub columns: Vec<ColumnSurrogate>,
    /// Primary key column names, in key order
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableSurrogate {
    pub fn from_table(table: &Table) -> Result<Self> {
        let primary_key = match table.primary_key() {
            Some(key) => key.column_names(table)?,
            None => Vec::new(),
        };
        Ok(Self {
            name: table.name().to_string(),
            schema: table.schema().to_string(),
            original_provider: table.original_provider().map(str::to_string),
            columns: table
                .columns()
                .iter()
                .enumerate()
                .map(|(ordinal, c)| ColumnSurrogate::from_column(c, ordinal))
                .collect(),
            primary_key,
        })
    }

    /// Rebuild an empty table. Columns are restored in ordinal order.
    pub fn to_table(&self) -> Result<Table> {
        let mut table = Table::with_schema(self.name.clone(), self.schema.clone());
        table.set_original_provider(self.original_provider.clone());

        let mut columns: Vec<&ColumnSurrogate> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.ordinal);
        for column in columns {
            table.add_column(column.to_column()?)?;
        }

        if !self.primary_key.is_empty() {
            let names: Vec<&str> = self.primary_key.iter().map(String::as_str).collect();
            let key = Key::new(&table, &names)?;
            table.set_primary_key(key)?;
        }
        Ok(table)
    }
}

/// A relation described by table and column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationSurrogate {
    pub name: String,
    pub parent_table: String,
    #[serde(default)]
    pub parent_schema: String,
    pub parent_columns: Vec<String>,
    pub child_table: String,
    #[serde(default)]
    pub child_schema: String,
    pub child_columns: Vec<String>,
}

impl RelationSurrogate {
    pub fn from_relation(relation: &Relation, set: &Set) -> Result<Self> {
        let parent = relation.parent_table(set)?;
        let child = relation.child_table(set)?;
        Ok(Self {
            name: relation.name().to_string(),
            parent_table: parent.name().to_string(),
            parent_schema: parent.schema().to_string(),
            parent_columns: relation.parent_key().column_names(parent)?,
            child_table: child.name().to_string(),
            child_schema: child.schema().to_string(),
            child_columns: relation.child_key().column_names(child)?,
        })
    }

    /// Rebuild the relation over the tables of `set`. The result is not
    /// validated until it is added to a set.
    pub fn to_relation(&self, set: &Set) -> Result<Relation> {
        let parent = set
            .table_with_schema(&self.parent_table, &self.parent_schema)
            .ok_or_else(|| Error::TableNotFound(self.parent_table.clone()))?;
        let child = set
            .table_with_schema(&self.child_table, &self.child_schema)
            .ok_or_else(|| Error::TableNotFound(self.child_table.clone()))?;

        let parent_columns: Vec<&str> = self.parent_columns.iter().map(String::as_str).collect();
        let child_columns: Vec<&str> = self.child_columns.iter().map(String::as_str).collect();
        Ok(Relation::new(
            self.name.clone(),
            Key::new(parent, &parent_columns)?,
            Key::new(child, &child_columns)?,
        ))
    }
}

/// Schema of a whole set: tables, columns, keys and relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSurrogate {
    pub name: String,
    pub locale: String,
    pub case_sensitive: bool,
    #[serde(default)]
    pub naming: NamingConvention,
    pub tables: Vec<TableSurrogate>,
    #[serde(default)]
    pub relations: Vec<RelationSurrogate>,
}

impl SetSurrogate {
    pub fn from_set(set: &Set) -> Result<Self> {
        Ok(Self {
            name: set.name().to_string(),
            locale: set.locale().to_string(),
            case_sensitive: set.is_case_sensitive(),
            naming: set.naming().clone(),
            tables: set
                .tables()
                .iter()
                .map(TableSurrogate::from_table)
                .collect::<Result<_>>()?,
            relations: set
                .relations()
                .iter()
                .map(|r| RelationSurrogate::from_relation(r, set))
                .collect::<Result<_>>()?,
        })
    }

    /// Rebuild the set schema, without rows.
    pub fn to_set(&self) -> Result<Set> {
        let mut set = Set::new(self.name.clone());
        set.set_locale(self.locale.clone());
        set.set_case_sensitive(self.case_sensitive);
        set.set_naming(self.naming.clone());

        for table in &self.tables {
            set.add_table(table.to_table()?)?;
        }
        for relation in &self.relations {
            let relation = relation.to_relation(&set)?;
            set.add_relation(relation)?;
        }
        Ok(set)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}
