//! # Tablesync Engine
//!
//! An in-memory, change-tracking relational data model for database
//! synchronization.
//!
//! This crate represents table schemas and rows independently of any
//! database engine, tracks every insert, update and delete so that only the
//! delta has to be transmitted, merges freshly read data into tables that
//! may hold unsaved local edits, and converts data to and from a compact
//! wire snapshot.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never touches files, network or databases
//! - **Single owner**: no internal locking; callers serialize shared access
//! - **Derived state**: a row's state is always computed from the record
//!   versions it holds, never stored
//!
//! ## Core Concepts
//!
//! ### Records and rows
//!
//! A [`Column`] stores one value per [`RecordId`]. A row holds up to three
//! record ids:
//! - `original` - the last accepted version
//! - `current` - the live version
//! - `proposed` - an open edit
//!
//! Its [`RowState`] (Detached, Unchanged, Added, Modified, Deleted) follows
//! from which of `original` and `current` are present and whether they
//! differ. Rows are read through [`Row`] and edited through [`RowMut`].
//!
//! ### Tables and sets
//!
//! A [`Table`] owns its columns, an optional primary [`Key`] and all row
//! storage. A [`Set`] owns tables and the [`Relation`]s between them and
//! pushes locale and case-sensitivity settings down to every table.
//!
//! ### Merging
//!
//! The [`Merger`] reconciles an external table into a local one:
//! - `preserve_changes = true` keeps pending local edits and only refreshes
//!   the baseline
//! - `preserve_changes = false` lets the source win
//!
//! ### Wire formats
//!
//! [`SetSurrogate`] describes a set schema by name only. [`SetSnapshot`]
//! carries row data as flat arrays led by a row-state code.
//!
//! ## Quick Start
//!
//! ```rust
//! use tablesync_engine::{Column, DataType, Key, Merger, RowState, Table, Value};
//!
//! // 1. Define a table
//! let mut local = Table::new("Customers");
//! local.add_column(Column::new("Id", DataType::Int32)).unwrap();
//! local.add_column(Column::new("Name", DataType::String)).unwrap();
//! let key = Key::new(&local, &["Id"]).unwrap();
//! local.set_primary_key(key).unwrap();
//!
//! // 2. Add a row and accept it
//! let id = local.add_values([Value::from(1), Value::from("Ada")]).unwrap();
//! local.accept_changes().unwrap();
//!
//! // 3. Edit it locally
//! local.row_mut(id).unwrap().set("Name", "Ada L.").unwrap();
//! assert_eq!(local.row(id).unwrap().state(), RowState::Modified);
//!
//! // 4. Merge a fresher remote copy, keeping the local edit
//! let mut remote = local.clone_schema();
//! remote.add_values([Value::from(1), Value::from("Ada Lovelace")]).unwrap();
//! remote.accept_changes().unwrap();
//!
//! Merger::new(true).merge_table(&mut local, &remote).unwrap();
//! let row = local.row(id).unwrap();
//! assert_eq!(row.get("Name").unwrap(), Value::from("Ada L."));
//! ```
//!
//! ## Change extraction
//!
//! Use [`Set::get_changes`] to obtain only the rows in a [`RowStates`] mask,
//! then [`Set::to_snapshot`] and [`Set::apply_snapshot`] to move them to a
//! peer with the same schema.

pub mod column;
pub mod config;
pub mod error;
pub mod key;
pub mod merge;
pub mod reader;
pub mod record;
pub mod relation;
pub mod row;
pub mod rowset;
pub mod schema;
pub mod set;
pub mod snapshot;
pub mod table;
pub mod value;
pub mod view;

// Re-export main types at crate root
pub use column::{AutoIncrement, Column, ColumnId};
pub use config::{Config, ConfigError, NamingConvention};
pub use error::{Error, Result};
pub use key::Key;
pub use merge::{MergeCase, MergeReport, Merger};
pub use reader::{RecordReader, RowsReader};
pub use record::{RecordId, RecordSequence, RowState, RowStates, RowVersion};
pub use relation::{RelatedRows, Relation};
pub use row::{Row, RowId, RowMut};
pub use rowset::RowSet;
pub use schema::{ColumnSurrogate, RelationSurrogate, SetSurrogate, TableSurrogate};
pub use set::Set;
pub use snapshot::{SetSnapshot, TableSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use table::Table;
pub use value::{DataType, Value};
pub use view::View;
