//! Error types for the tablesync engine.

use thiserror::Error;

/// All possible errors from the tablesync engine.
///
/// Every error is a programmer or data-integrity failure: the operation that
/// raised it is aborted and nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // State violations
    #[error("deleted row information cannot be accessed through the row")]
    DeletedRowInaccessible,

    #[error("row has no original data to roll back to")]
    NoOriginalDataToRollback,

    #[error("row has no original data")]
    NoOriginalData,

    #[error("row has no current data")]
    NoCurrentData,

    #[error("row has no proposed data")]
    NoProposedData,

    #[error("row not found in table '{0}'")]
    RowNotFound(String),

    #[error("row already belongs to table '{0}'")]
    RowAlreadyInTable(String),

    #[error("row is detached from table '{0}'")]
    RowDetached(String),

    #[error("invalid row state: expected {expected}, got {actual}")]
    InvalidRowState { expected: String, actual: String },

    // Schema violations
    #[error("column '{0}' does not allow null")]
    NullNotAllowed(String),

    #[error("column '{0}' is read only")]
    ReadOnlyColumn(String),

    #[error("value for column '{column}' exceeds max length {max_length}")]
    ValueTooLong { column: String, max_length: usize },

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("relation not found: {0}")]
    RelationNotFound(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("duplicate table: {0}")]
    DuplicateTable(String),

    #[error("duplicate relation: {0}")]
    DuplicateRelation(String),

    #[error("column '{0}' is part of the primary key")]
    ColumnInKey(String),

    #[error("key must contain at least one column")]
    EmptyKey,

    #[error("key length mismatch: expected {expected}, got {actual}")]
    KeyLengthMismatch { expected: usize, actual: usize },

    #[error("key belongs to table '{key_table}', not '{table}'")]
    KeyTableMismatch { key_table: String, table: String },

    #[error("relation '{relation}' column types differ: {parent} vs {child}")]
    RelationTypeMismatch {
        relation: String,
        parent: String,
        child: String,
    },

    #[error("auto increment step cannot be zero")]
    InvalidAutoIncrementStep,

    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    #[error("table '{0}' has no primary key")]
    MissingPrimaryKey(String),

    #[error("table '{0}' is referenced by a relation")]
    TableInRelation(String),

    // Referential violations
    #[error("relation '{0}' links tables that are not members of the same set")]
    TablesNotInSameSet(String),

    #[error("relation '{0}' joins a key with itself")]
    SelfReferencingRelation(String),

    // Conversion violations
    #[error("cannot convert {value} to {target}")]
    ConversionFailed { value: String, target: String },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("snapshot row for table '{table}' has {actual} slots, expected {expected}")]
    SnapshotRowLength {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid row state code: {0}")]
    InvalidRowStateCode(i64),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
