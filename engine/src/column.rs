//! Columns: typed per-record value storage for one field of a table.

use crate::{error::Result, DataType, Error, RecordId, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Stable identity of a column inside its table.
///
/// Ids are assigned when the column is added and never reused by that table,
/// so a [`Key`](crate::Key) built on a removed column fails to resolve
/// instead of silently pointing at another column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ColumnId(pub(crate) u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col{}", self.0)
    }
}

/// Generator of auto-increment values.
///
/// `current` is the next value to hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoIncrement {
    seed: i64,
    step: i64,
    current: i64,
}

impl AutoIncrement {
    pub fn new(seed: i64, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(Error::InvalidAutoIncrementStep);
        }
        Ok(Self {
            seed,
            step,
            current: seed,
        })
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    /// Change the step. Values already issued stay on the old progression and
    /// the next value moves onto the new one.
    pub fn set_step(&mut self, step: i64) -> Result<()> {
        if step == 0 {
            return Err(Error::InvalidAutoIncrementStep);
        }
        if self.step != step {
            if self.current != self.seed {
                self.current = self.current.wrapping_sub(self.step).wrapping_add(step);
            }
            self.step = step;
        }
        Ok(())
    }

    /// Change the seed. The generator restarts from it when nothing has been
    /// issued yet or when the new seed lies ahead of the next value.
    pub fn set_seed(&mut self, seed: i64) {
        if self.current == self.seed || self.is_ahead(seed) {
            self.current = seed;
        }
        self.seed = seed;
    }

    pub(crate) fn next_value(&mut self) -> i64 {
        let value = self.current;
        self.current = self.current.wrapping_add(self.step);
        value
    }

    /// Move past an externally supplied value so it is never generated again.
    pub(crate) fn absorb(&mut self, value: i64) {
        if value == self.current || self.is_ahead(value) {
            self.current = value.wrapping_add(self.step);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.seed;
    }

    fn is_ahead(&self, value: i64) -> bool {
        (self.step < 0 && value < self.current) || (self.step > 0 && self.current < value)
    }
}

/// One field of a table: its schema attributes plus a value per record id.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) id: ColumnId,
    name: String,
    data_type: DataType,
    allow_null: bool,
    unique: bool,
    read_only: bool,
    max_length: Option<usize>,
    precision: Option<u8>,
    scale: Option<u8>,
    original_type_name: Option<String>,
    is_unicode: bool,
    is_unsigned: bool,
    is_compute: bool,
    default_value: Option<Value>,
    auto_increment: Option<AutoIncrement>,
    storage: HashMap<RecordId, Value>,
}

impl Column {
    /// Create a nullable column of the given type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: ColumnId::default(),
            name: name.into(),
            data_type,
            allow_null: true,
            unique: false,
            read_only: false,
            max_length: None,
            precision: None,
            scale: None,
            original_type_name: None,
            is_unicode: false,
            is_unsigned: false,
            is_compute: false,
            default_value: None,
            auto_increment: None,
            storage: HashMap::new(),
        }
    }

    /// Builder-style: disallow null.
    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_original_type_name(mut self, name: impl Into<String>) -> Self {
        self.original_type_name = Some(name.into());
        self
    }

    pub fn with_unicode(mut self, is_unicode: bool) -> Self {
        self.is_unicode = is_unicode;
        self
    }

    pub fn with_unsigned(mut self, is_unsigned: bool) -> Self {
        self.is_unsigned = is_unsigned;
        self
    }

    pub fn with_compute(mut self, is_compute: bool) -> Self {
        self.is_compute = is_compute;
        self
    }

    /// Value given to new records when no auto-increment applies.
    /// Checked against the declared type when the column joins a table.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_auto_increment(mut self, auto_increment: AutoIncrement) -> Self {
        self.auto_increment = Some(auto_increment);
        self
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    pub fn scale(&self) -> Option<u8> {
        self.scale
    }

    pub fn original_type_name(&self) -> Option<&str> {
        self.original_type_name.as_deref()
    }

    pub fn is_unicode(&self) -> bool {
        self.is_unicode
    }

    pub fn is_unsigned(&self) -> bool {
        self.is_unsigned
    }

    pub fn is_compute(&self) -> bool {
        self.is_compute
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn auto_increment(&self) -> Option<&AutoIncrement> {
        self.auto_increment.as_ref()
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment.is_some()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn set_max_length(&mut self, max_length: Option<usize>) {
        self.max_length = max_length;
    }

    pub fn set_auto_increment_step(&mut self, step: i64) -> Result<()> {
        match &mut self.auto_increment {
            Some(auto) => auto.set_step(step),
            None => {
                self.auto_increment = Some(AutoIncrement::new(0, step)?);
                Ok(())
            }
        }
    }

    pub fn set_auto_increment_seed(&mut self, seed: i64) {
        match &mut self.auto_increment {
            Some(auto) => auto.set_seed(seed),
            None => self.auto_increment = AutoIncrement::new(seed, 1).ok(),
        }
    }

    pub(crate) fn set_allow_null(&mut self, allow_null: bool) {
        self.allow_null = allow_null;
    }

    pub(crate) fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    /// Validate attributes that can only be checked once, when the column
    /// joins a table.
    pub(crate) fn validate(&mut self) -> Result<()> {
        if let Some(default) = self.default_value.take() {
            self.default_value = Some(default.coerce(self.data_type)?);
        }
        if let Some(auto) = &self.auto_increment {
            if !self.data_type.is_integer() {
                return Err(Error::ConversionFailed {
                    value: format!("auto increment seed {}", auto.seed()),
                    target: self.data_type.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Value stored for `record`. A missing record reads as null when the
    /// column allows it, else as the type's default.
    pub fn get(&self, record: RecordId) -> Value {
        match self.storage.get(&record) {
            Some(value) => value.clone(),
            None if self.allow_null => Value::Null,
            None => self.data_type.default_value(),
        }
    }

    /// Whether anything is stored for `record`.
    pub fn has_record(&self, record: RecordId) -> bool {
        self.storage.contains_key(&record)
    }

    /// Number of records holding a non-null value.
    pub fn stored_records(&self) -> usize {
        self.storage.len()
    }

    /// Give a fresh record its initial value: the next auto-increment value,
    /// else the default value, else null.
    ///
    /// A generated value that does not fit the declared type fails with
    /// [`Error::ConversionFailed`] and leaves the generator where it was.
    pub(crate) fn init(&mut self, record: RecordId) -> Result<()> {
        self.storage.remove(&record);
        let initial = match &self.auto_increment {
            Some(auto) => Value::Int64(auto.current()).coerce(self.data_type)?,
            None => self.default_value.clone().unwrap_or(Value::Null),
        };
        if let Some(auto) = &mut self.auto_increment {
            auto.next_value();
        }
        if !initial.is_null() {
            self.storage.insert(record, initial);
        }
        Ok(())
    }

    /// Reject null for a column that does not allow it.
    pub(crate) fn check_null(&self, value: &Value) -> Result<()> {
        if value.is_null() && !self.allow_null {
            return Err(Error::NullNotAllowed(self.name.clone()));
        }
        Ok(())
    }

    /// Store a value for `record`, coerced to the declared type.
    ///
    /// Nullability is checked by the row edit protocol, not here; copies and
    /// imports write through this path unchecked.
    pub(crate) fn set(&mut self, record: RecordId, value: Value) -> Result<()> {
        let value = value.coerce(self.data_type)?;
        if let (Some(max_length), Some(len)) = (self.max_length, value.length()) {
            if self.data_type == DataType::String && len > max_length {
                return Err(Error::ValueTooLong {
                    column: self.name.clone(),
                    max_length,
                });
            }
        }
        if let (Some(auto), Some(v)) = (&mut self.auto_increment, value.as_i64()) {
            auto.absorb(v);
        }
        if value.is_null() {
            self.storage.remove(&record);
        } else {
            self.storage.insert(record, value);
        }
        Ok(())
    }

    /// Copy one record onto another within this column.
    pub(crate) fn copy_record(&mut self, src: RecordId, dst: RecordId) {
        match self.storage.get(&src).cloned() {
            Some(value) => {
                self.storage.insert(dst, value);
            }
            None => {
                self.storage.remove(&dst);
            }
        }
    }

    pub(crate) fn remove(&mut self, record: RecordId) {
        self.storage.remove(&record);
    }

    pub(crate) fn clear(&mut self) {
        self.storage.clear();
    }

    /// Compare two records of this column.
    pub fn compare(&self, a: RecordId, b: RecordId, case_sensitive: bool) -> Ordering {
        self.get(a).compare(&self.get(b), case_sensitive)
    }

    /// Compare a record against a literal, bringing the literal to the
    /// column's type first when possible.
    pub fn compare_to_literal(
        &self,
        record: RecordId,
        literal: &Value,
        case_sensitive: bool,
    ) -> Ordering {
        let literal = literal
            .clone()
            .coerce(self.data_type)
            .unwrap_or_else(|_| literal.clone());
        self.get(record).compare(&literal, case_sensitive)
    }

    /// Copy of the schema attributes without any stored data. The
    /// auto-increment generator restarts from its seed.
    pub fn clone_schema(&self) -> Column {
        let mut auto_increment = self.auto_increment.clone();
        if let Some(auto) = &mut auto_increment {
            auto.reset();
        }
        Column {
            id: ColumnId::default(),
            name: self.name.clone(),
            data_type: self.data_type,
            allow_null: self.allow_null,
            unique: self.unique,
            read_only: self.read_only,
            max_length: self.max_length,
            precision: self.precision,
            scale: self.scale,
            original_type_name: self.original_type_name.clone(),
            is_unicode: self.is_unicode,
            is_unsigned: self.is_unsigned,
            is_compute: self.is_compute,
            default_value: self.default_value.clone(),
            auto_increment,
            storage: HashMap::new(),
        }
    }
}
