//! Cell values and declared column types.
//!
//! Every cell of every column is stored as a [`Value`], a closed tagged union
//! with one variant per supported scalar or binary kind. Columns declare a
//! [`DataType`] and every write goes through [`Value::coerce`], so a column
//! only ever holds values of its declared kind (or `Null`).

use crate::{error::Result, Error};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Text layout used for naive date-times on the wire.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Char,
    String,
    Guid,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Bytes,
}

impl DataType {
    /// Stable name used by schema surrogates.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Byte => "byte",
            DataType::SByte => "sbyte",
            DataType::Int16 => "int16",
            DataType::UInt16 => "uint16",
            DataType::Int32 => "int32",
            DataType::UInt32 => "uint32",
            DataType::Int64 => "int64",
            DataType::UInt64 => "uint64",
            DataType::Single => "single",
            DataType::Double => "double",
            DataType::Char => "char",
            DataType::String => "string",
            DataType::Guid => "guid",
            DataType::DateTime => "datetime",
            DataType::DateTimeOffset => "datetimeoffset",
            DataType::TimeSpan => "timespan",
            DataType::Bytes => "bytes",
        }
    }

    /// The value a non-nullable column reports for a record it never stored.
    pub fn default_value(&self) -> Value {
        match self {
            DataType::Boolean => Value::Boolean(false),
            DataType::Byte => Value::Byte(0),
            DataType::SByte => Value::SByte(0),
            DataType::Int16 => Value::Int16(0),
            DataType::UInt16 => Value::UInt16(0),
            DataType::Int32 => Value::Int32(0),
            DataType::UInt32 => Value::UInt32(0),
            DataType::Int64 => Value::Int64(0),
            DataType::UInt64 => Value::UInt64(0),
            DataType::Single => Value::Single(0.0),
            DataType::Double => Value::Double(0.0),
            DataType::Char => Value::Char('\0'),
            DataType::String => Value::String(String::new()),
            DataType::Guid => Value::Guid(Uuid::nil()),
            DataType::DateTime => Value::DateTime(NaiveDateTime::default()),
            DataType::DateTimeOffset => Value::DateTimeOffset(DateTime::<FixedOffset>::default()),
            DataType::TimeSpan => Value::TimeSpan(Duration::zero()),
            DataType::Bytes => Value::Bytes(Vec::new()),
        }
    }

    /// Whether values of this type can feed an auto-increment generator.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Byte
                | DataType::SByte
                | DataType::Int16
                | DataType::UInt16
                | DataType::Int32
                | DataType::UInt32
                | DataType::Int64
                | DataType::UInt64
        )
    }

    fn integer_value(&self, v: i128) -> Option<Value> {
        Some(match self {
            DataType::Byte => Value::Byte(u8::try_from(v).ok()?),
            DataType::SByte => Value::SByte(i8::try_from(v).ok()?),
            DataType::Int16 => Value::Int16(i16::try_from(v).ok()?),
            DataType::UInt16 => Value::UInt16(u16::try_from(v).ok()?),
            DataType::Int32 => Value::Int32(i32::try_from(v).ok()?),
            DataType::UInt32 => Value::UInt32(u32::try_from(v).ok()?),
            DataType::Int64 => Value::Int64(i64::try_from(v).ok()?),
            DataType::UInt64 => Value::UInt64(u64::try_from(v).ok()?),
            _ => return None,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => DataType::Boolean,
            "byte" => DataType::Byte,
            "sbyte" => DataType::SByte,
            "int16" => DataType::Int16,
            "uint16" => DataType::UInt16,
            "int32" => DataType::Int32,
            "uint32" => DataType::UInt32,
            "int64" => DataType::Int64,
            "uint64" => DataType::UInt64,
            "single" => DataType::Single,
            "double" => DataType::Double,
            "char" => DataType::Char,
            "string" => DataType::String,
            "guid" => DataType::Guid,
            "datetime" => DataType::DateTime,
            "datetimeoffset" => DataType::DateTimeOffset,
            "timespan" => DataType::TimeSpan,
            "bytes" => DataType::Bytes,
            _ => return Err(Error::UnknownDataType(s.to_string())),
        };
        Ok(ty)
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Char(char),
    String(String),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeSpan(Duration),
    Bytes(Vec<u8>),
}

impl Value {
    /// Declared type this value belongs to, `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => DataType::Boolean,
            Value::Byte(_) => DataType::Byte,
            Value::SByte(_) => DataType::SByte,
            Value::Int16(_) => DataType::Int16,
            Value::UInt16(_) => DataType::UInt16,
            Value::Int32(_) => DataType::Int32,
            Value::UInt32(_) => DataType::UInt32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt64(_) => DataType::UInt64,
            Value::Single(_) => DataType::Single,
            Value::Double(_) => DataType::Double,
            Value::Char(_) => DataType::Char,
            Value::String(_) => DataType::String,
            Value::Guid(_) => DataType::Guid,
            Value::DateTime(_) => DataType::DateTime,
            Value::DateTimeOffset(_) => DataType::DateTimeOffset,
            Value::TimeSpan(_) => DataType::TimeSpan,
            Value::Bytes(_) => DataType::Bytes,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of any integral value.
    pub fn as_i64(&self) -> Option<i64> {
        self.integer().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Single(f) => Some(f64::from(*f)),
            Value::Double(f) => Some(*f),
            other => other.integer().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(g) => Some(*g),
            _ => None,
        }
    }

    fn integer(&self) -> Option<i128> {
        Some(match self {
            Value::Byte(v) => i128::from(*v),
            Value::SByte(v) => i128::from(*v),
            Value::Int16(v) => i128::from(*v),
            Value::UInt16(v) => i128::from(*v),
            Value::Int32(v) => i128::from(*v),
            Value::UInt32(v) => i128::from(*v),
            Value::Int64(v) => i128::from(*v),
            Value::UInt64(v) => i128::from(*v),
            _ => return None,
        })
    }

    /// Character count for text, byte count for binaries.
    pub(crate) fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }

    fn conversion_error(&self, target: DataType) -> Error {
        Error::ConversionFailed {
            value: format!("{:?}", self),
            target: target.to_string(),
        }
    }

    /// Convert this value to `target`.
    ///
    /// Serializers narrow or widen scalars (a guid becomes text, a 16-bit
    /// integer comes back as a 64-bit one), so every value entering a column
    /// is brought back to the column's declared type here:
    ///
    /// - `Null` and values already of the target type pass through.
    /// - Integers convert between widths when the value fits.
    /// - Integers and floats widen to `Single`/`Double`; integral floats
    ///   narrow to integers.
    /// - Text parses into numbers, booleans, chars, guids and dates.
    /// - Integers become time spans (nanoseconds).
    /// - Any value renders to `String`; a guid renders to 16 `Bytes`.
    ///
    /// Everything else fails with [`Error::ConversionFailed`].
    pub fn coerce(self, target: DataType) -> Result<Value> {
        if self.is_null() || self.data_type() == Some(target) {
            return Ok(self);
        }

        let converted = match target {
            DataType::Boolean => match &self {
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Some(Value::Boolean(true)),
                    "false" | "0" => Some(Value::Boolean(false)),
                    _ => None,
                },
                other => other.integer().map(|v| Value::Boolean(v != 0)),
            },
            t if t.is_integer() => self.integral().and_then(|v| t.integer_value(v)),
            DataType::Single => match &self {
                Value::String(s) => s.trim().parse::<f32>().ok().map(Value::Single),
                other => other.as_f64().map(|f| Value::Single(f as f32)),
            },
            DataType::Double => match &self {
                Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Double),
                other => other.as_f64().map(Value::Double),
            },
            DataType::Char => match &self {
                Value::String(s) => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(Value::Char(c)),
                        _ => None,
                    }
                }
                other => other
                    .integer()
                    .and_then(|v| u32::try_from(v).ok())
                    .and_then(char::from_u32)
                    .map(Value::Char),
            },
            DataType::String => match &self {
                Value::Bytes(_) => None,
                other => Some(Value::String(other.to_text())),
            },
            DataType::Guid => match &self {
                Value::String(s) => Uuid::parse_str(s.trim()).ok().map(Value::Guid),
                Value::Bytes(b) => Uuid::from_slice(b).ok().map(Value::Guid),
                _ => None,
            },
            DataType::DateTime => match &self {
                Value::String(s) => parse_naive(s.trim()).map(Value::DateTime),
                Value::DateTimeOffset(dt) => Some(Value::DateTime(dt.naive_local())),
                _ => None,
            },
            DataType::DateTimeOffset => match &self {
                Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(Value::DateTimeOffset),
                Value::DateTime(dt) => {
                    Some(Value::DateTimeOffset(Utc.fix().from_utc_datetime(dt)))
                }
                _ => None,
            },
            DataType::TimeSpan => match &self {
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .map(|n| Value::TimeSpan(Duration::nanoseconds(n))),
                other => other.as_i64().map(|n| Value::TimeSpan(Duration::nanoseconds(n))),
            },
            DataType::Bytes => match &self {
                Value::Guid(g) => Some(Value::Bytes(g.as_bytes().to_vec())),
                _ => None,
            },
            _ => None,
        };

        converted.ok_or_else(|| self.conversion_error(target))
    }

    /// Integral view used when narrowing to an integer column.
    fn integral(&self) -> Option<i128> {
        match self {
            Value::Boolean(b) => Some(i128::from(*b)),
            Value::Char(c) => Some(i128::from(u32::from(*c))),
            Value::Single(f) => integral_float(f64::from(*f)),
            Value::Double(f) => integral_float(*f),
            Value::String(s) => s.trim().parse::<i128>().ok(),
            other => other.integer(),
        }
    }

    /// Render as text, the way a `String` column stores a converted value.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::SByte(v) => v.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::UInt16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::UInt32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Single(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Char(c) => c.to_string(),
            Value::String(s) => s.clone(),
            Value::Guid(g) => g.to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Value::DateTimeOffset(dt) => dt.to_rfc3339(),
            Value::TimeSpan(d) => d.num_nanoseconds().unwrap_or(i64::MAX).to_string(),
            Value::Bytes(b) => format!("{:?}", b),
        }
    }

    /// Compare two values. `Null` sorts before any value; text honours
    /// `case_sensitive`.
    pub fn compare(&self, other: &Value, case_sensitive: bool) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::String(a), Value::String(b)) => compare_text(a, b, case_sensitive),
            (Value::Char(a), Value::Char(b)) if !case_sensitive => {
                compare_text(&a.to_string(), &b.to_string(), false)
            }
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Single(a), Value::Single(b)) => a.total_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::Guid(a), Value::Guid(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => a.cmp(b),
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (a, b) => match (a.integer(), b.integer()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    _ => a.rank().cmp(&b.rank()),
                },
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Byte(_)
            | Value::SByte(_)
            | Value::Int16(_)
            | Value::UInt16(_)
            | Value::Int32(_)
            | Value::UInt32(_)
            | Value::Int64(_)
            | Value::UInt64(_)
            | Value::Single(_)
            | Value::Double(_) => 2,
            Value::Char(_) | Value::String(_) => 3,
            Value::Guid(_) => 4,
            Value::DateTime(_) | Value::DateTimeOffset(_) => 5,
            Value::TimeSpan(_) => 6,
            Value::Bytes(_) => 7,
        }
    }
}

fn integral_float(f: f64) -> Option<i128> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38 {
        Some(f as i128)
    } else {
        None
    }
}

fn compare_text(a: &str, b: &str, case_sensitive: bool) -> Ordering {
    if case_sensitive {
        a.cmp(b)
    } else {
        a.to_lowercase().cmp(&b.to_lowercase())
    }
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            other => f.write_str(&other.to_text()),
        }
    }
}

/// Text form of a NaN or infinite float. JSON has no literal for these, and
/// the text parses back through [`Value::coerce`].
fn non_finite(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Byte(v) => serializer.serialize_u8(*v),
            Value::SByte(v) => serializer.serialize_i8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::UInt16(v) => serializer.serialize_u16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Single(v) if !v.is_finite() => {
                serializer.serialize_str(non_finite(f64::from(*v)))
            }
            Value::Single(v) => serializer.serialize_f32(*v),
            Value::Double(v) if !v.is_finite() => serializer.serialize_str(non_finite(*v)),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::String(s) => serializer.serialize_str(s),
            Value::Guid(g) => serializer.collect_str(g),
            Value::DateTime(dt) => serializer.collect_str(&dt.format(DATETIME_FORMAT)),
            Value::DateTimeOffset(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::TimeSpan(d) => match d.num_nanoseconds() {
                Some(n) => serializer.serialize_i64(n),
                None => Err(serde::ser::Error::custom("time span out of range")),
            },
            Value::Bytes(b) => serializer.serialize_bytes(b),
        }
    }
}

/// Deserializes into the generic wide forms; callers coerce to the
/// declared column type afterwards.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, a string or a byte array")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Value, D::Error> {
        Value::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int64(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(match i64::try_from(v) {
            Ok(v) => Value::Int64(v),
            Err(_) => Value::UInt64(v),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Double(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> std::result::Result<Value, E> {
        Ok(Value::Char(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Value, E> {
        Ok(Value::Bytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(Value::Bytes(bytes))
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    u8 => Byte,
    i8 => SByte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Single,
    f64 => Double,
    char => Char,
    String => String,
    Uuid => Guid,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    Duration => TimeSpan,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_nano_opt(13, 45, 10, 123_456_789)
            .unwrap()
    }

    #[test]
    fn data_type_names_roundtrip() {
        for ty in [
            DataType::Boolean,
            DataType::Int16,
            DataType::UInt64,
            DataType::Guid,
            DataType::DateTimeOffset,
            DataType::Bytes,
        ] {
            assert_eq!(ty.name().parse::<DataType>().unwrap(), ty);
        }
        assert!(matches!(
            "decimal".parse::<DataType>(),
            Err(Error::UnknownDataType(t)) if t == "decimal"
        ));
    }

    #[test]
    fn coerce_narrows_integers_with_range_check() {
        assert_eq!(
            Value::Int64(42).coerce(DataType::Int16).unwrap(),
            Value::Int16(42)
        );
        assert!(matches!(
            Value::Int64(70_000).coerce(DataType::Int16),
            Err(Error::ConversionFailed { .. })
        ));
        assert!(Value::Int64(-1).coerce(DataType::Byte).is_err());
    }

    #[test]
    fn coerce_text_to_guid_and_dates() {
        let guid = Uuid::new_v4();
        assert_eq!(
            Value::String(guid.to_string())
                .coerce(DataType::Guid)
                .unwrap(),
            Value::Guid(guid)
        );

        let dt = sample_datetime();
        let text = Value::DateTime(dt).to_text();
        assert_eq!(
            Value::String(text).coerce(DataType::DateTime).unwrap(),
            Value::DateTime(dt)
        );
    }

    #[test]
    fn coerce_float_to_integer_only_when_integral() {
        assert_eq!(
            Value::Double(12.0).coerce(DataType::Int32).unwrap(),
            Value::Int32(12)
        );
        assert!(Value::Double(12.5).coerce(DataType::Int32).is_err());
    }

    #[test]
    fn coerce_null_passes_through() {
        assert_eq!(Value::Null.coerce(DataType::Guid).unwrap(), Value::Null);
    }

    #[test]
    fn coerce_rejects_unsupported() {
        let err = Value::Bytes(vec![1, 2]).coerce(DataType::Int32).unwrap_err();
        assert!(matches!(err, Error::ConversionFailed { target, .. } if target == "int32"));
    }

    #[test]
    fn null_sorts_first() {
        assert_eq!(Value::Null.compare(&Value::Int32(-5), true), Ordering::Less);
        assert_eq!(Value::Int32(-5).compare(&Value::Null, true), Ordering::Greater);
        assert_eq!(Value::Null.compare(&Value::Null, true), Ordering::Equal);
    }

    #[test]
    fn text_comparison_respects_case_sensitivity() {
        let a = Value::from("alice");
        let b = Value::from("ALICE");
        assert_ne!(a.compare(&b, true), Ordering::Equal);
        assert_eq!(a.compare(&b, false), Ordering::Equal);
    }

    #[test]
    fn mixed_integer_widths_compare_numerically() {
        assert_eq!(
            Value::Int16(7).compare(&Value::Int64(7), true),
            Ordering::Equal
        );
        assert_eq!(
            Value::Byte(200).compare(&Value::SByte(-1), true),
            Ordering::Greater
        );
    }

    #[test]
    fn json_deserializes_to_wide_forms() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[null, true, 5, -5, 1.5, "x", [1, 2, 3]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Boolean(true),
                Value::Int64(5),
                Value::Int64(-5),
                Value::Double(1.5),
                Value::from("x"),
                Value::Bytes(vec![1, 2, 3]),
            ]
        );
    }

    #[test]
    fn json_roundtrip_through_coercion() {
        let dto = DateTime::parse_from_rfc3339("2024-05-01T08:30:00.250+02:00").unwrap();
        let originals = vec![
            Value::Int16(-300),
            Value::UInt64(u64::MAX),
            Value::Single(0.1),
            Value::Char('z'),
            Value::Guid(Uuid::new_v4()),
            Value::DateTime(sample_datetime()),
            Value::DateTimeOffset(dto),
            Value::TimeSpan(Duration::milliseconds(1500)),
            Value::Bytes(vec![0, 255, 7]),
        ];

        let json = serde_json::to_string(&originals).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json).unwrap();

        for (original, wire) in originals.into_iter().zip(parsed) {
            let ty = original.data_type().unwrap();
            assert_eq!(wire.coerce(ty).unwrap(), original);
        }
    }
}
