//! Values that flow through the template engine.
//!
//! A template is rendered against a pool of [`Arg`]s. Each arg is one of:
//!
//! - [`Arg::Value`]: a plain scalar, bound as an argument.
//! - [`Arg::Valuer`]: a scalar whose bound form depends on the dialect.
//! - [`Arg::Named`]: a scalar tagged with a name, addressable as `{name}`.
//! - [`Arg::List`]: a sequence, expanded into `a, b, c`.
//! - [`Arg::Fragment`]: a composable SQL fragment, rendered recursively.
//!
//! ```rust
//! use sqlweave_query::{Arg, Value, param};
//!
//! let args: Vec<Arg> = vec![42.into(), "x".into(), vec![1, 2, 3].into(), param("age", 5)];
//! assert!(matches!(args[0], Arg::Value(Value::Int(42))));
//! assert!(matches!(args[2], Arg::List(ref items) if items.len() == 3));
//! assert!(matches!(args[3], Arg::Named(_)));
//!
//! // Byte vectors are a single binary value, never a list.
//! let blob: Arg = vec![0u8, 1, 2].into();
//! assert!(matches!(blob, Arg::Value(Value::Bytes(_))));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::fragment::SqlFragment;

/// Maps a parameter name to the argument slots bound under that name.
pub type ParamIndex = IndexMap<SmolStr, SmallVec<[usize; 1]>>;

/// A concrete scalar value, as handed to a database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Binary value.
    Bytes(Vec<u8>),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
    /// Timestamp in UTC.
    TimestampTz(DateTime<Utc>),
    /// JSON value.
    Json(serde_json::Value),
}

impl Value {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// A short name for the value's kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::TimestampTz(_) => "timestamptz",
            Self::Json(_) => "json",
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Int(v as i64)
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Timestamp(v.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::TimestampTz(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// One slot in a rendered argument list.
///
/// SQLite and SQL Server drivers rebind named parameters by name, so their
/// named slots keep the name; every other slot is bare.
#[derive(Debug, Clone, PartialEq)]
pub struct BindArg {
    /// The parameter name, for named slots.
    pub name: Option<SmolStr>,
    /// The bound value.
    pub value: Value,
}

impl BindArg {
    /// A positional (unnamed) slot.
    pub fn positional(value: impl Into<Value>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    /// A slot tagged with a parameter name.
    pub fn named(name: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

impl<T: Into<Value>> From<T> for BindArg {
    fn from(v: T) -> Self {
        Self::positional(v)
    }
}

/// A value whose bound representation depends on the dialect.
///
/// Resolved exactly once, right before it is appended to the argument list.
pub trait DialectValuer: fmt::Debug + Send + Sync {
    /// Produce the concrete value for `dialect`.
    fn dialect_value(&self, dialect: Dialect) -> QueryResult<Value>;
}

/// A UUID: text on PostgreSQL (native `uuid` input), 16 raw bytes elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UuidValue(pub uuid::Uuid);

impl DialectValuer for UuidValue {
    fn dialect_value(&self, dialect: Dialect) -> QueryResult<Value> {
        Ok(match dialect {
            Dialect::Postgres => Value::String(self.0.to_string()),
            _ => Value::Bytes(self.0.as_bytes().to_vec()),
        })
    }
}

/// A serializable value bound as JSON.
///
/// PostgreSQL receives a [`Value::Json`]; other dialects receive the
/// serialized text.
#[derive(Debug, Clone)]
pub struct JsonValue<T>(pub T);

impl<T: Serialize + fmt::Debug + Send + Sync> DialectValuer for JsonValue<T> {
    fn dialect_value(&self, dialect: Dialect) -> QueryResult<Value> {
        let json = serde_json::to_value(&self.0)
            .map_err(|e| QueryError::dialect_value(format!("json: {}", e)).with_source(e))?;
        Ok(match dialect {
            Dialect::Postgres => Value::Json(json),
            _ => Value::String(json.to_string()),
        })
    }
}

/// The value carried by a [`NamedArg`].
#[derive(Debug, Clone)]
pub enum NamedValue {
    /// A plain scalar.
    Value(Value),
    /// A dialect-aware scalar.
    Valuer(Arc<dyn DialectValuer>),
}

impl NamedValue {
    /// Resolve to a concrete value for `dialect`.
    pub fn resolve(&self, dialect: Dialect) -> QueryResult<Value> {
        match self {
            Self::Value(v) => Ok(v.clone()),
            Self::Valuer(v) => v.dialect_value(dialect),
        }
    }
}

impl<T: Into<Value>> From<T> for NamedValue {
    fn from(v: T) -> Self {
        Self::Value(v.into())
    }
}

impl From<UuidValue> for NamedValue {
    fn from(v: UuidValue) -> Self {
        Self::Valuer(Arc::new(v))
    }
}

impl<T: Serialize + fmt::Debug + Send + Sync + 'static> From<JsonValue<T>> for NamedValue {
    fn from(v: JsonValue<T>) -> Self {
        Self::Valuer(Arc::new(v))
    }
}

/// A value tagged with a name, addressable as `{name}` in templates.
#[derive(Debug, Clone)]
pub struct NamedArg {
    /// The parameter name.
    pub name: SmolStr,
    /// The value.
    pub value: NamedValue,
}

impl NamedArg {
    /// Create a named argument.
    pub fn new(name: impl Into<SmolStr>, value: impl Into<NamedValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Create a named argument ready for a value pool.
///
/// ```rust
/// use sqlweave_query::{Arg, param};
///
/// let arg = param("age", 5);
/// assert_eq!(arg.name(), Some("age"));
/// ```
pub fn param(name: impl Into<SmolStr>, value: impl Into<NamedValue>) -> Arg {
    Arg::Named(NamedArg::new(name, value))
}

/// Anything that can appear in a template's value pool.
#[derive(Debug, Clone)]
pub enum Arg {
    /// A composable SQL fragment.
    Fragment(Arc<dyn SqlFragment>),
    /// A named scalar.
    Named(NamedArg),
    /// A sequence, expanded into comma separated elements.
    List(Vec<Arg>),
    /// A dialect-aware scalar.
    Valuer(Arc<dyn DialectValuer>),
    /// A plain scalar.
    Value(Value),
}

impl Arg {
    /// Wrap a fragment.
    pub fn fragment(fragment: impl SqlFragment + 'static) -> Self {
        Self::Fragment(Arc::new(fragment))
    }

    /// Wrap a dialect-aware value.
    pub fn valuer(valuer: impl DialectValuer + 'static) -> Self {
        Self::Valuer(Arc::new(valuer))
    }

    /// Build a list from anything convertible.
    pub fn list<T: Into<Arg>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// The name carried by a named arg.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(named) => Some(named.name.as_str()),
            _ => None,
        }
    }

    /// Whether this arg binds a single scalar (plain or dialect-aware).
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Value(_) | Self::Valuer(_))
    }

    /// The alias reported by a fragment arg.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Fragment(f) => f.alias(),
            _ => None,
        }
    }
}

macro_rules! arg_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Self::Value(v.into())
                }
            }
        )*
    };
}

arg_from_value!(
    bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, Vec<u8>, &[u8],
    NaiveDateTime, NaiveDate, DateTime<Utc>, serde_json::Value
);

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Self::Value(v.into())
    }
}

impl From<NamedArg> for Arg {
    fn from(v: NamedArg) -> Self {
        Self::Named(v)
    }
}

impl From<UuidValue> for Arg {
    fn from(v: UuidValue) -> Self {
        Self::valuer(v)
    }
}

impl<T: Serialize + fmt::Debug + Send + Sync + 'static> From<JsonValue<T>> for Arg {
    fn from(v: JsonValue<T>) -> Self {
        Self::valuer(v)
    }
}

impl From<Arc<dyn SqlFragment>> for Arg {
    fn from(v: Arc<dyn SqlFragment>) -> Self {
        Self::Fragment(v)
    }
}

macro_rules! arg_list_from {
    ($($t:ty),*) => {
        $(
            impl From<Vec<$t>> for Arg {
                fn from(v: Vec<$t>) -> Self {
                    Self::list(v)
                }
            }

            impl<const N: usize> From<[$t; N]> for Arg {
                fn from(v: [$t; N]) -> Self {
                    Self::list(v)
                }
            }
        )*
    };
}

arg_list_from!(i16, i32, i64, u16, u32, f64, bool, String, &str, Value, Arg);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from("a"), Value::String("a".into()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_arg_lists_and_bytes() {
        assert!(matches!(Arg::from(vec![1, 2, 3]), Arg::List(ref v) if v.len() == 3));
        assert!(matches!(Arg::from(["a", "b"]), Arg::List(ref v) if v.len() == 2));
        assert!(matches!(Arg::from(vec![1u8, 2, 3]), Arg::Value(Value::Bytes(_))));
        assert!(matches!(Arg::from(&b"abc"[..]), Arg::Value(Value::Bytes(_))));
    }

    #[test]
    fn test_param_name() {
        let arg = param("age", 5);
        assert_eq!(arg.name(), Some("age"));
        assert!(!arg.is_scalar());
        assert!(Arg::from(5).is_scalar());
    }

    #[test]
    fn test_uuid_valuer() {
        let id = uuid::Uuid::nil();
        let pg = UuidValue(id).dialect_value(Dialect::Postgres).unwrap();
        assert_eq!(pg, Value::String("00000000-0000-0000-0000-000000000000".into()));
        let lite = UuidValue(id).dialect_value(Dialect::Sqlite).unwrap();
        assert_eq!(lite, Value::Bytes(vec![0; 16]));
    }

    #[test]
    fn test_json_valuer() {
        let v = JsonValue(vec![1, 2]);
        assert_eq!(
            v.dialect_value(Dialect::MySql).unwrap(),
            Value::String("[1,2]".into())
        );
        assert!(matches!(
            v.dialect_value(Dialect::Postgres).unwrap(),
            Value::Json(_)
        ));
    }

    #[test]
    fn test_bind_arg() {
        let named = BindArg::named("age", 5);
        assert_eq!(named.name.as_deref(), Some("age"));
        let plain: BindArg = 5.into();
        assert_eq!(plain.name, None);
    }
}
