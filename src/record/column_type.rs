//! Field value adapters.
//!
//! Every record field type implements [`ColumnType`]. The trait answers the questions
//! the mapper and the encoder ask about a value: is it the type's zero value, is it
//! absent, what `sea_query::Value` does it bind as, and does the type override how
//! it is read or written.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_query::{ArrayType, Expr, Value};
use serde_json::Value as Json;
use uuid::Uuid;

use super::FieldDescriptor;
use crate::mapping::columns::ColumnSource;

/// Value-level behaviour of a record field type.
pub trait ColumnType {
    /// Whether the value equals its type's zero value.
    fn is_zero(&self) -> bool;

    /// Whether the value is absent. Only `Option` (and wrappers around it) can be nil.
    fn is_nil(&self) -> bool {
        false
    }

    /// The value bound for this field.
    fn to_value(&self) -> Value;

    /// JSON form, used when the value is nested inside a JSON-bound column.
    fn to_json(&self) -> Json;

    /// Typed NULL for this column type.
    fn null_value() -> Value
    where
        Self: Sized;

    /// Element type of a PostgreSQL array holding this type. `Vec`s of types
    /// without one bind as JSON documents.
    fn array_type() -> Option<ArrayType>
    where
        Self: Sized,
    {
        None
    }

    /// Read expression override. `None` means a plain qualified column.
    fn read_expression(_table: &str, _column: &str) -> Option<ColumnSource>
    where
        Self: Sized,
    {
        None
    }

    /// Write expression override, applied after every other encoding rule.
    /// `value` is what would otherwise be bound, after `now`/`now_utc` substitution.
    fn write_expression(&self, _value: Value) -> Option<Expr> {
        None
    }

    /// Field descriptors when the type is itself a record.
    fn record_fields() -> Option<&'static [FieldDescriptor]>
    where
        Self: Sized,
    {
        None
    }
}

fn json_of<T: serde::Serialize>(value: &T) -> Json {
    match serde_json::to_value(value) {
        // Scalars only serialize to null when they have no JSON form, e.g. NaN
        Ok(Json::Null) => {
            log::warn!("{} value has no JSON form, using null", std::any::type_name::<T>());
            Json::Null
        }
        Ok(json) => json,
        Err(e) => {
            log::warn!("{} value could not be serialized, using null: {e}", std::any::type_name::<T>());
            Json::Null
        }
    }
}

macro_rules! scalar_column {
    ($($t:ty => $array:expr),* $(,)?) => {
        $(
            impl ColumnType for $t {
                fn is_zero(&self) -> bool {
                    *self == <$t>::default()
                }

                fn to_value(&self) -> Value {
                    self.clone().into()
                }

                fn to_json(&self) -> Json {
                    json_of(self)
                }

                fn null_value() -> Value {
                    Option::<$t>::None.into()
                }

                fn array_type() -> Option<ArrayType> {
                    $array
                }
            }
        )*
    };
}

scalar_column!(
    bool => Some(ArrayType::Bool),
    i8 => Some(ArrayType::TinyInt),
    i16 => Some(ArrayType::SmallInt),
    i32 => Some(ArrayType::Int),
    i64 => Some(ArrayType::BigInt),
    u8 => None,
    u16 => None,
    u32 => None,
    u64 => None,
    f32 => Some(ArrayType::Float),
    f64 => Some(ArrayType::Double),
    String => Some(ArrayType::String),
    NaiveDate => Some(ArrayType::ChronoDate),
    NaiveTime => Some(ArrayType::ChronoTime),
    NaiveDateTime => Some(ArrayType::ChronoDateTime),
    DateTime<Utc> => Some(ArrayType::ChronoDateTimeUtc),
    DateTime<Local> => Some(ArrayType::ChronoDateTimeLocal),
    DateTime<FixedOffset> => Some(ArrayType::ChronoDateTimeWithTimeZone),
);

impl ColumnType for Decimal {
    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }

    fn to_value(&self) -> Value {
        (*self).into()
    }

    fn to_json(&self) -> Json {
        Json::String(self.to_string())
    }

    fn null_value() -> Value {
        Option::<Decimal>::None.into()
    }

    fn array_type() -> Option<ArrayType> {
        Some(ArrayType::Decimal)
    }
}

impl ColumnType for Uuid {
    fn is_zero(&self) -> bool {
        self.is_nil()
    }

    /// The nil UUID binds as NULL.
    fn to_value(&self) -> Value {
        if self.is_nil() {
            Self::null_value()
        } else {
            (*self).into()
        }
    }

    fn to_json(&self) -> Json {
        if self.is_nil() {
            Json::Null
        } else {
            Json::String(self.to_string())
        }
    }

    fn null_value() -> Value {
        Option::<Uuid>::None.into()
    }

    fn array_type() -> Option<ArrayType> {
        Some(ArrayType::Uuid)
    }
}

impl ColumnType for Json {
    fn is_zero(&self) -> bool {
        self.is_null()
    }

    fn is_nil(&self) -> bool {
        self.is_null()
    }

    fn to_value(&self) -> Value {
        self.clone().into()
    }

    fn to_json(&self) -> Json {
        self.clone()
    }

    fn null_value() -> Value {
        Option::<Json>::None.into()
    }
}

// Sequences of scalars bind as PostgreSQL arrays; other sequences and maps bind
// as JSON documents.

impl<T: ColumnType> ColumnType for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Value {
        match T::array_type() {
            Some(element) => {
                let items: Vec<Value> = self.iter().map(ColumnType::to_value).collect();
                Value::Array(element, Some(items.into()))
            }
            None => self.to_json().into(),
        }
    }

    fn to_json(&self) -> Json {
        Json::Array(self.iter().map(ColumnType::to_json).collect())
    }

    fn null_value() -> Value {
        match T::array_type() {
            Some(element) => Value::Array(element, None),
            None => Option::<Json>::None.into(),
        }
    }
}

macro_rules! map_column {
    ($($map:ident),*) => {
        $(
            impl<V: ColumnType> ColumnType for $map<String, V> {
                fn is_zero(&self) -> bool {
                    self.is_empty()
                }

                fn to_value(&self) -> Value {
                    self.to_json().into()
                }

                fn to_json(&self) -> Json {
                    Json::Object(
                        self.iter()
                            .map(|(key, value)| (key.clone(), value.to_json()))
                            .collect(),
                    )
                }

                fn null_value() -> Value {
                    Option::<Json>::None.into()
                }
            }
        )*
    };
}

map_column!(HashMap, BTreeMap);

impl<T: ColumnType> ColumnType for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn is_nil(&self) -> bool {
        self.is_none()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => T::null_value(),
        }
    }

    fn to_json(&self) -> Json {
        self.as_ref().map_or(Json::Null, ColumnType::to_json)
    }

    fn null_value() -> Value {
        T::null_value()
    }

    fn array_type() -> Option<ArrayType> {
        T::array_type()
    }

    fn read_expression(table: &str, column: &str) -> Option<ColumnSource> {
        T::read_expression(table, column)
    }

    fn write_expression(&self, value: Value) -> Option<Expr> {
        self.as_ref().and_then(|inner| inner.write_expression(value))
    }

    fn record_fields() -> Option<&'static [FieldDescriptor]> {
        T::record_fields()
    }
}

impl<T: ColumnType> ColumnType for Box<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn to_json(&self) -> Json {
        (**self).to_json()
    }

    fn null_value() -> Value {
        T::null_value()
    }

    fn array_type() -> Option<ArrayType> {
        T::array_type()
    }

    fn read_expression(table: &str, column: &str) -> Option<ColumnSource> {
        T::read_expression(table, column)
    }

    fn write_expression(&self, value: Value) -> Option<Expr> {
        (**self).write_expression(value)
    }

    fn record_fields() -> Option<&'static [FieldDescriptor]> {
        T::record_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_zero_values() {
        assert!(0i32.is_zero());
        assert!(!5i32.is_zero());
        assert!(String::new().is_zero());
        assert!(!"x".to_string().is_zero());
        assert!(false.is_zero());
        assert!(0.0f64.is_zero());
        assert!(NaiveDateTime::default().is_zero());
        assert!(!Utc::now().is_zero());
        assert!(Decimal::ZERO.is_zero());
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(5i64.to_value(), Value::BigInt(Some(5)));
        assert_eq!(true.to_value(), Value::Bool(Some(true)));
        assert_eq!(<i32 as ColumnType>::null_value(), Value::Int(None));
        assert_eq!(<bool as ColumnType>::null_value(), Value::Bool(None));
    }

    #[test]
    fn test_option_is_nil_and_zero_when_none() {
        let none: Option<i32> = None;
        assert!(none.is_nil());
        assert!(none.is_zero());
        assert_eq!(none.to_value(), Value::Int(None));

        // a present zero is neither nil nor zero
        let some = Some(0i32);
        assert!(!some.is_nil());
        assert!(!some.is_zero());
        assert_eq!(some.to_value(), Value::Int(Some(0)));
    }

    #[test]
    fn test_nil_uuid_binds_null() {
        assert!(Uuid::nil().is_zero());
        assert_eq!(Uuid::nil().to_value(), <Uuid as ColumnType>::null_value());
        let id = Uuid::new_v4();
        assert!(!id.is_zero());
        assert_ne!(id.to_value(), <Uuid as ColumnType>::null_value());
    }

    #[test]
    fn test_scalar_sequences_bind_as_arrays() {
        let tags = vec!["a".to_string(), "b".to_string()];
        match tags.to_value() {
            Value::Array(ArrayType::String, Some(items)) => {
                assert_eq!(items.to_vec(), vec![Value::from("a".to_string()), Value::from("b".to_string())]);
            }
            other => panic!("unexpected value {other:?}"),
        }
        assert!(matches!(vec![1i64, 2].to_value(), Value::Array(ArrayType::BigInt, Some(_))));
        assert!(matches!(
            vec![Some(1.5f64), None].to_value(),
            Value::Array(ArrayType::Double, Some(_))
        ));
        assert_eq!(<Vec<i32> as ColumnType>::null_value(), Value::Array(ArrayType::Int, None));
        assert_eq!(<Option<Vec<Uuid>> as ColumnType>::null_value(), Value::Array(ArrayType::Uuid, None));
    }

    #[test]
    fn test_collections_bind_as_json() {
        let tags = vec!["a".to_string(), "b".to_string()];
        assert_eq!(tags.to_json(), serde_json::json!(["a", "b"]));
        assert!(Vec::<i32>::new().is_zero());

        let documents = vec![serde_json::json!({"a": 1})];
        assert_eq!(documents.to_value(), Value::from(serde_json::json!([{"a": 1}])));
        assert_eq!(<Vec<u32> as ColumnType>::null_value(), Value::Json(None));

        let mut attrs = BTreeMap::new();
        attrs.insert("k".to_string(), 1i32);
        assert_eq!(attrs.to_json(), serde_json::json!({"k": 1}));
        assert_eq!(attrs.to_value(), Value::from(serde_json::json!({"k": 1})));
    }

    #[test]
    fn test_unserializable_value_becomes_json_null() {
        assert_eq!(f64::NAN.to_json(), Json::Null);
        assert_eq!(vec![1.0f64, f64::INFINITY].to_json(), serde_json::json!([1.0, null]));
    }

    #[test]
    fn test_json_null_is_nil() {
        assert!(Json::Null.is_nil());
        assert!(Json::Null.is_zero());
        assert!(!serde_json::json!({}).is_nil());
    }

    #[test]
    fn test_plain_types_have_no_hooks() {
        assert!(<i32 as ColumnType>::read_expression("t", "c").is_none());
        assert!(5i32.write_expression(Value::Int(Some(5))).is_none());
        assert!(<Option<String> as ColumnType>::record_fields().is_none());
    }
}
