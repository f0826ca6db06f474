//! Value conversion from SeaQuery to may_postgres.
//!
//! Statements compile to SQL text plus a list of `sea_query::Value`s. This module
//! turns those values into owned `ToSql` parameters and lends them to a closure as
//! the `&[&dyn ToSql]` slice the executor expects.
//!
//! Unsigned integers are widened to the next signed type PostgreSQL understands;
//! `BigUnsigned` values above `i64::MAX` are rejected rather than wrapped. Arrays
//! bind as PostgreSQL arrays of their element type.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::{ArrayType, Value, Values};
use uuid::Uuid;

use crate::executor::ExecError;

type Param = Box<dyn ToSql>;

fn param<T: ToSql + 'static>(value: Option<T>) -> Param {
    Box::new(value)
}

/// Convert a single value into an owned parameter.
///
/// # Errors
///
/// Returns `ExecError::Other` for values that cannot be bound.
pub fn to_param(value: &Value) -> Result<Param, ExecError> {
    let param = match value {
        Value::Bool(v) => param(*v),
        Value::TinyInt(v) => param(v.map(i16::from)),
        Value::SmallInt(v) => param(*v),
        Value::Int(v) => param(*v),
        Value::BigInt(v) => param(*v),
        Value::TinyUnsigned(v) => param(v.map(i16::from)),
        Value::SmallUnsigned(v) => param(v.map(i32::from)),
        Value::Unsigned(v) => param(v.map(i64::from)),
        Value::BigUnsigned(v) => match v {
            Some(u) => {
                let signed = i64::try_from(*u).map_err(|_| {
                    ExecError::Other(format!(
                        "BigUnsigned value {u} exceeds i64::MAX ({}), cannot be safely cast to i64",
                        i64::MAX
                    ))
                })?;
                param(Some(signed))
            }
            None => param(None::<i64>),
        },
        Value::Float(v) => param(*v),
        Value::Double(v) => param(*v),
        Value::String(v) => param(v.as_ref().map(|s| String::clone(s))),
        Value::Char(v) => param(v.map(String::from)),
        Value::Bytes(v) => param(v.as_ref().map(|b| Vec::<u8>::clone(b))),
        Value::Json(v) => param(v.as_ref().map(|j| serde_json::Value::clone(j))),
        Value::ChronoDate(v) => param(v.as_ref().map(|d| NaiveDate::clone(d))),
        Value::ChronoTime(v) => param(v.as_ref().map(|t| NaiveTime::clone(t))),
        Value::ChronoDateTime(v) => param(v.as_ref().map(|t| NaiveDateTime::clone(t))),
        Value::ChronoDateTimeUtc(v) => param(v.as_ref().map(|t| DateTime::<Utc>::clone(t))),
        Value::ChronoDateTimeLocal(v) => param(v.as_ref().map(|t| DateTime::<Local>::clone(t))),
        Value::ChronoDateTimeWithTimeZone(v) => {
            param(v.as_ref().map(|t| DateTime::<FixedOffset>::clone(t)))
        }
        Value::Uuid(v) => param(v.as_ref().map(|u| Uuid::clone(u))),
        Value::Decimal(v) => param(v.as_ref().map(|d| Decimal::clone(d))),
        Value::Array(element, items) => array_param(element, items.as_ref().map(|items| items.as_slice()))?,
        #[allow(unreachable_patterns)]
        other => {
            return Err(ExecError::Other(format!(
                "Unsupported value type in query: {other:?}"
            )));
        }
    };
    Ok(param)
}

/// Collect array elements of one variant, keeping NULL elements.
macro_rules! elements {
    ($items:expr, $variant:ident, $convert:expr) => {{
        let items: Option<&[Value]> = $items;
        let elements = items
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::$variant(v) => Ok(v.as_ref().map($convert)),
                        other => Err(ExecError::Other(format!(
                            "{other:?} does not belong in a {} array",
                            stringify!($variant)
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        param(elements)
    }};
}

fn array_param(element: &ArrayType, items: Option<&[Value]>) -> Result<Param, ExecError> {
    let param = match element {
        ArrayType::Bool => elements!(items, Bool, |v| *v),
        ArrayType::TinyInt => elements!(items, TinyInt, |v| i16::from(*v)),
        ArrayType::SmallInt => elements!(items, SmallInt, |v| *v),
        ArrayType::Int => elements!(items, Int, |v| *v),
        ArrayType::BigInt => elements!(items, BigInt, |v| *v),
        ArrayType::Float => elements!(items, Float, |v| *v),
        ArrayType::Double => elements!(items, Double, |v| *v),
        ArrayType::String => elements!(items, String, |s| String::clone(s)),
        ArrayType::ChronoDate => elements!(items, ChronoDate, |d| NaiveDate::clone(d)),
        ArrayType::ChronoTime => elements!(items, ChronoTime, |t| NaiveTime::clone(t)),
        ArrayType::ChronoDateTime => elements!(items, ChronoDateTime, |t| NaiveDateTime::clone(t)),
        ArrayType::ChronoDateTimeUtc => elements!(items, ChronoDateTimeUtc, |t| DateTime::<Utc>::clone(t)),
        ArrayType::ChronoDateTimeLocal => elements!(items, ChronoDateTimeLocal, |t| DateTime::<Local>::clone(t)),
        ArrayType::ChronoDateTimeWithTimeZone => {
            elements!(items, ChronoDateTimeWithTimeZone, |t| DateTime::<FixedOffset>::clone(t))
        }
        ArrayType::Uuid => elements!(items, Uuid, |u| Uuid::clone(u)),
        ArrayType::Decimal => elements!(items, Decimal, |d| Decimal::clone(d)),
        other => {
            return Err(ExecError::Other(format!("Unsupported array element type: {other:?}")));
        }
    };
    Ok(param)
}

/// Convert SeaQuery values to may_postgres parameters and run `f` with them.
///
/// The parameters live for the duration of the closure.
///
/// # Errors
///
/// Returns `ExecError::Other` if an unsupported value type is encountered, or
/// whatever `f` returns.
pub fn with_converted_params<F, R>(values: &Values, f: F) -> Result<R, ExecError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, ExecError>,
{
    let owned = values.iter().map(to_param).collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref()).collect();
    f(&params)
}
