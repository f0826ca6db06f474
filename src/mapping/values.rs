//! Value encoding.
//!
//! Turns a record instance (or a plain key/value mapping) into the column-name to
//! value map INSERT and UPDATE statements are built from.

use std::collections::{BTreeMap, HashMap};

use chrono::{Local, Utc};
use sea_query::{Expr, Value};

use crate::error::TidelineError;
use crate::record::{ColumnType, FieldDescriptor, Record, SkipKind};

/// A value ready to be placed into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Bound as a statement parameter.
    Bound(Value),
    /// Written verbatim as an expression (custom write hooks).
    Expr(Expr),
}

impl SqlValue {
    pub fn into_expr(self) -> Expr {
        match self {
            SqlValue::Bound(value) => Expr::val(value),
            SqlValue::Expr(expr) => expr,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            SqlValue::Bound(value) => Some(value),
            SqlValue::Expr(_) => None,
        }
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        SqlValue::Bound(value)
    }
}

/// Column name to value, iterated in column-name order.
pub type EncodedValues = BTreeMap<String, SqlValue>;

/// Anything that can be encoded into an [`EncodedValues`] map.
pub trait Encode {
    /// Encode for a statement of kind `skip`.
    ///
    /// With `apply_zero_skip`, fields holding their zero value are dropped unless
    /// they are marked `skip_compare`.
    fn encode(&self, skip: SkipKind, apply_zero_skip: bool) -> Result<EncodedValues, TidelineError>;
}

/// Encode `value` for a statement of kind `skip`.
///
/// # Example
///
/// ```
/// use tideline::{encode_values, Record, SkipKind};
///
/// #[derive(Record, Default)]
/// struct Account {
///     pub id: i64,
///     #[db = "display_name"]
///     pub name: String,
///     #[tideline(skip_insert)]
///     pub version: i32,
/// }
///
/// let account = Account { id: 7, name: "ops".into(), version: 2 };
/// let values = encode_values(&account, SkipKind::Insert, false).unwrap();
/// let columns: Vec<_> = values.keys().map(String::as_str).collect();
/// assert_eq!(columns, vec!["display_name", "id"]);
/// ```
pub fn encode_values<E: Encode + ?Sized>(
    value: &E,
    skip: SkipKind,
    apply_zero_skip: bool,
) -> Result<EncodedValues, TidelineError> {
    value.encode(skip, apply_zero_skip)
}

/// Encode a record instance field by field.
pub fn encode_record<R: Record>(
    record: &R,
    skip: SkipKind,
    apply_zero_skip: bool,
) -> Result<EncodedValues, TidelineError> {
    let fields = R::fields();
    let columns = record.columns();
    if fields.len() != columns.len() {
        return Err(TidelineError::Build(format!(
            "record {} describes {} fields but exposes {} values",
            R::record_name(),
            fields.len(),
            columns.len()
        )));
    }

    let mut values = EncodedValues::new();
    for (field, column) in fields.iter().zip(columns) {
        if let Some(value) = encode_field(field, column, skip, apply_zero_skip) {
            values.insert(field.column_name.clone(), value);
        }
    }
    Ok(values)
}

fn encode_field(
    field: &FieldDescriptor,
    column: &dyn ColumnType,
    skip: SkipKind,
    apply_zero_skip: bool,
) -> Option<SqlValue> {
    let directive = &field.directive;

    if directive.skips(skip) {
        return None;
    }
    if directive.omit_empty && column.is_zero() {
        return None;
    }
    if directive.omit_nil && column.is_nil() {
        return None;
    }
    if !directive.skip_compare && apply_zero_skip && column.is_zero() {
        return None;
    }

    let value = if directive.default_now_utc {
        Value::from(Utc::now())
    } else if directive.default_now {
        Value::from(Local::now())
    } else {
        column.to_value()
    };

    Some(match column.write_expression(value.clone()) {
        Some(expr) => SqlValue::Expr(expr),
        None => SqlValue::Bound(value),
    })
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, skip: SkipKind, apply_zero_skip: bool) -> Result<EncodedValues, TidelineError> {
        (**self).encode(skip, apply_zero_skip)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, skip: SkipKind, apply_zero_skip: bool) -> Result<EncodedValues, TidelineError> {
        (**self).encode(skip, apply_zero_skip)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, skip: SkipKind, apply_zero_skip: bool) -> Result<EncodedValues, TidelineError> {
        match self {
            Some(value) => value.encode(skip, apply_zero_skip),
            None => Err(TidelineError::TypeMismatch {
                expected: "record or mapping",
                found: "None".to_string(),
            }),
        }
    }
}

// Key/value mappings pass through as-is; directives only apply to records.

impl<V: Into<Value> + Clone> Encode for HashMap<String, V> {
    fn encode(&self, _skip: SkipKind, _apply_zero_skip: bool) -> Result<EncodedValues, TidelineError> {
        Ok(self
            .iter()
            .map(|(key, value)| (key.clone(), SqlValue::Bound(value.clone().into())))
            .collect())
    }
}

impl<V: Into<Value> + Clone> Encode for BTreeMap<String, V> {
    fn encode(&self, _skip: SkipKind, _apply_zero_skip: bool) -> Result<EncodedValues, TidelineError> {
        Ok(self
            .iter()
            .map(|(key, value)| (key.clone(), SqlValue::Bound(value.clone().into())))
            .collect())
    }
}

impl Encode for serde_json::Map<String, serde_json::Value> {
    fn encode(&self, _skip: SkipKind, _apply_zero_skip: bool) -> Result<EncodedValues, TidelineError> {
        Ok(self
            .iter()
            .map(|(key, value)| (key.clone(), SqlValue::Bound(json_scalar(value))))
            .collect())
    }
}

impl Encode for serde_json::Value {
    fn encode(&self, skip: SkipKind, apply_zero_skip: bool) -> Result<EncodedValues, TidelineError> {
        match self {
            serde_json::Value::Object(map) => map.encode(skip, apply_zero_skip),
            other => Err(TidelineError::TypeMismatch {
                expected: "record or mapping",
                found: json_kind(other).to_string(),
            }),
        }
    }
}

fn json_scalar(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Json(None),
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::String(s) => Value::from(s.clone()),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::from(i),
            (None, Some(f)) => Value::from(f),
            (None, None) => Value::from(value.clone()),
        },
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::from(value.clone()),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Custom;

    #[test]
    fn test_mapping_passes_through() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::from(1i32));
        map.insert("b".to_string(), Value::from("x".to_string()));

        let values = encode_values(&map, SkipKind::Update, true).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["a"], SqlValue::Bound(Value::Int(Some(1))));
    }

    #[test]
    fn test_mapping_keeps_zero_values() {
        let mut map = BTreeMap::new();
        map.insert("count".to_string(), 0i64);
        let values = encode_values(&map, SkipKind::Update, true).unwrap();
        assert_eq!(values["count"], SqlValue::Bound(Value::BigInt(Some(0))));
    }

    #[test]
    fn test_json_object_is_a_mapping() {
        let doc = serde_json::json!({"name": "x", "n": 3, "flag": true});
        let values = encode_values(&doc, SkipKind::Insert, false).unwrap();
        assert_eq!(values["n"], SqlValue::Bound(Value::BigInt(Some(3))));
        assert_eq!(values["flag"], SqlValue::Bound(Value::Bool(Some(true))));
    }

    #[test]
    fn test_non_mapping_inputs_are_rejected() {
        let err = encode_values(&serde_json::json!([1, 2]), SkipKind::Insert, false).unwrap_err();
        assert!(matches!(err, TidelineError::TypeMismatch { .. }));

        let missing: Option<HashMap<String, i32>> = None;
        let err = encode_values(&missing, SkipKind::Insert, false).unwrap_err();
        assert!(matches!(err, TidelineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_encode_field_order_of_rules() {
        let skipped = FieldDescriptor::new::<i32>("a", "skip_update", "");
        assert_eq!(encode_field(&skipped, &5i32, SkipKind::Update, false), None);

        let omit_empty = FieldDescriptor::new::<i32>("a", "", "a,omitempty");
        assert_eq!(encode_field(&omit_empty, &0i32, SkipKind::Insert, false), None);

        let omit_nil = FieldDescriptor::new::<Option<i32>>("a", "", "omitnil");
        assert_eq!(encode_field(&omit_nil, &None::<i32>, SkipKind::Insert, false), None);
        assert_eq!(
            encode_field(&omit_nil, &Some(0i32), SkipKind::Insert, true),
            Some(SqlValue::Bound(Value::Int(Some(0))))
        );

        let compared = FieldDescriptor::new::<i32>("a", "", "");
        assert_eq!(encode_field(&compared, &0i32, SkipKind::Update, true), None);
        assert_eq!(
            encode_field(&compared, &0i32, SkipKind::Update, false),
            Some(SqlValue::Bound(Value::Int(Some(0))))
        );

        let forced = FieldDescriptor::new::<i32>("a", "skip_compare", "");
        assert_eq!(
            encode_field(&forced, &0i32, SkipKind::Update, true),
            Some(SqlValue::Bound(Value::Int(Some(0))))
        );
    }

    #[test]
    fn test_omit_empty_is_independent_of_skip_compare() {
        let field = FieldDescriptor::new::<String>("a", "skip_compare", "a,omitempty");
        assert_eq!(encode_field(&field, &String::new(), SkipKind::Update, true), None);
    }

    #[test]
    fn test_now_directives_substitute_timestamps() {
        let utc = FieldDescriptor::new::<chrono::DateTime<Utc>>("created", "now_utc", "");
        let encoded = encode_field(&utc, &Utc::now(), SkipKind::Insert, false);
        assert!(matches!(encoded, Some(SqlValue::Bound(Value::ChronoDateTimeUtc(Some(_))))));

        let local = FieldDescriptor::new::<chrono::DateTime<Utc>>("updated", "now", "");
        let encoded = encode_field(&local, &Utc::now(), SkipKind::Insert, false);
        assert!(matches!(encoded, Some(SqlValue::Bound(Value::ChronoDateTimeLocal(Some(_))))));
    }

    #[test]
    fn test_zero_now_field_is_dropped_under_zero_skip() {
        let field = FieldDescriptor::new::<chrono::DateTime<Utc>>("updated", "now_utc", "");
        let zero = chrono::DateTime::<Utc>::default();
        assert_eq!(encode_field(&field, &zero, SkipKind::Update, true), None);
    }

    #[test]
    fn test_custom_write_hook_overrides_value() {
        use crate::mapping::columns::ColumnSource;
        use crate::record::CustomColumn;
        use sea_query::Func;

        #[derive(Debug, Clone, Default)]
        struct Upper(String);

        impl ColumnType for Upper {
            fn is_zero(&self) -> bool {
                self.0.is_empty()
            }
            fn to_value(&self) -> Value {
                self.0.clone().into()
            }
            fn to_json(&self) -> serde_json::Value {
                self.0.clone().into()
            }
            fn null_value() -> Value {
                Option::<String>::None.into()
            }
        }

        impl CustomColumn for Upper {
            fn build_read_expression(table: &str, column: &str) -> ColumnSource {
                ColumnSource::Column {
                    table: table.into(),
                    column: column.into(),
                }
            }
            fn build_write_expression(&self, value: Value) -> Expr {
                Func::upper(Expr::val(value)).into()
            }
        }

        let field = FieldDescriptor::new::<Custom<Upper>>("code", "", "");
        let encoded = encode_field(&field, &Custom(Upper("ab".into())), SkipKind::Insert, false);
        assert!(matches!(encoded, Some(SqlValue::Expr(_))));

        // skip rules still run first
        let encoded = encode_field(&field, &Custom(Upper::default()), SkipKind::Insert, true);
        assert_eq!(encoded, None);
    }
}
