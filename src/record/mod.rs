//! Record descriptors.
//!
//! A record is a struct deriving [`Record`](crate::Record). The derive produces a
//! static, lazily-built list of [`FieldDescriptor`]s (one per visible field, embedded
//! records flattened in place) and an accessor returning the field values as
//! [`ColumnType`] trait objects in the same order. Everything downstream (column
//! mapping, value encoding, join flattening, keyset resolution) works from those two
//! pieces.

pub mod column_type;
pub mod custom;
pub mod tag;

use std::fmt;

pub use column_type::ColumnType;
pub use custom::{Custom, CustomColumn};
pub use tag::{FieldDirective, SkipKind};

use crate::mapping::columns::ColumnSource;

/// Static description of one record field.
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Field identifier as written in the struct.
    pub ident: &'static str,
    /// Raw `#[tideline(...)]` token list.
    pub directive_tag: &'static str,
    /// Raw `#[db = "..."]` naming tag.
    pub db_tag: &'static str,
    pub directive: FieldDirective,
    /// Resolved column name (rename or snake-cased identifier).
    pub column_name: String,
    read_expression: fn(&str, &str) -> Option<ColumnSource>,
    record_fields: fn() -> Option<&'static [FieldDescriptor]>,
}

impl FieldDescriptor {
    /// Describe a field of type `T`.
    ///
    /// Tags are parsed and the column name resolved here, once per field.
    pub fn new<T: ColumnType>(
        ident: &'static str,
        directive_tag: &'static str,
        db_tag: &'static str,
    ) -> Self {
        let directive = tag::parse_directives(directive_tag, db_tag);
        let column_name = directive
            .rename
            .clone()
            .unwrap_or_else(|| tag::snake_case(ident));

        Self {
            ident,
            directive_tag,
            db_tag,
            directive,
            column_name,
            read_expression: T::read_expression,
            record_fields: T::record_fields,
        }
    }

    /// Source expression for reading this field from `table`.
    ///
    /// Custom columns supply their own expression; everything else is a plain
    /// `table.column` reference.
    pub fn read_source(&self, table: &str) -> ColumnSource {
        (self.read_expression)(table, &self.column_name).unwrap_or_else(|| ColumnSource::Column {
            table: table.to_string(),
            column: self.column_name.clone(),
        })
    }

    /// Whether the field type overrides its read expression.
    pub fn is_custom(&self) -> bool {
        (self.read_expression)("", &self.column_name).is_some()
    }

    /// Descriptors of the field type when it is itself a record.
    pub fn nested_fields(&self) -> Option<&'static [FieldDescriptor]> {
        (self.record_fields)()
    }

    /// Whether `name` refers to this field, by identifier or by column name.
    pub fn matches(&self, name: &str) -> bool {
        self.ident == name
            || self.column_name == name
            || self.ident.strip_prefix("r#") == Some(name)
            || tag::snake_case(self.ident) == name
    }

    pub fn skips(&self, kind: SkipKind) -> bool {
        self.directive.skips(kind)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("ident", &self.ident)
            .field("column_name", &self.column_name)
            .field("directive", &self.directive)
            .field("custom", &self.is_custom())
            .field("record", &self.nested_fields().is_some())
            .finish()
    }
}

/// A struct mapped onto table columns.
///
/// Implemented by `#[derive(Record)]`. Field order in [`fields`](Record::fields) and
/// [`columns`](Record::columns) is the struct's declaration order, with embedded
/// records expanded where they are declared.
pub trait Record {
    /// Type name, used in error messages.
    fn record_name() -> &'static str;

    /// Descriptors for every visible field.
    fn fields() -> &'static [FieldDescriptor];

    /// Field values, aligned with [`fields`](Record::fields).
    fn columns(&self) -> Vec<&dyn ColumnType>;

    /// Look up a field by identifier or column name.
    fn field(name: &str) -> Option<&'static FieldDescriptor> {
        Self::fields().iter().find(|field| field.matches(name))
    }

    /// Resolved column names in declaration order.
    fn column_names() -> Vec<&'static str> {
        Self::fields().iter().map(|field| field.column_name.as_str()).collect()
    }
}
