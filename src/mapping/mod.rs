//! Record to SQL mapping: SELECT columns, INSERT/UPDATE values and join selections.

pub mod columns;
pub mod selection;
pub mod values;

pub use columns::{map_columns, map_fields, ColumnEntry, ColumnSource};
pub use selection::{flatten_selection, AliasedColumn};
pub use values::{encode_record, encode_values, Encode, EncodedValues, SqlValue};
