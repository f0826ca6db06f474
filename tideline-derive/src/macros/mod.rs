//! Macro implementations

pub mod from_row;
pub mod record;

pub use from_row::derive_from_row;
pub use record::derive_record;
