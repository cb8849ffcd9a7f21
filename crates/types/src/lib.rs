//! Shared data model for keyed and ranged value tables.
//!
//! A [`Mapping`] is the persisted structure: a flat string-keyed object of
//! entries plus the reserved `default` slot. [`Row`] is its editable-grid
//! projection. The kinds in [`kinds`] select per-table behavior (value input
//! variant, empty defaults, comparator kind) through explicit lookup.

pub mod kinds;
pub mod mapping;
pub mod row;
pub mod value;

pub use kinds::{COLOR_EMPTY_DEFAULT, InputKind, KeyKind, TableKind, ValueKind};
pub use mapping::{DEFAULT_KEY, Mapping};
pub use row::{Field, FieldInput, ParseFieldError, RangeKey, Row, RowKind};
pub use value::CellValue;
