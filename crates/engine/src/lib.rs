//! # Valuetable Engine
//!
//! Keeps a sparse key (or range) to value [`Mapping`](valuetable_types::Mapping)
//! in sync with an editable row list.
//!
//! ## Architecture
//!
//! - **`codec`**: key shapes ([`Keyed`], [`Ranged`]) and the `from~to` range encoding
//! - **`compare`**: the three-way numeric/lexical key comparator
//! - **`sync`**: pure decompose / recompose / reorder projections
//! - **`table`**: the stateful editor ([`KeyValueTable`], [`RangeValueTable`])
//! - **`lookup`**: resolving a query value against a mapping
//!
//! ## Usage
//!
//! ```rust
//! use valuetable_engine::{RangeValueTable, TableOptions};
//! use valuetable_types::{Field, TableKind};
//!
//! let table = RangeValueTable::new(TableOptions::for_kind(TableKind::Range));
//! let new_row = table.new_row_index();
//! table.commit(new_row, Field::From, "0")?;
//! table.commit(new_row, Field::To, "10")?;
//! table.commit(new_row, Field::Value, "low")?;
//!
//! assert_eq!(table.value().keys().collect::<Vec<_>>(), vec!["0~10"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod compare;
pub mod error;
pub mod lookup;
pub mod sync;
pub mod table;

pub use codec::{KeyShape, Keyed, Ranged, decode_range, encode_range};
pub use compare::{compare_descending, compare_keys, parse_leading_number};
pub use error::TableError;
pub use lookup::resolve;
pub use sync::{RecomposeScope, decompose, recompose, reorder};
pub use table::{
    ChangeCause, ChangeEvent, ChangeOutcome, FocusTarget, KeyValueTable, RangeValueTable, TableOptions, ValueTable,
};
