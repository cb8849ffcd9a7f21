use thiserror::Error;
use valuetable_types::{Field, RowKind};

/// Misuse of the table editing API.
///
/// Malformed data never produces an error: empty keys are dropped and
/// unparseable numbers compare as unparseable. These variants only report
/// addressing a row or field that does not exist or cannot take the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("row {index} is out of range (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("field '{field}' does not exist on this table")]
    UnknownField { field: Field },
    #[error("field '{field}' takes text, not a checkbox state")]
    CheckedKeyInput { field: Field },
    #[error("row {index} ({kind:?}) cannot be deleted")]
    NotDeletable { index: usize, kind: RowKind },
}
