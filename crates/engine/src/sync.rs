//! Pure projections between a [`Mapping`] and its row list.
//!
//! The row list is always laid out as the existing rows in mapping order,
//! followed by the trailing new row, followed by the fixed default row.

use tracing::debug;
use valuetable_types::{CellValue, KeyKind, Mapping, Row, RowKind, ValueKind};

use crate::{codec::KeyShape, compare::compare_descending};

/// Which rows a recompose reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomposeScope {
    /// Existing and default rows.
    Committed,
    /// Existing, default and the trailing new row (the append path).
    IncludingNew,
}

impl RecomposeScope {
    fn includes(self, kind: RowKind) -> bool {
        kind != RowKind::New || self == Self::IncludingNew
    }
}

/// Projects a mapping into its row list without touching the mapping.
pub fn decompose<S: KeyShape>(mapping: &Mapping, value_kind: ValueKind) -> Vec<Row<S::Key>> {
    let mut rows: Vec<Row<S::Key>> = mapping
        .entries()
        .map(|(raw, value)| Row::existing(S::decode(raw), value.clone().conform(value_kind)))
        .collect();
    rows.push(blank_row::<S>(value_kind));
    rows.push(default_row::<S>(mapping.default_value(), value_kind));
    rows
}

/// A freshly reset new row.
pub fn blank_row<S: KeyShape>(value_kind: ValueKind) -> Row<S::Key> {
    Row {
        kind: RowKind::New,
        key: S::Key::default(),
        value: value_kind.blank(),
    }
}

pub fn default_row<S: KeyShape>(default: Option<&CellValue>, value_kind: ValueKind) -> Row<S::Key> {
    Row {
        kind: RowKind::Default,
        key: S::default_row_key(),
        value: default.map_or_else(|| value_kind.blank(), |value| value.clone().conform(value_kind)),
    }
}

/// Rebuilds a fresh mapping from the rows in `scope`.
///
/// Rows with an empty primary key are dropped. Rows keyed `default` (and the
/// default row itself) write the default slot. On duplicate keys the later row wins.
pub fn recompose<S: KeyShape>(rows: &[Row<S::Key>], scope: RecomposeScope, value_kind: ValueKind) -> Mapping {
    let mut mapping = Mapping::new();
    for row in rows.iter().filter(|row| scope.includes(row.kind)) {
        if S::primary(&row.key).is_empty() {
            continue;
        }
        let value = row.value.clone().coerce(value_kind);
        if row.kind == RowKind::Default || S::is_default(&row.key) {
            mapping.set_default(Some(value));
        } else {
            mapping.insert(S::encode(&row.key), value);
        }
    }
    debug!(entries = mapping.len(), ?scope, "recomposed mapping from rows");
    mapping
}

/// Sorts the non-default entries descending by primary key; the default stays last.
///
/// Keys keep their persisted text. Entries with equal keys keep their relative order.
pub fn reorder<S: KeyShape>(mapping: &Mapping, key_kind: KeyKind) -> Mapping {
    let mut entries: Vec<(&str, &CellValue, S::Key)> = mapping
        .entries()
        .map(|(raw, value)| (raw, value, S::decode(raw)))
        .collect();
    entries.sort_by(|left, right| compare_descending(S::primary(&left.2), S::primary(&right.2), key_kind));

    let mut sorted: Mapping = entries.into_iter().map(|(raw, value, _)| (raw, value.clone())).collect();
    sorted.set_default(mapping.default_value().cloned());
    sorted
}
