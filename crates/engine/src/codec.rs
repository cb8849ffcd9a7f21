//! Key shapes: how a row's key fields map to and from a mapping key.

use std::fmt::Debug;

use serde::Serialize;
use valuetable_types::{DEFAULT_KEY, Field, KeyKind, RangeKey};

use crate::compare::compare_keys;

/// Separator between the bounds of an encoded range key.
pub const RANGE_SEPARATOR: char = '~';

/// The shape of a table's key: its editable fields and its mapping-key codec.
pub trait KeyShape {
    type Key: Clone + Debug + Default + PartialEq + Serialize;

    /// Key fields of a row, in input order. The first one is the primary field.
    const KEY_FIELDS: &'static [Field];

    /// Comparator kind used when a table does not configure one.
    const DEFAULT_KEY_KIND: KeyKind;

    /// Encodes a key into its persisted mapping key.
    fn encode(key: &Self::Key) -> String;

    /// Decodes a persisted mapping key. Never fails.
    fn decode(raw: &str) -> Self::Key;

    /// Key shown in the fixed default row.
    fn default_row_key() -> Self::Key;

    /// Text that decides whether a row is kept and how it sorts.
    fn primary(key: &Self::Key) -> &str;

    fn field(key: &Self::Key, field: Field) -> Option<&str>;

    fn field_mut(key: &mut Self::Key, field: Field) -> Option<&mut String>;

    /// Whether a query value selects the entry with this key.
    fn admits(key: &Self::Key, query: &str, kind: KeyKind) -> bool;

    fn primary_field() -> Field {
        Self::KEY_FIELDS[0]
    }

    /// Rows whose primary text is the reserved key edit the default slot.
    fn is_default(key: &Self::Key) -> bool {
        Self::primary(key) == DEFAULT_KEY
    }
}

/// Discrete keys, used verbatim as mapping keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keyed;

impl KeyShape for Keyed {
    type Key = String;

    const KEY_FIELDS: &'static [Field] = &[Field::Key];

    const DEFAULT_KEY_KIND: KeyKind = KeyKind::String;

    fn encode(key: &String) -> String {
        key.clone()
    }

    fn decode(raw: &str) -> String {
        raw.to_string()
    }

    fn default_row_key() -> String {
        DEFAULT_KEY.to_string()
    }

    fn primary(key: &String) -> &str {
        key
    }

    fn field(key: &String, field: Field) -> Option<&str> {
        (field == Field::Key).then_some(key.as_str())
    }

    fn field_mut(key: &mut String, field: Field) -> Option<&mut String> {
        (field == Field::Key).then_some(key)
    }

    fn admits(key: &String, query: &str, kind: KeyKind) -> bool {
        key == query || (kind.is_numeric() && compare_keys(key, query, kind).is_eq())
    }
}

/// `from~to` range keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranged;

impl KeyShape for Ranged {
    type Key = RangeKey;

    const KEY_FIELDS: &'static [Field] = &[Field::From, Field::To];

    const DEFAULT_KEY_KIND: KeyKind = KeyKind::Number;

    fn encode(key: &RangeKey) -> String {
        encode_range(&key.from, &key.to)
    }

    fn decode(raw: &str) -> RangeKey {
        decode_range(raw)
    }

    fn default_row_key() -> RangeKey {
        RangeKey::new(DEFAULT_KEY, "")
    }

    fn primary(key: &RangeKey) -> &str {
        &key.from
    }

    fn field(key: &RangeKey, field: Field) -> Option<&str> {
        match field {
            Field::From => Some(&key.from),
            Field::To => Some(&key.to),
            Field::Key | Field::Value => None,
        }
    }

    fn field_mut(key: &mut RangeKey, field: Field) -> Option<&mut String> {
        match field {
            Field::From => Some(&mut key.from),
            Field::To => Some(&mut key.to),
            Field::Key | Field::Value => None,
        }
    }

    // `from <= query < to`, an empty bound being open.
    fn admits(key: &RangeKey, query: &str, kind: KeyKind) -> bool {
        let above_from = key.from.is_empty() || compare_keys(&key.from, query, kind).is_le();
        let below_to = key.to.is_empty() || compare_keys(query, &key.to, kind).is_lt();
        above_from && below_to
    }
}

/// Encodes a bound pair as `"<from>~<to>"`.
pub fn encode_range(from: &str, to: &str) -> String {
    format!("{from}{RANGE_SEPARATOR}{to}")
}

/// Splits a range key on its first `~`. A key without one is a lower bound only.
pub fn decode_range(raw: &str) -> RangeKey {
    match raw.split_once(RANGE_SEPARATOR) {
        Some((from, to)) => RangeKey::new(from, to),
        None => RangeKey::new(raw, ""),
    }
}
