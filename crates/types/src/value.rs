use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ValueKind;

/// A single cell value: text (string and color tables) or a flag (boolean tables).
///
/// Deserialization is lenient so that documents written by other tools still
/// load: numbers become their decimal text and `null` becomes empty text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Flag(bool),
    Text(String),
}

impl CellValue {
    /// True only for empty text. `false` is a value, not a missing one.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    /// True when the cell carries something a user entered: non-empty text or a checked flag.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Text(text) => !text.is_empty(),
            Self::Flag(checked) => *checked,
        }
    }

    /// Converts the cell into the representation used by `kind`.
    ///
    /// Text shown in a checkbox is checked unless it is empty or `"false"`.
    pub fn conform(self, kind: ValueKind) -> Self {
        match (kind, self) {
            (ValueKind::Boolean, Self::Text(text)) => Self::Flag(!(text.is_empty() || text == "false")),
            (ValueKind::String | ValueKind::Color, Self::Flag(checked)) => Self::Text(checked.to_string()),
            (_, value) => value,
        }
    }

    /// Conforms the cell to `kind` and replaces an empty result with the kind's empty default.
    pub fn coerce(self, kind: ValueKind) -> Self {
        let value = self.conform(kind);
        if value.is_empty() { kind.empty_default() } else { value }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(checked) => Self::Flag(checked),
            Value::String(text) => Self::Text(text),
            Value::Null => Self::Text(String::new()),
            Value::Number(number) => Self::Text(number.to_string()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(checked) => write!(f, "{checked}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
