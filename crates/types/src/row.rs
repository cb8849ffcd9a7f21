use std::{error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::CellValue;

/// Role a row plays in the editable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    /// Bound to a mapping entry; deletable.
    Existing,
    /// Trailing placeholder, promoted once key and value are filled.
    New,
    /// Fixed last row editing the `default` slot; its key field is disabled.
    Default,
}

/// An input field inside a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// The key of a key/value table.
    Key,
    /// The lower bound of a range table.
    From,
    /// The upper bound of a range table.
    To,
    Value,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::From => "from",
            Self::To => "to",
            Self::Value => "value",
        }
    }
}

impl FromStr for Field {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "key" => Ok(Self::Key),
            "from" => Ok(Self::From),
            "to" => Ok(Self::To),
            "value" => Ok(Self::Value),
            _ => Err(ParseFieldError),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseFieldError;

impl fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid field; expected 'key', 'from', 'to' or 'value'")
    }
}

impl Error for ParseFieldError {}

/// What an input reports when it changes: its text, or a checkbox state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Checked(bool),
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldInput {
    fn from(value: bool) -> Self {
        Self::Checked(value)
    }
}

impl From<FieldInput> for CellValue {
    fn from(input: FieldInput) -> Self {
        match input {
            FieldInput::Text(text) => Self::Text(text),
            FieldInput::Checked(checked) => Self::Flag(checked),
        }
    }
}

/// Bounds of a range key; an empty bound is unbounded on that side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeKey {
    pub from: String,
    pub to: String,
}

impl RangeKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Editable-grid projection of one entry, or the placeholder for a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row<K> {
    pub kind: RowKind,
    pub key: K,
    pub value: CellValue,
}

impl<K> Row<K> {
    pub fn existing(key: K, value: CellValue) -> Self {
        Self {
            kind: RowKind::Existing,
            key,
            value,
        }
    }

    pub fn is_deletable(&self) -> bool {
        self.kind == RowKind::Existing
    }

    pub fn is_key_editable(&self) -> bool {
        self.kind != RowKind::Default
    }
}
