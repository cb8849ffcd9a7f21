use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::CellValue;

/// Literal written for a color cell left empty.
pub const COLOR_EMPTY_DEFAULT: &str = "#000000";

/// The configured value type of a table (`valuetype`).
///
/// Parsing never fails: unknown names fall back to [`ValueKind::String`].
/// The legacy input name `checkbox` is accepted as [`ValueKind::Boolean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ValueKind {
    #[default]
    String,
    Boolean,
    Color,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Color => "color",
        }
    }

    /// Value written by recompose when a row's value is empty.
    pub fn empty_default(self) -> CellValue {
        match self {
            Self::String => CellValue::Text(String::new()),
            Self::Color => CellValue::Text(COLOR_EMPTY_DEFAULT.to_string()),
            Self::Boolean => CellValue::Flag(false),
        }
    }

    /// Value held by a freshly reset input of this kind.
    pub fn blank(self) -> CellValue {
        match self {
            Self::Boolean => CellValue::Flag(false),
            Self::String | Self::Color => CellValue::Text(String::new()),
        }
    }

    /// Resolves the value-input variant used to edit cells of this kind.
    pub fn input_kind(self) -> InputKind {
        match self {
            Self::String => InputKind::Text,
            Self::Boolean => InputKind::Checkbox,
            Self::Color => InputKind::ColorPicker,
        }
    }
}

impl FromStr for ValueKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "boolean" | "checkbox" => Self::Boolean,
            "color" => Self::Color,
            _ => Self::String,
        })
    }
}

impl From<String> for ValueKind {
    fn from(value: String) -> Self {
        let Ok(kind) = value.parse::<Self>();
        kind
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparator kind for keys (`keytype`) or range bounds (`rangetype`).
///
/// Unknown names fall back to lexical comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum KeyKind {
    Number,
    #[default]
    String,
}

impl KeyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number)
    }
}

impl FromStr for KeyKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            _ => Self::String,
        })
    }
}

impl From<String> for KeyKind {
    fn from(value: String) -> Self {
        let Ok(kind) = value.parse::<Self>();
        kind
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The input widget variant a value cell is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Checkbox,
    ColorPicker,
}

/// Which of the two table shapes edits a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Discrete keys, edited by a key/value table.
    #[default]
    Map,
    /// `from~to` ranges, edited by a range/value table.
    Range,
}

impl TableKind {
    /// Resolves a property-editor type name to the table shape editing it.
    ///
    /// Returns `None` for property types that are not edited by a value table.
    pub fn from_property_type(property_type: &str) -> Option<Self> {
        match property_type.trim() {
            "map" | "value-map" => Some(Self::Map),
            "range" | "value-range" => Some(Self::Range),
            _ => None,
        }
    }

    /// Comparator kind used when none is configured.
    pub fn default_key_kind(self) -> KeyKind {
        match self {
            Self::Map => KeyKind::String,
            Self::Range => KeyKind::Number,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Range => "range",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
