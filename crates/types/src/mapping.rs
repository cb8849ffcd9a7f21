use std::fmt;

use indexmap::IndexMap;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::CellValue;

/// The reserved key holding a mapping's fallback value.
pub const DEFAULT_KEY: &str = "default";

/// Sparse key (or encoded range) to value mapping with a reserved `default` slot.
///
/// Entries keep insertion order for display, but equality ignores it: two
/// mappings are equal when they hold the same entries and the same default.
/// The persisted form is a flat string-keyed object with `default` written last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: IndexMap<String, CellValue>,
    default: Option<CellValue>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry; the reserved key writes the default slot instead.
    ///
    /// Re-inserting an existing key replaces its value and keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        if key == DEFAULT_KEY {
            self.default = Some(value.into());
        } else {
            self.entries.insert(key, value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        if key == DEFAULT_KEY { self.default.as_ref() } else { self.entries.get(key) }
    }

    /// Non-default entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of non-default entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no non-default entries (the default slot is not counted).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_value(&self) -> Option<&CellValue> {
        self.default.as_ref()
    }

    pub fn set_default(&mut self, value: Option<CellValue>) {
        self.default = value;
    }

    pub fn with_default(mut self, value: impl Into<CellValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.entries.len() + usize::from(self.default.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        if let Some(default) = &self.default {
            map.serialize_entry(DEFAULT_KEY, default)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = Mapping;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string-keyed object of cell values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut mapping = Mapping::new();
                while let Some((key, value)) = access.next_entry::<String, CellValue>()? {
                    mapping.insert(key, value);
                }
                Ok(mapping)
            }

            // An absent document is an empty mapping.
            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Mapping::new())
            }
        }

        deserializer.deserialize_any(MappingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_lands_in_its_slot() {
        let mapping: Mapping = serde_json::from_str(r#"{"default": "z", "a": "x"}"#).expect("parse mapping");
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.default_value(), Some(&CellValue::from("z")));
        assert!(mapping.keys().all(|key| key != DEFAULT_KEY));
    }

    #[test]
    fn serializes_default_last() {
        let mut mapping = Mapping::new().with_default("c");
        mapping.insert("10~20", "a");
        mapping.insert("0~10", "b");
        let json = serde_json::to_string(&mapping).expect("serialize mapping");
        assert_eq!(json, r#"{"10~20":"a","0~10":"b","default":"c"}"#);
    }

    #[test]
    fn equality_ignores_entry_order() {
        let left: Mapping = [("a", "x"), ("b", "y")].into_iter().collect();
        let right: Mapping = [("b", "y"), ("a", "x")].into_iter().collect();
        assert_eq!(left, right);
    }

    #[test]
    fn yaml_documents_round_trip() {
        let mapping: Mapping = serde_yaml::from_str("a: true\nb: false\ndefault: false\n").expect("parse yaml");
        assert_eq!(mapping.get("a"), Some(&CellValue::Flag(true)));
        let yaml = serde_yaml::to_string(&mapping).expect("serialize yaml");
        let reparsed: Mapping = serde_yaml::from_str(&yaml).expect("reparse yaml");
        assert_eq!(reparsed, mapping);
    }
}
