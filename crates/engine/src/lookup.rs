use valuetable_types::{CellValue, KeyKind, Mapping};

use crate::codec::KeyShape;

/// Resolves a query value against a mapping the way a data binding consumes it.
///
/// The first admitting entry in mapping order wins; otherwise the default slot.
pub fn resolve<'m, S: KeyShape>(mapping: &'m Mapping, query: &str, key_kind: KeyKind) -> Option<&'m CellValue> {
    mapping
        .entries()
        .find(|(raw, _)| S::admits(&S::decode(raw), query, key_kind))
        .map(|(_, value)| value)
        .or_else(|| mapping.default_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Keyed, Ranged};

    #[test]
    fn ranges_resolve_first_match_then_default() {
        let mapping: Mapping =
            serde_json::from_str(r#"{"0~10": "low", "10~": "high", "default": "none"}"#).expect("parse mapping");
        assert_eq!(resolve::<Ranged>(&mapping, "3", KeyKind::Number), Some(&CellValue::from("low")));
        assert_eq!(resolve::<Ranged>(&mapping, "10", KeyKind::Number), Some(&CellValue::from("high")));
        assert_eq!(resolve::<Ranged>(&mapping, "-1", KeyKind::Number), Some(&CellValue::from("none")));
    }

    #[test]
    fn keys_resolve_exactly() {
        let mapping: Mapping = serde_json::from_str(r#"{"on": true, "off": false}"#).expect("parse mapping");
        assert_eq!(resolve::<Keyed>(&mapping, "off", KeyKind::String), Some(&CellValue::Flag(false)));
        assert_eq!(resolve::<Keyed>(&mapping, "unknown", KeyKind::String), None);
    }
}
