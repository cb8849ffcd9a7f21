use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use valuetable_types::KeyKind;

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("leading number pattern"));

/// Parses the longest numeric prefix of `text`, ignoring leading whitespace.
///
/// `"10px"` parses as `10.0`; text with no numeric prefix yields `None`.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text.trim_start())
        .and_then(|found| found.as_str().parse::<f64>().ok())
}

/// Three-way ascending comparison of two keys (or range bounds).
///
/// Numeric kinds compare parsed values; a key that does not parse orders
/// below every key that does, and two unparseable keys compare lexically.
pub fn compare_keys(left: &str, right: &str, kind: KeyKind) -> Ordering {
    if !kind.is_numeric() {
        return left.cmp(right);
    }
    match (parse_leading_number(left), parse_leading_number(right)) {
        (Some(l), Some(r)) => l.total_cmp(&r),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => left.cmp(right),
    }
}

/// The reorder comparator: descending by key.
pub fn compare_descending(left: &str, right: &str, kind: KeyKind) -> Ordering {
    compare_keys(right, left, kind)
}
