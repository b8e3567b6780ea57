//! Scalar coercion.
//!
//! Converts any [`PropValue`] into a wire [`Scalar`], or `None` when the
//! value must be dropped. Never fails.

use tr_common::value::iso_string;
use tr_common::{PropValue, Scalar};

/// Maximum characters in a string parameter value.
pub const MAX_VALUE_LEN: usize = 100;

/// Coerce a value to a scalar, truncating strings to [`MAX_VALUE_LEN`].
pub fn coerce(value: &PropValue) -> Option<Scalar> {
    match value {
        PropValue::Null => None,
        PropValue::Number(n) if n.is_finite() => Some(Scalar::Num(*n)),
        PropValue::Bool(b) => Some(Scalar::Num(if *b { 1.0 } else { 0.0 })),
        PropValue::String(s) => Some(Scalar::Str(truncate_chars(s, MAX_VALUE_LEN))),
        PropValue::Temporal(t) => Some(Scalar::Str(iso_string(t))),
        // Non-finite numbers, arrays, maps, and opaque values serialize.
        other => other
            .to_json_string()
            .map(|json| Scalar::Str(truncate_chars(&json, MAX_VALUE_LEN))),
    }
}

/// Keep at most `max` characters. No ellipsis marker.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tr_common::PropBag;

    #[test]
    fn null_is_dropped() {
        assert_eq!(coerce(&PropValue::Null), None);
    }

    #[test]
    fn finite_numbers_pass_through() {
        assert_eq!(coerce(&PropValue::Number(42.5)), Some(Scalar::Num(42.5)));
        assert_eq!(coerce(&PropValue::Number(-0.0)), Some(Scalar::Num(-0.0)));
    }

    #[test]
    fn non_finite_numbers_serialize_as_null_string() {
        assert_eq!(coerce(&PropValue::Number(f64::NAN)), Some(Scalar::from("null")));
        assert_eq!(coerce(&PropValue::Number(f64::INFINITY)), Some(Scalar::from("null")));
    }

    #[test]
    fn booleans_become_one_or_zero() {
        assert_eq!(coerce(&PropValue::Bool(true)), Some(Scalar::Num(1.0)));
        assert_eq!(coerce(&PropValue::Bool(false)), Some(Scalar::Num(0.0)));
    }

    #[test]
    fn long_strings_truncated_to_100() {
        let long = "x".repeat(150);
        let Some(Scalar::Str(s)) = coerce(&PropValue::String(long)) else {
            panic!("expected string scalar");
        };
        assert_eq!(s.chars().count(), 100);
    }

    #[test]
    fn short_strings_unchanged() {
        assert_eq!(coerce(&PropValue::from("")), Some(Scalar::from("")));
        assert_eq!(coerce(&PropValue::from("abc")), Some(Scalar::from("abc")));
    }

    #[test]
    fn temporal_becomes_iso() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(
            coerce(&PropValue::Temporal(t)),
            Some(Scalar::from("2025-06-01T12:30:00.000Z"))
        );
    }

    #[test]
    fn structures_serialize_and_cap() {
        let arr = PropValue::Array(vec![PropValue::from(1), PropValue::from("b")]);
        assert_eq!(coerce(&arr), Some(Scalar::from(r#"[1,"b"]"#)));

        let big = PropValue::Array((0..100i32).map(PropValue::from).collect());
        let Some(Scalar::Str(s)) = coerce(&big) else {
            panic!("expected string scalar");
        };
        assert_eq!(s.len(), 100);
        assert!(s.starts_with("[0,1,2"));

        let empty = PropValue::PlainMap(PropBag::new());
        assert_eq!(coerce(&empty), Some(Scalar::from("{}")));
    }

    #[test]
    fn unserializable_opaque_dropped() {
        assert_eq!(coerce(&PropValue::Opaque(None)), None);
        assert_eq!(
            coerce(&PropValue::Opaque(Some("{}".into()))),
            Some(Scalar::from("{}"))
        );
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }
}
