//! Nested property flattening.
//!
//! Plain maps are expanded into dotted paths; every other value (arrays,
//! temporals, opaque objects, scalars) is a leaf and is passed through
//! untouched for coercion later.

use tr_common::{PropBag, PropValue};

/// Flatten a property bag into single-level dotted-path entries.
pub fn flatten(bag: &PropBag) -> PropBag {
    let mut out = PropBag::new();
    flatten_into(bag, "", &mut out);
    out
}

/// Flatten under an explicit path prefix.
pub fn flatten_with_prefix(bag: &PropBag, prefix: &str) -> PropBag {
    let mut out = PropBag::new();
    flatten_into(bag, prefix, &mut out);
    out
}

fn flatten_into(bag: &PropBag, prefix: &str, out: &mut PropBag) {
    for (key, value) in bag.iter() {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            PropValue::PlainMap(nested) => flatten_into(nested, &path, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}
