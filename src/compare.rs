//! Filtered deep equality over JSON snapshots.
//!
//! The dirty check is a pure function of `(current, baseline, ignored)`.
//! Keeping it free of monitor state makes the comparison independently
//! testable and benchmarkable.

use std::borrow::Cow;

use serde_json::Value;

use crate::path::IgnoreSet;

/// Deep-compares two snapshots, skipping every ignored path.
///
/// A node whose walk position is in `ignored` is excluded from the diff on
/// both sides, subtree included; that covers keys present on only one side.
/// Object keys compare over the union of both key sets, arrays compare
/// index-wise (numeric path segments address elements), and numbers compare
/// by value across integer/float representations.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use statewatch::{filtered_eq, IgnoreSet};
///
/// let baseline = json!({"messages": {"world": "hello"}});
/// let current = json!({"messages": {"world": "changed"}});
///
/// let mut ignored = IgnoreSet::new();
/// assert!(!filtered_eq(&current, &baseline, &ignored));
///
/// ignored.insert("messages.world");
/// assert!(filtered_eq(&current, &baseline, &ignored));
/// ```
#[must_use]
pub fn filtered_eq(current: &Value, baseline: &Value, ignored: &IgnoreSet) -> bool {
    let mut walk = Vec::new();
    eq_at(current, baseline, ignored, &mut walk)
}

fn eq_at<'v>(
    current: &'v Value,
    baseline: &'v Value,
    ignored: &IgnoreSet,
    walk: &mut Vec<Cow<'v, str>>,
) -> bool {
    match (current, baseline) {
        (Value::Object(a), Value::Object(b)) => {
            let union = a
                .keys()
                .chain(b.keys().filter(|k| !a.contains_key(k.as_str())));

            for key in union {
                walk.push(Cow::Borrowed(key.as_str()));
                let equal = if ignored.matches_segments(walk) {
                    true
                } else {
                    match (a.get(key), b.get(key)) {
                        (Some(x), Some(y)) => eq_at(x, y, ignored, walk),
                        // Key present on one side only.
                        _ => false,
                    }
                };
                walk.pop();

                if !equal {
                    return false;
                }
            }
            true
        }

        (Value::Array(a), Value::Array(b)) => {
            for index in 0..a.len().max(b.len()) {
                walk.push(Cow::Owned(index.to_string()));
                let equal = if ignored.matches_segments(walk) {
                    true
                } else {
                    match (a.get(index), b.get(index)) {
                        (Some(x), Some(y)) => eq_at(x, y, ignored, walk),
                        // Length mismatch at a non-ignored index.
                        _ => false,
                    }
                };
                walk.pop();

                if !equal {
                    return false;
                }
            }
            true
        }

        (Value::Number(x), Value::Number(y)) => number_eq(x, y),

        _ => current == baseline,
    }
}

/// Value equality across JSON number representations (`1` equals `1.0`).
fn number_eq(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => x == y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_ignores() -> IgnoreSet {
        IgnoreSet::new()
    }

    fn ignoring(paths: &[&str]) -> IgnoreSet {
        let mut set = IgnoreSet::new();
        set.extend(paths.iter().copied());
        set
    }

    #[test]
    fn equal_documents_compare_equal() {
        let doc = json!({"a": 1, "b": {"c": [true, null, "x"]}});
        assert!(filtered_eq(&doc, &doc.clone(), &no_ignores()));
        assert!(filtered_eq(&json!({}), &json!({}), &no_ignores()));
        assert!(filtered_eq(&json!(null), &json!(null), &no_ignores()));
    }

    #[test]
    fn leaf_difference_is_detected() {
        let baseline = json!({"a": {"b": 1}});
        let current = json!({"a": {"b": 2}});
        assert!(!filtered_eq(&current, &baseline, &no_ignores()));
    }

    #[test]
    fn ignored_leaf_difference_is_skipped() {
        let baseline = json!({"messages": {"world": "hello", "foo": "bar"}});
        let current = json!({"messages": {"world": "changed", "foo": "bar"}});
        assert!(filtered_eq(&current, &baseline, &ignoring(&["messages.world"])));
    }

    #[test]
    fn sibling_difference_still_counts() {
        let baseline = json!({"messages": {"world": "hello", "foo": "bar"}});
        let current = json!({"messages": {"world": "changed", "foo": "changed too"}});
        assert!(!filtered_eq(&current, &baseline, &ignoring(&["messages.world"])));
    }

    #[test]
    fn one_sided_key_is_a_difference_unless_ignored() {
        let baseline = json!({});
        let current = json!({"test": true});
        assert!(!filtered_eq(&current, &baseline, &no_ignores()));
        assert!(filtered_eq(&current, &baseline, &ignoring(&["test"])));

        // Missing on the current side behaves the same way.
        assert!(!filtered_eq(&baseline, &current, &no_ignores()));
        assert!(filtered_eq(&baseline, &current, &ignoring(&["test"])));
    }

    #[test]
    fn ignoring_a_prefix_skips_the_whole_subtree() {
        let baseline = json!({"a": {"b": {"c": 1}}, "keep": 1});
        let current = json!({"a": {"b": {"c": 999}, "extra": true}, "keep": 1});
        assert!(filtered_eq(&current, &baseline, &ignoring(&["a"])));
        assert!(!filtered_eq(&current, &baseline, &no_ignores()));
    }

    #[test]
    fn ignored_path_does_not_rescue_a_parent_type_mismatch() {
        let baseline = json!({"a": 5});
        let current = json!({"a": {"b": 1}});
        assert!(!filtered_eq(&current, &baseline, &ignoring(&["a.b"])));
        assert!(filtered_eq(&current, &baseline, &ignoring(&["a"])));
    }

    #[test]
    fn arrays_compare_index_wise() {
        let baseline = json!({"items": [1, 2, 3]});
        assert!(filtered_eq(&json!({"items": [1, 2, 3]}), &baseline, &no_ignores()));
        assert!(!filtered_eq(&json!({"items": [1, 9, 3]}), &baseline, &no_ignores()));
        assert!(filtered_eq(
            &json!({"items": [1, 9, 3]}),
            &baseline,
            &ignoring(&["items.1"])
        ));
    }

    #[test]
    fn array_length_mismatch_needs_the_surplus_index_ignored() {
        let baseline = json!({"items": [1, 2]});
        let current = json!({"items": [1, 2, 3]});
        assert!(!filtered_eq(&current, &baseline, &no_ignores()));
        assert!(filtered_eq(&current, &baseline, &ignoring(&["items.2"])));
    }

    #[test]
    fn nested_array_paths_reach_into_elements() {
        let baseline = json!({"rows": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]});
        let current = json!({"rows": [{"id": 1, "name": "a"}, {"id": 2, "name": "edited"}]});
        assert!(!filtered_eq(&current, &baseline, &no_ignores()));
        assert!(filtered_eq(&current, &baseline, &ignoring(&["rows.1.name"])));
    }

    #[test]
    fn numbers_compare_by_value_across_representations() {
        assert!(filtered_eq(&json!(1), &json!(1.0), &no_ignores()));
        assert!(filtered_eq(&json!({"n": 2.0}), &json!({"n": 2}), &no_ignores()));
        assert!(!filtered_eq(&json!(1), &json!(2), &no_ignores()));
        assert!(!filtered_eq(&json!(-1), &json!(u64::MAX), &no_ignores()));
        assert!(filtered_eq(&json!(u64::MAX), &json!(u64::MAX), &no_ignores()));
    }

    #[test]
    fn type_mismatch_is_a_difference() {
        assert!(!filtered_eq(&json!({"a": 1}), &json!({"a": "1"}), &no_ignores()));
        assert!(!filtered_eq(&json!({"a": null}), &json!({"a": 0}), &no_ignores()));
        assert!(!filtered_eq(&json!([1]), &json!({"0": 1}), &no_ignores()));
    }

    #[test]
    fn ignore_matches_exact_depth_only() {
        // Ignoring "a.b" must not skip a root-level "b" or a deeper "a.b.c"
        // when the walk never reaches them through that exact position.
        let baseline = json!({"b": 1});
        let current = json!({"b": 2});
        assert!(!filtered_eq(&current, &baseline, &ignoring(&["a.b"])));
    }
}
