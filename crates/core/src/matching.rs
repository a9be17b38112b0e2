use serde_json::Value;

/// Resolves a dot-separated path (e.g. `"order.id"`) against a JSON value,
/// descending through nested objects. A missing intermediate key, or a path
/// segment applied to a non-object, resolves to `Value::Null` rather than
/// erroring: a missing field and a field explicitly set to `null` are
/// indistinguishable to the matcher.
#[must_use]
pub fn extract_dot_path<'a>(value: &'a Value, path: &str) -> Value {
    let mut current = value;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Whether `candidate` satisfies an expectation's `detail` under the given
/// `match_fields`.
///
/// An empty `match_fields` list means the expectation only constrains
/// source and detail-type (checked by the caller before this runs), so the
/// detail bodies are not compared at all and this returns `true`
/// unconditionally. Otherwise every named field must resolve to equal
/// values on both sides, including the case where both sides resolve to
/// `Value::Null`.
#[must_use]
pub fn matches_expected_detail(
    expected: &Value,
    candidate: &Value,
    match_fields: &[String],
) -> bool {
    if match_fields.is_empty() {
        return true;
    }
    match_fields
        .iter()
        .all(|field| extract_dot_path(expected, field) == extract_dot_path(candidate, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_dot_path_descends_nested_objects() {
        let value = json!({"order": {"id": "abc", "total": 12}});
        assert_eq!(extract_dot_path(&value, "order.id"), json!("abc"));
    }

    #[test]
    fn extract_dot_path_missing_segment_is_null() {
        let value = json!({"order": {"id": "abc"}});
        assert_eq!(extract_dot_path(&value, "order.carrier"), Value::Null);
        assert_eq!(extract_dot_path(&value, "shipment.carrier"), Value::Null);
    }

    #[test]
    fn extract_dot_path_through_non_object_is_null() {
        let value = json!({"order": "abc"});
        assert_eq!(extract_dot_path(&value, "order.id"), Value::Null);
    }

    #[test]
    fn empty_match_fields_always_matches() {
        let expected = json!({"id": "abc"});
        let candidate = json!({"id": "xyz"});
        assert!(matches_expected_detail(&expected, &candidate, &[]));
    }

    #[test]
    fn match_fields_require_every_field_equal() {
        let expected = json!({"id": "abc", "carrier": "ups"});
        let candidate_matches = json!({"id": "abc", "carrier": "ups", "extra": true});
        let candidate_mismatches = json!({"id": "abc", "carrier": "fedex"});
        let fields = vec!["id".to_string(), "carrier".to_string()];
        assert!(matches_expected_detail(
            &expected,
            &candidate_matches,
            &fields
        ));
        assert!(!matches_expected_detail(
            &expected,
            &candidate_mismatches,
            &fields
        ));
    }

    #[test]
    fn both_sides_missing_field_counts_as_equal_null() {
        let expected = json!({"id": "abc"});
        let candidate = json!({"id": "abc"});
        let fields = vec!["carrier".to_string()];
        assert!(matches_expected_detail(&expected, &candidate, &fields));
    }
}
