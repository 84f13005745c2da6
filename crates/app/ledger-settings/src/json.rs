use serde_json::{Map, Value};

/// Overlay `source` onto `target`, recursing into objects. `null` in `source`
/// never replaces a value.
pub(crate) fn merge_non_null_json_value(source: Value, target: &mut Value) {
    match (source, target) {
        (Value::Null, _) => {}
        (Value::Object(source), Value::Object(target)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_non_null_json_value(value, existing),
                    None if !value.is_null() => {
                        target.insert(key, value);
                    }
                    None => {}
                }
            }
        }
        (source, target) => *target = source,
    }
}

/// The parts of `update` that differ from `current`, as a sparse object.
pub(crate) fn json_difference(current: Value, update: &Value) -> Value {
    match (current, update) {
        (Value::Object(current), Value::Object(update)) => {
            let mut diff = Map::new();
            for (key, new_value) in update {
                match current.get(key) {
                    Some(old_value) if old_value == new_value => {}
                    Some(old_value) => {
                        diff.insert(key.clone(), json_difference(old_value.clone(), new_value));
                    }
                    None => {
                        diff.insert(key.clone(), new_value.clone());
                    }
                }
            }
            Value::Object(diff)
        }
        (_, update) => update.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merge_skips_nulls_and_recurses() {
        let mut target = json!({ "updates": { "channel": "stable", "serverUrl": "http://a" } });
        merge_non_null_json_value(
            json!({ "updates": { "channel": "beta", "serverUrl": null }, "extra": null }),
            &mut target,
        );
        assert_eq!(
            target,
            json!({ "updates": { "channel": "beta", "serverUrl": "http://a" } })
        );
    }

    #[test]
    fn difference_is_sparse() {
        let current = json!({ "updates": { "channel": "stable", "serverUrl": "http://a" } });
        let update = json!({ "updates": { "channel": "beta", "serverUrl": "http://a" } });
        assert_eq!(
            json_difference(current.clone(), &update),
            json!({ "updates": { "channel": "beta" } })
        );
        assert_eq!(json_difference(current.clone(), &current), json!({}));
    }
}
