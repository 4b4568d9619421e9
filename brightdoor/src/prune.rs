use serde_json::Value;

/// Removes empty values from a JSON tree, bottom-up.
///
/// `null`, `""`, `[]` and `{}` are dropped at every depth. A container that
/// only held empty values is dropped as well. Returns `None` when nothing is
/// left. Applying it twice yields the same tree.
pub fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter_map(prune).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(map) => {
            let map: serde_json::Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, value)| prune(value).map(|value| (key, value)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        other => Some(other),
    }
}

/// True if any value at any depth would be removed by [`prune`].
pub fn contains_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty() || items.iter().any(contains_empty),
        Value::Object(map) => map.is_empty() || map.values().any(contains_empty),
        _ => false,
    }
}
