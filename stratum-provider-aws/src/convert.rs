//! Conversion between attribute values and Cloud Control JSON documents

use std::collections::HashMap;

use serde_json::json;
use stratum_core::resource::Value;

/// Convert a JSON document value to an attribute value
pub fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        serde_json::Value::Array(arr) => {
            let items: Vec<Value> = arr.iter().filter_map(json_to_value).collect();
            Some(Value::List(items))
        }
        serde_json::Value::Object(obj) => {
            let map: HashMap<String, Value> = obj
                .iter()
                .filter_map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
                .collect();
            Some(Value::Map(map))
        }
        serde_json::Value::Null => None,
    }
}

/// Convert an attribute value to a JSON document value
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => json!(s),
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

/// JSON Patch moving a resource from its last known state to `desired`
///
/// `current` holds the properties last read from the service and `previous`
/// the properties declared at the last apply. Properties missing remotely are
/// added, changed ones replaced, and properties no longer declared removed.
/// Operations are sorted by path.
pub fn patch_document(
    current: Option<&HashMap<String, Value>>,
    previous: Option<&HashMap<String, Value>>,
    desired: &HashMap<String, Value>,
) -> Vec<serde_json::Value> {
    let mut ops: Vec<(String, serde_json::Value)> = Vec::new();

    for (key, value) in desired {
        let path = format!("/{}", key);
        let known = current
            .and_then(|props| props.get(key))
            .or_else(|| previous.and_then(|props| props.get(key)));
        match known {
            Some(existing) if existing == value => {}
            Some(_) => ops.push((
                path.clone(),
                json!({"op": "replace", "path": path, "value": value_to_json(value)}),
            )),
            None => ops.push((
                path.clone(),
                json!({"op": "add", "path": path, "value": value_to_json(value)}),
            )),
        }
    }

    if let Some(previous) = previous {
        for key in previous.keys().filter(|key| !desired.contains_key(*key)) {
            let path = format!("/{}", key);
            ops.push((path.clone(), json!({"op": "remove", "path": path})));
        }
    }

    ops.sort_by(|a, b| a.0.cmp(&b.0));
    ops.into_iter().map(|(_, op)| op).collect()
}
