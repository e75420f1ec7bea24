use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::sanitize::{extract_json_block, sanitize_llm_output};

/// Keys tried, in order, when a text field comes back as an object.
const LABEL_KEYS: &[&str] = &["name", "display", "text", "description", "value"];

/// Clean a raw model answer and parse the JSON object it carries.
pub fn parse_json_object(response: &str) -> Result<Value, String> {
    let cleaned = sanitize_llm_output(response);
    let block = extract_json_block(&cleaned)
        .ok_or_else(|| "No JSON object found in inference response".to_string())?;

    let value: Value = serde_json::from_str(block).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("Inference response is not a JSON object".to_string());
    }
    Ok(value)
}

/// Parse an array leniently, skipping items that fail to deserialize.
/// Returns the parsed items and how many were skipped.
pub fn parse_array_lenient<T: for<'de> Deserialize<'de>>(items: &[Value]) -> (Vec<T>, usize) {
    let mut parsed = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for item in items {
        match serde_json::from_value(item.clone()) {
            Ok(value) => parsed.push(value),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping record that does not fit the schema");
                skipped += 1;
            }
        }
    }
    (parsed, skipped)
}

/// Deserialize any JSON value into display text.
///
/// Models answer the same field as a string, a list, or an object depending
/// on the run; all of them collapse to one line of text.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

/// Deserialize a string or a list of strings/objects into a list of text.
pub fn text_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect(),
        other => {
            let text = value_to_text(&other);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    })
}

/// Deserialize an age given as a number, a float, or text like `"45 years"`.
pub fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.floor() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.split_whitespace().next().and_then(|t| t.parse().ok()),
        _ => None,
    })
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(map) => object_to_text(map),
    }
}

fn object_to_text(map: &Map<String, Value>) -> String {
    // FHIR HumanName: {"given": [...], "family": "..."}
    if map.contains_key("given") || map.contains_key("family") {
        let mut parts: Vec<String> = Vec::new();
        if let Some(given) = map.get("given") {
            let given = value_to_text(given).replace("; ", " ");
            if !given.is_empty() {
                parts.push(given);
            }
        }
        if let Some(family) = map.get("family") {
            let family = value_to_text(family);
            if !family.is_empty() {
                parts.push(family);
            }
        }
        if !parts.is_empty() {
            return parts.join(" ");
        }
    }

    for key in LABEL_KEYS {
        if let Some(Value::String(s)) = map.get(*key) {
            return s.trim().to_string();
        }
    }

    Value::Object(map.clone()).to_string()
}
