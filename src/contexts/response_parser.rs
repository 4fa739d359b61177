use crate::contexts::GenerationError;
use serde_json::Value;
use std::collections::HashMap;

/// Model output decoded into one string per expected key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    values: HashMap<String, String>,
}

impl ParsedRecord {
    /// Value for `key`; absent keys read as empty
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParsedRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Decodes raw model output as a JSON object keyed by limit label.
///
/// Keys the model left out read as empty rather than failing the parse.
/// Anything that is not a JSON object at the top level is `InvalidFormat`.
pub fn parse(raw: &str, expected_keys: &[String]) -> Result<ParsedRecord, GenerationError> {
    let body = strip_code_fence(raw.trim());

    let value: Value = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidFormat(format!("{} in output starting {:?}", e, preview(body))))?;

    let Value::Object(map) = value else {
        return Err(GenerationError::InvalidFormat(format!(
            "expected a JSON object, got {}",
            json_type(&value)
        )));
    };

    let values = expected_keys
        .iter()
        .filter_map(|key| map.get(key).map(|v| (key.clone(), coerce(v))))
        .collect();

    Ok(ParsedRecord { values })
}

/// Strings pass through, scalars are stringified, anything else reads as empty
fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Unwraps a single ```` ```json ... ``` ```` fence around the whole output
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(text: &str) -> String {
    text.chars().take(40).collect()
}
