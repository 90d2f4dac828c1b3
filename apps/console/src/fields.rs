//! `key=value` arguments turned into request payloads.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Fields the backend expects as JSON numbers.
const NUMERIC_FIELDS: &[&str] = &["price", "payment_price"];

pub fn parse_assignments(raw: &[String]) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for item in raw {
        let Some((key, value)) = item.split_once('=') else {
            bail!("expected key=value, got '{item}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty field name in '{item}'");
        }
        let value = if NUMERIC_FIELDS.contains(&key) {
            let number: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("field '{key}' must be a number, got '{value}'"))?;
            Value::from(number)
        } else {
            Value::from(value.to_string())
        };
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

/// Fills `key` only when the caller did not.
pub fn with_default(mut fields: Map<String, Value>, key: &str, value: impl Into<Value>) -> Map<String, Value> {
    fields.entry(key.to_string()).or_insert_with(|| value.into());
    fields
}

pub fn into_draft<D: DeserializeOwned>(fields: Map<String, Value>, entity: &str) -> Result<D> {
    serde_json::from_value(Value::Object(fields))
        .with_context(|| format!("incomplete or invalid fields for {entity}"))
}
