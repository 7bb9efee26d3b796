//! Tolerant deserializers for fields the store and the evaluator encode inconsistently.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Identifiers arrive as JSON strings or integers depending on the source.
pub mod opt_id {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Required identifier, string or integer.
pub mod string_id {
    use super::*;
    use serde::de::Error;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "expected string or integer identifier, got {other}"
            ))),
        }
    }
}

/// Numbers that may be encoded as JSON numbers, numeric strings, or null.
pub mod opt_number {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
    }
}

/// A list field that may be missing or not list-shaped at all.
/// Non-arrays become `None`; array elements that fail to decode are dropped.
pub mod lenient_list {
    use super::*;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Array(items)) => Ok(Some(
                items
                    .into_iter()
                    .filter_map(|item| match serde_json::from_value::<T>(item) {
                        Ok(v) => Some(v),
                        Err(e) => {
                            tracing::debug!("Dropping undecodable list element: {e}");
                            None
                        }
                    })
                    .collect(),
            )),
            _ => Ok(None),
        }
    }
}
