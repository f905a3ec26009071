//! Search string (de)serialization.
//!
//! # Design Decisions
//! - Keys and values are form-url-encoded
//! - Objects and arrays travel as JSON text
//! - A string that would itself parse as JSON (`"1"`, `"true"`) is written
//!   quoted so it comes back as a string
//! - Parsing JSON-decodes each value when possible and folds repeated keys
//!   into arrays

use crate::value::{Map, Value};
use std::sync::Arc;
use url::form_urlencoded;

/// Converts between search maps and query strings.
pub trait SearchSerializer: Send + Sync {
    /// Render a search map. Returns `""` for an empty map, `?..` otherwise.
    fn stringify(&self, search: &Value) -> String;

    /// Parse a query string, with or without its leading `?`.
    fn parse(&self, search_str: &str) -> Value;
}

/// The default JSON-aware serializer.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSearchSerializer;

impl JsonSearchSerializer {
    fn encode_value(value: &Value) -> Option<String> {
        match value {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => {
                if serde_json::from_str::<serde_json::Value>(s).is_ok() {
                    serde_json::to_string(&**s).ok()
                } else {
                    Some(s.to_string())
                }
            }
            Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
        }
    }

    fn decode_value(raw: &str) -> Value {
        serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw))
    }
}

impl SearchSerializer for JsonSearchSerializer {
    fn stringify(&self, search: &Value) -> String {
        let Some(map) = search.as_object() else {
            return String::new();
        };

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for (key, value) in map.iter() {
            if let Some(encoded) = Self::encode_value(value) {
                serializer.append_pair(key, &encoded);
                any = true;
            }
        }

        if any {
            format!("?{}", serializer.finish())
        } else {
            String::new()
        }
    }

    fn parse(&self, search_str: &str) -> Value {
        let raw = search_str.strip_prefix('?').unwrap_or(search_str);
        let mut grouped: std::collections::BTreeMap<String, Vec<Value>> = Default::default();

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            grouped
                .entry(key.into_owned())
                .or_default()
                .push(Self::decode_value(&value));
        }

        let map: Map = grouped
            .into_iter()
            .map(|(key, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::Array(Arc::new(values))
                };
                (key, value)
            })
            .collect();

        Value::Object(Arc::new(map))
    }
}
