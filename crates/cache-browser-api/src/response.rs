//! Decoded response bodies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A response body, decoded according to its content type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
}

impl ApiResponse {
    /// The body as a JSON value; text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            ApiResponse::Json(value) => value,
            ApiResponse::Text(text) => Value::String(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiResponse::Text(text) => Some(text),
            ApiResponse::Json(_) => None,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ApiResponse::Json(_))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.as_json()?.clone()).ok()
    }

    /// String items of a JSON array body. Any other shape yields nothing.
    pub fn strings(&self) -> Vec<String> {
        match self.as_json() {
            Some(Value::Array(items)) => collect_strings(items),
            _ => Vec::new(),
        }
    }

    /// Like [`strings`](Self::strings), also accepting `{field: [...]}`.
    pub fn strings_or_field(&self, field: &str) -> Vec<String> {
        match self.as_json() {
            Some(Value::Array(items)) => collect_strings(items),
            Some(Value::Object(map)) => match map.get(field) {
                Some(Value::Array(items)) => collect_strings(items),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Length of the body as the viewer reports it: the raw text, or the
    /// pretty-printed JSON.
    pub fn display_len(&self) -> usize {
        match self {
            ApiResponse::Text(text) => text.len(),
            ApiResponse::Json(value) => serde_json::to_string_pretty(value)
                .map(|s| s.len())
                .unwrap_or(0),
        }
    }
}

fn collect_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

impl From<Value> for ApiResponse {
    fn from(value: Value) -> Self {
        ApiResponse::Json(value)
    }
}

impl From<&str> for ApiResponse {
    fn from(text: &str) -> Self {
        ApiResponse::Text(text.to_string())
    }
}
