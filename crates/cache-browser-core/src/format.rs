//! Display helpers shared by the console components.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const BYTE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Storage strategies recognised as the segment after `/data/`.
pub const STRATEGIES: &[&str] = &[
    "direct",
    "temporal",
    "temporal-latest",
    "temporal-versioned",
    "key-based",
];

/// `1536` → `1.5 KB`. Uses 1024 steps and at most one decimal.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.1}");
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
    format!("{trimmed} {}", BYTE_UNITS[unit])
}

/// Badge text for a list count: `-` while unknown, `1.2k` from a thousand.
pub fn format_count(count: Option<usize>) -> String {
    match count {
        None => "-".to_string(),
        Some(n) if n >= 1000 => format!("{:.1}k", n as f64 / 1000.0),
        Some(n) => n.to_string(),
    }
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Lower-cased text after the last dot, or empty.
pub fn extension(path: &str) -> String {
    match file_name(path).rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Cut `text` to `max` characters, appending `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// What a cache path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathKind {
    RefHash,
    RefId,
    Data,
    Other,
}

/// Components of a cache storage path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathInfo {
    pub full: String,
    pub namespace: Option<String>,
    pub kind: PathKind,
    pub hash: Option<String>,
    pub cache_id: Option<String>,
    pub strategy: Option<String>,
    pub file_name: String,
    pub extension: String,
}

pub fn parse_file_path(path: &str) -> PathInfo {
    let name = file_name(path);
    let stem = name.replacen(".json", "", 1);
    let namespace = path.split('/').next().filter(|s| !s.is_empty()).map(str::to_string);

    let (kind, hash, cache_id, strategy) = if path.contains("/refs/by-hash/") {
        (PathKind::RefHash, Some(stem), None, None)
    } else if path.contains("/refs/by-id/") {
        (PathKind::RefId, None, Some(stem), None)
    } else if path.contains("/data/") {
        let segment = path
            .split_once("/data/")
            .and_then(|(_, rest)| rest.split('/').next())
            .unwrap_or_default();
        let strategy = STRATEGIES
            .iter()
            .find(|s| **s == segment)
            .map(|s| s.to_string());
        (PathKind::Data, None, None, strategy)
    } else {
        (PathKind::Other, None, None, None)
    };

    PathInfo {
        full: path.to_string(),
        namespace,
        kind,
        hash,
        cache_id,
        strategy,
        file_name: name.to_string(),
        extension: extension(path),
    }
}

/// Rendering family of a file body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    Html,
    Text,
    Image,
    Binary,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Html => "html",
            ContentKind::Text => "text",
            ContentKind::Image => "image",
            ContentKind::Binary => "binary",
        }
    }

    /// Decide by file extension first, then by sniffing the body.
    pub fn detect(content: &Value, file_name: &str) -> Self {
        match extension(file_name).as_str() {
            "json" | "config" | "metadata" => return ContentKind::Json,
            "html" | "htm" => return ContentKind::Html,
            "txt" | "text" | "md" => return ContentKind::Text,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" => return ContentKind::Image,
            "bin" | "binary" | "dat" => return ContentKind::Binary,
            _ => {}
        }
        match content {
            Value::Object(_) | Value::Array(_) => ContentKind::Json,
            Value::String(text) => {
                let trimmed = text.trim();
                if (trimmed.starts_with('{') || trimmed.starts_with('['))
                    && serde_json::from_str::<Value>(trimmed).is_ok()
                {
                    ContentKind::Json
                } else if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
                    ContentKind::Html
                } else {
                    ContentKind::Text
                }
            }
            _ => ContentKind::Text,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key count and nesting depth of a JSON value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JsonStats {
    pub keys: usize,
    pub depth: usize,
}

pub fn json_stats(value: &Value) -> JsonStats {
    fn walk(value: &Value, depth: usize) -> JsonStats {
        let mut stats = JsonStats { keys: 0, depth };
        match value {
            Value::Array(items) => {
                for item in items {
                    let sub = walk(item, depth + 1);
                    stats.keys += sub.keys;
                    stats.depth = stats.depth.max(sub.depth);
                }
            }
            Value::Object(map) => {
                stats.keys = map.len();
                for item in map.values() {
                    let sub = walk(item, depth + 1);
                    stats.keys += sub.keys;
                    stats.depth = stats.depth.max(sub.depth);
                }
            }
            _ => {}
        }
        stats
    }
    walk(value, 0)
}
