//! Bus event envelope and the payloads exchanged between components.
//!
//! Event names and payload field names are the wire contract between
//! independently versioned modules. Payload structs serialize to the exact
//! field names listeners read (`cacheId`, `sourceType`, `type`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known event names.
pub mod names {
    pub const COMPONENT_READY: &str = "component-ready";
    pub const NAMESPACE_CHANGED: &str = "namespace-changed";
    pub const FILE_SELECTED: &str = "file-selected";
    pub const CONTENT_LOADED: &str = "content-loaded";
    pub const CONTENT_DECODED: &str = "content-decoded";
    pub const VIEW_CHANGED: &str = "view-changed";
    pub const FILE_DETAIL_LOADED: &str = "file-detail-loaded";
    pub const HASH_DETAIL_LOADED: &str = "hash-detail-loaded";
    pub const NAVIGATE_TO_FILE: &str = "navigate-to-file";
    pub const AUTH_ERROR: &str = "cache-api:auth-error";
    pub const NETWORK_ERROR: &str = "cache-api:network-error";
    pub const HTML_PANEL_SHOW: &str = "html-panel:show";
    pub const HTML_PANEL_HIDE: &str = "html-panel:hide";
    pub const HTML_PANEL_CLOSE: &str = "html-panel:close";
    pub const SHORTCUTS_LOADED: &str = "shortcuts:loaded";
    /// Pointer pressed on the sidebar resize handle.
    pub const SIDEBAR_RESIZE_START: &str = "sidebar:resize-start";
    pub const SIDEBAR_RESIZE_MOVE: &str = "sidebar:resize-move";
    /// Pointer released; the width is persisted.
    pub const SIDEBAR_RESIZE_END: &str = "sidebar:resize-end";

    /// Prefix shared by every event the shortcut dispatcher emits.
    pub const SHORTCUT_PREFIX: &str = "shortcut:";
    /// Prefix shared by API client events.
    pub const API_PREFIX: &str = "cache-api:";
}

/// Shortcut event names used by the built-in components.
pub mod shortcuts {
    pub const RELOAD: &str = "shortcut:reload";
    pub const MAXIMIZE_TOGGLE: &str = "shortcut:maximize-toggle";
    pub const NAMESPACE_NEXT: &str = "shortcut:namespace-next";
    pub const NAMESPACE_PREV: &str = "shortcut:namespace-prev";
    pub const NAMESPACE_SELECT: &str = "shortcut:namespace-select";
    pub const HELP_TOGGLE: &str = "shortcut:help-toggle";
    pub const ESCAPE: &str = "shortcut:escape";
    pub const ITEM_NEXT: &str = "shortcut:item-next";
    pub const ITEM_PREV: &str = "shortcut:item-prev";
    pub const ITEM_OPEN: &str = "shortcut:item-open";
    pub const TAB_NEXT: &str = "shortcut:tab-next";
    pub const TAB_PREV: &str = "shortcut:tab-prev";
    pub const TREE_EXPAND: &str = "shortcut:tree-expand";
    pub const TREE_COLLAPSE: &str = "shortcut:tree-collapse";
    pub const VIEW_FILES: &str = "shortcut:view-files";
    pub const VIEW_HASHES: &str = "shortcut:view-hashes";
    pub const VIEW_RAW: &str = "shortcut:view-raw";
}

/// A named event with a structured payload.
///
/// Listeners receive `&BusEvent`, so every listener observes the detail
/// exactly as it was emitted: the payload is shared, never mutated in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub name: String,
    #[serde(default)]
    pub detail: Value,
    #[serde(default = "default_bubbles")]
    pub bubbles: bool,
}

fn default_bubbles() -> bool {
    true
}

impl BusEvent {
    /// Create an event with a raw JSON detail.
    pub fn new(name: impl Into<String>, detail: Value) -> Self {
        Self {
            name: name.into(),
            detail,
            bubbles: true,
        }
    }

    /// Create an event with no payload.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    /// Create an event from a typed payload.
    pub fn typed<T: Serialize>(name: impl Into<String>, payload: &T) -> Self {
        let detail = serde_json::to_value(payload).unwrap_or(Value::Null);
        Self::new(name, detail)
    }

    /// Decode the detail into a typed payload.
    pub fn detail_as<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.detail.clone()).ok()
    }

    /// Look up a string field of the detail.
    pub fn detail_str(&self, field: &str) -> Option<&str> {
        self.detail.get(field).and_then(Value::as_str)
    }

    pub fn is_shortcut(&self) -> bool {
        self.name.starts_with(names::SHORTCUT_PREFIX)
    }

    pub fn is_api_error(&self) -> bool {
        self.name.starts_with(names::API_PREFIX)
    }

    pub fn is_html_panel(&self) -> bool {
        self.name.starts_with("html-panel:")
    }
}

/// Metadata stamped on events forwarded to async subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Component or module that emitted the event.
    pub source: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentReady {
    pub component: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceChanged {
    pub namespace: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelected {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl FileSelected {
    pub fn new(path: impl Into<String>, kind: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
            namespace,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == "folder"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLoaded {
    pub path: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: usize,
}

/// Emitted by the content viewer once a file body has been decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDecoded {
    pub path: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewChanged {
    pub view: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDetailLoaded {
    #[serde(rename = "cacheId")]
    pub cache_id: String,
    pub refs: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashDetailLoaded {
    pub hash: String,
    pub refs: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateToFile {
    #[serde(rename = "cacheId")]
    pub cache_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthErrorDetail {
    pub status: u16,
    pub endpoint: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkErrorDetail {
    pub endpoint: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlPanelShow {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "sourceType", default = "raw_source")]
    pub source_type: String,
}

fn raw_source() -> String {
    "raw".to_string()
}

/// Horizontal pointer position during a sidebar drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutsLoaded {
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_selected_wire_shape() {
        let event = BusEvent::typed(
            names::FILE_SELECTED,
            &FileSelected::new("ns/data/a.json", "json", Some("ns".into())),
        );
        assert_eq!(
            event.detail,
            json!({"path": "ns/data/a.json", "type": "json", "namespace": "ns"})
        );
        let decoded: FileSelected = event.detail_as().unwrap();
        assert_eq!(decoded.kind, "json");
    }

    #[test]
    fn test_camel_case_fields() {
        let detail = serde_json::to_value(FileDetailLoaded {
            cache_id: "abc".into(),
            refs: json!({}),
        })
        .unwrap();
        assert!(detail.get("cacheId").is_some());

        let show = serde_json::to_value(HtmlPanelShow {
            html: "<p>".into(),
            path: "a.html".into(),
            source_type: "raw".into(),
        })
        .unwrap();
        assert_eq!(show["sourceType"], "raw");
    }

    #[test]
    fn test_event_classification() {
        assert!(BusEvent::bare(shortcuts::RELOAD).is_shortcut());
        assert!(BusEvent::bare(names::AUTH_ERROR).is_api_error());
        assert!(BusEvent::bare(names::HTML_PANEL_CLOSE).is_html_panel());
        assert!(!BusEvent::bare(names::FILE_SELECTED).is_shortcut());
    }
}
