//! Keyboard shortcut dispatcher.
//!
//! Translates key presses into named bus events. Definitions come from a
//! declarative JSON document; when it cannot be read the built-in set below
//! applies so the console stays operable.

use crate::component::ListenerScope;
use crate::event::{names, shortcuts as events, ShortcutsLoaded};
use crate::eventbus::EventBus;
use crate::error::Result;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Category assigned to shortcuts without one.
pub const OTHER_CATEGORY: &str = "other";
/// Sort position of categories without an explicit order.
pub const UNORDERED: u32 = 999;

/// Tags whose focus suppresses shortcut handling.
const TEXT_ENTRY_TAGS: &[&str] = &["INPUT", "TEXTAREA", "SELECT"];

/// One key binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutDefinition {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    /// Bus event emitted on match.
    pub event: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Static payload merged into the emitted detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ShortcutDefinition {
    pub fn new(key: impl Into<String>, event: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            alt: false,
            shift: false,
            event: event.into(),
            label: label.into(),
            description: None,
            category: None,
            data: None,
        }
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn category_or_other(&self) -> &str {
        self.category.as_deref().unwrap_or(OTHER_CATEGORY)
    }

    /// Whether this definition matches `event`'s key and modifiers.
    ///
    /// Plain keys compare case-insensitively unless the definition needs
    /// shift. A shifted uppercase letter must arrive in its shifted form.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let key = event.key.as_str();
        let mut key_match =
            self.key == key || (self.key.to_lowercase() == key.to_lowercase() && !self.shift);
        let mut shift_match = self.shift == event.shift;
        let ctrl_match = self.ctrl == (event.ctrl || event.meta);
        let alt_match = self.alt == event.alt;

        let shifted_letter =
            self.key == self.key.to_uppercase() && self.key != self.key.to_lowercase();
        if self.shift && shifted_letter {
            shift_match = event.shift;
            key_match = key == self.key || key.to_uppercase() == self.key;
        }

        key_match && shift_match && ctrl_match && alt_match
    }

    /// Human-readable key label, e.g. `Ctrl+Shift+R`.
    pub fn format_key(&self) -> String {
        let mut label = String::new();
        if self.ctrl {
            label.push_str("Ctrl+");
        }
        if self.alt {
            label.push_str("Alt+");
        }
        if self.shift {
            label.push_str("Shift+");
        }
        label.push_str(match self.key.as_str() {
            "Escape" => "Esc",
            " " => "Space",
            other => other,
        });
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutCategory {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl ShortcutCategory {
    pub fn new(label: impl Into<String>, order: u32) -> Self {
        Self {
            label: label.into(),
            order: Some(order),
        }
    }
}

/// Declarative shortcut document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortcutConfig {
    #[serde(default)]
    pub shortcuts: Vec<ShortcutDefinition>,
    #[serde(default)]
    pub categories: BTreeMap<String, ShortcutCategory>,
}

impl ShortcutConfig {
    /// Built-in shortcuts used when no document can be loaded.
    pub fn defaults() -> Self {
        let shortcuts = vec![
            ShortcutDefinition::new("r", events::RELOAD, "Reload").in_category("actions"),
            ShortcutDefinition::new("m", events::MAXIMIZE_TOGGLE, "Maximize").in_category("view"),
            ShortcutDefinition::new("n", events::NAMESPACE_NEXT, "Next Namespace")
                .in_category("navigation"),
            ShortcutDefinition::new("h", events::HELP_TOGGLE, "Help").in_category("help"),
            ShortcutDefinition::new("Escape", events::ESCAPE, "Close").in_category("navigation"),
        ];
        let categories = [
            ("actions", ShortcutCategory::new("Actions", 1)),
            ("view", ShortcutCategory::new("View", 2)),
            ("navigation", ShortcutCategory::new("Navigation", 3)),
            ("help", ShortcutCategory::new("Help", 4)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            shortcuts,
            categories,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }
}

/// Element that had focus when a key was pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusTarget {
    /// Upper-case tag name, e.g. `INPUT`.
    pub tag: String,
    pub content_editable: bool,
}

impl FocusTarget {
    pub fn accepts_text(&self) -> bool {
        self.content_editable || TEXT_ENTRY_TAGS.contains(&self.tag.to_uppercase().as_str())
    }
}

/// A key-down event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
    pub target: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Pressed while an element with `tag` had focus.
    pub fn in_element(mut self, tag: impl Into<String>) -> Self {
        self.target.tag = tag.into();
        self
    }

    /// Pressed inside an editable region.
    pub fn editable(mut self) -> Self {
        self.target.content_editable = true;
        self
    }
}

/// One category section of the help overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpGroup {
    pub category: String,
    pub label: String,
    pub order: u32,
    pub entries: Vec<HelpEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpEntry {
    pub keys: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Dispatches matched shortcuts onto the bus and owns the help overlay state.
pub struct ShortcutDispatcher {
    bus: EventBus,
    config: RwLock<ShortcutConfig>,
    enabled: AtomicBool,
    help_visible: AtomicBool,
    listeners: Mutex<ListenerScope>,
}

impl ShortcutDispatcher {
    /// Create a dispatcher with the built-in shortcuts and attach its help
    /// overlay listeners.
    pub fn new(bus: &EventBus) -> Arc<Self> {
        let dispatcher = Arc::new(Self {
            bus: bus.clone(),
            config: RwLock::new(ShortcutConfig::defaults()),
            enabled: AtomicBool::new(true),
            help_visible: AtomicBool::new(false),
            listeners: Mutex::new(ListenerScope::new(bus)),
        });

        let mut scope = ListenerScope::new(bus);
        scope.on_weak(events::HELP_TOGGLE, &dispatcher, |this, _| this.toggle_help());
        scope.on_weak(events::ESCAPE, &dispatcher, |this, _| {
            if this.help_visible() {
                this.hide_help();
            }
        });
        dispatcher.listeners.lock().absorb(scope);
        dispatcher
    }

    /// Replace the definitions with the document at `path`.
    ///
    /// On failure the current definitions stay in place and `false` is
    /// returned.
    pub async fn load(&self, path: &Path) -> bool {
        match ShortcutConfig::from_path(path).await {
            Ok(config) => {
                let count = config.shortcuts.len();
                *self.config.write() = config;
                tracing::info!(count, path = %path.display(), "Keyboard shortcuts loaded");
                self.bus.emit_with_source(
                    crate::event::BusEvent::typed(names::SHORTCUTS_LOADED, &ShortcutsLoaded { count }),
                    "shortcuts",
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not load keyboard shortcuts, using defaults"
                );
                false
            }
        }
    }

    /// Replace the definitions directly.
    pub fn set_config(&self, config: ShortcutConfig) {
        *self.config.write() = config;
    }

    pub fn config(&self) -> ShortcutConfig {
        self.config.read().clone()
    }

    /// Append definitions after the existing ones, adding any missing
    /// categories.
    pub fn append(
        &self,
        shortcuts: impl IntoIterator<Item = ShortcutDefinition>,
        categories: impl IntoIterator<Item = (String, ShortcutCategory)>,
    ) {
        let mut config = self.config.write();
        config.shortcuts.extend(shortcuts);
        for (key, category) in categories {
            config.categories.entry(key).or_insert(category);
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// First definition matching `event`. Definitions are tried in order.
    pub fn find_match(&self, event: &KeyEvent) -> Option<ShortcutDefinition> {
        self.config
            .read()
            .shortcuts
            .iter()
            .find(|def| def.matches(event))
            .cloned()
    }

    /// Handle a key press.
    ///
    /// Returns the emitted event name when a shortcut matched; the caller
    /// suppresses the default key action in that case.
    pub fn handle_key(&self, event: &KeyEvent) -> Option<String> {
        if !self.is_enabled() || event.target.accepts_text() {
            return None;
        }
        let shortcut = self.find_match(event)?;

        let mut detail = match &shortcut.data {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        detail.insert(
            "shortcut".to_string(),
            serde_json::to_value(&shortcut).unwrap_or(Value::Null),
        );

        tracing::debug!(event = %shortcut.event, key = %event.key, "Shortcut");
        self.bus.emit_with_source(
            crate::event::BusEvent::new(shortcut.event.clone(), Value::Object(detail)),
            "shortcuts",
        );
        Some(shortcut.event)
    }

    /// Definition bound to a bus event name.
    pub fn shortcut_for_event(&self, event: &str) -> Option<ShortcutDefinition> {
        self.config
            .read()
            .shortcuts
            .iter()
            .find(|def| def.event == event)
            .cloned()
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible.load(Ordering::SeqCst)
    }

    pub fn show_help(&self) {
        self.help_visible.store(true, Ordering::SeqCst);
    }

    pub fn hide_help(&self) {
        self.help_visible.store(false, Ordering::SeqCst);
    }

    pub fn toggle_help(&self) {
        self.help_visible.fetch_xor(true, Ordering::SeqCst);
    }

    /// Shortcuts grouped by category, sorted by category order.
    pub fn help_groups(&self) -> Vec<HelpGroup> {
        let config = self.config.read();
        let mut groups: Vec<HelpGroup> = Vec::new();

        for def in &config.shortcuts {
            let category = def.category_or_other();
            let entry = HelpEntry {
                keys: def.format_key(),
                label: def.label.clone(),
                description: def.description.clone(),
            };
            match groups.iter_mut().find(|g| g.category == category) {
                Some(group) => group.entries.push(entry),
                None => {
                    let meta = config.categories.get(category);
                    groups.push(HelpGroup {
                        category: category.to_string(),
                        label: meta
                            .map(|c| c.label.clone())
                            .unwrap_or_else(|| category.to_string()),
                        order: meta.and_then(|c| c.order).unwrap_or(UNORDERED),
                        entries: vec![entry],
                    });
                }
            }
        }

        // Stable: equal orders keep first-appearance order.
        groups.sort_by_key(|g| g.order);
        groups
    }

    /// Detach the help overlay listeners.
    pub fn teardown(&self) -> usize {
        self.listeners.lock().release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reload() -> ShortcutDefinition {
        ShortcutDefinition::new("r", events::RELOAD, "Reload")
    }

    #[test]
    fn test_plain_key_dispatches_and_text_input_suppresses() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let dispatcher = ShortcutDispatcher::new(&bus);
        dispatcher.set_config(ShortcutConfig {
            shortcuts: vec![reload()],
            categories: BTreeMap::new(),
        });

        assert_eq!(
            dispatcher.handle_key(&KeyEvent::new("r")).as_deref(),
            Some(events::RELOAD)
        );
        assert_eq!(dispatcher.handle_key(&KeyEvent::new("r").in_element("INPUT")), None);
        assert_eq!(dispatcher.handle_key(&KeyEvent::new("r").in_element("textarea")), None);
        assert_eq!(dispatcher.handle_key(&KeyEvent::new("r").editable()), None);

        assert_eq!(rx.drain_names(), vec![events::RELOAD]);
    }

    #[test]
    fn test_case_and_modifier_rules() {
        let plain = reload();
        assert!(plain.matches(&KeyEvent::new("R")));
        assert!(!plain.matches(&KeyEvent::new("r").ctrl()));
        assert!(!plain.matches(&KeyEvent::new("r").alt()));
        assert!(!plain.matches(&KeyEvent::new("R").shift()));

        let shifted = ShortcutDefinition::new("R", events::RELOAD, "Hard reload").with_shift();
        assert!(shifted.matches(&KeyEvent::new("R").shift()));
        assert!(!shifted.matches(&KeyEvent::new("R")));
        assert!(!shifted.matches(&KeyEvent::new("r")));

        let ctrl = ShortcutDefinition::new("k", "shortcut:search-focus", "Search").with_ctrl();
        assert!(ctrl.matches(&KeyEvent::new("k").ctrl()));
        assert!(ctrl.matches(&KeyEvent::new("k").meta()));
        assert!(!ctrl.matches(&KeyEvent::new("k")));
    }

    #[test]
    fn test_first_match_wins_and_detail_merges_data() {
        let bus = EventBus::new();
        let dispatcher = ShortcutDispatcher::new(&bus);
        dispatcher.set_config(ShortcutConfig {
            shortcuts: vec![
                ShortcutDefinition::new("1", events::NAMESPACE_SELECT, "First namespace")
                    .with_data(json!({"index": 0})),
                ShortcutDefinition::new("1", events::VIEW_FILES, "Files"),
            ],
            categories: BTreeMap::new(),
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.on(events::NAMESPACE_SELECT, move |e| sink.lock().push(e.detail.clone()));

        dispatcher.handle_key(&KeyEvent::new("1"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["index"], 0);
        assert_eq!(seen[0]["shortcut"]["event"], events::NAMESPACE_SELECT);
    }

    #[test]
    fn test_disabled_dispatcher_is_silent() {
        let bus = EventBus::new();
        let dispatcher = ShortcutDispatcher::new(&bus);
        dispatcher.disable();
        assert_eq!(dispatcher.handle_key(&KeyEvent::new("r")), None);
        dispatcher.enable();
        assert!(dispatcher.handle_key(&KeyEvent::new("r")).is_some());
    }

    #[test]
    fn test_help_overlay_follows_bus() {
        let bus = EventBus::new();
        let dispatcher = ShortcutDispatcher::new(&bus);

        dispatcher.handle_key(&KeyEvent::new("h"));
        assert!(dispatcher.help_visible());
        dispatcher.handle_key(&KeyEvent::new("Escape"));
        assert!(!dispatcher.help_visible());

        assert_eq!(dispatcher.teardown(), 2);
        bus.emit(events::HELP_TOGGLE, Value::Null);
        assert!(!dispatcher.help_visible());
    }

    #[test]
    fn test_help_groups_sorted_with_unordered_last() {
        let bus = EventBus::new();
        let dispatcher = ShortcutDispatcher::new(&bus);
        dispatcher.append(
            [
                ShortcutDefinition::new("1", events::VIEW_FILES, "Files").in_category("views"),
                ShortcutDefinition::new("?", "shortcut:about", "About"),
            ],
            [],
        );

        let groups = dispatcher.help_groups();
        let order: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(order, vec!["actions", "view", "navigation", "help", "views", "other"]);
        let navigation = &groups[2];
        assert_eq!(navigation.entries[1].keys, "Esc");
    }

    #[tokio::test]
    async fn test_load_failure_keeps_defaults() {
        let bus = EventBus::new();
        let dispatcher = ShortcutDispatcher::new(&bus);
        let dir = tempfile::tempdir().unwrap();

        assert!(!dispatcher.load(&dir.path().join("missing.json")).await);
        assert_eq!(dispatcher.config().shortcuts.len(), 5);

        let path = dir.path().join("shortcuts.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(!dispatcher.load(&path).await);
        assert!(dispatcher.shortcut_for_event(events::RELOAD).is_some());
    }

    #[tokio::test]
    async fn test_load_replaces_and_announces() {
        let bus = EventBus::new();
        let mut loaded = bus.filter().named(names::SHORTCUTS_LOADED);
        let dispatcher = ShortcutDispatcher::new(&bus);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcuts.json");
        std::fs::write(
            &path,
            r#"{"shortcuts":[{"key":"ArrowDown","event":"shortcut:item-next","label":"Next"}],
               "categories":{"navigation":{"label":"Navigation","order":1}}}"#,
        )
        .unwrap();

        assert!(dispatcher.load(&path).await);
        assert_eq!(
            dispatcher.handle_key(&KeyEvent::new("ArrowDown")).as_deref(),
            Some(events::ITEM_NEXT)
        );
        assert_eq!(dispatcher.handle_key(&KeyEvent::new("r")), None);
        let (event, _) = loaded.recv().await.unwrap();
        assert_eq!(event.detail["count"], 1);
    }
}
