//! Viewer for the body of the selected storage file.
//!
//! `load-file` and `format-json` are extensible: both run through an
//! [`InterceptorChain`] so extension modules can normalise the request and
//! act on the outcome without replacing the viewer's own logic. Once a body
//! is decoded the viewer emits `content-loaded` for bookkeeping and
//! `content-decoded` with the decoded value for anything that needs to look
//! inside it.

use super::{mark_active, names, set_enabled, state_elements, Deps};
use crate::tasks::Background;
use async_trait::async_trait;
use cache_browser_api::{ApiResponse, DynCacheApi};
use cache_browser_core::component::state_ids;
use cache_browser_core::event::{self, shortcuts, ContentDecoded, ContentLoaded, FileSelected};
use cache_browser_core::format::{self, json_stats, parse_file_path, ContentKind};
use cache_browser_core::{
    nav, Component, ComponentCore, Element, InterceptorChain, ListenerScope, LoadState, RenderRoot,
    RequestGeneration,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const LOAD_FILE: &str = "load-file";
pub const FORMAT_JSON: &str = "format-json";

/// String values longer than this are cut in the formatted view.
pub const DEFAULT_MAX_STRING_LEN: usize = 500;

pub const FORMATTED_TAB: &str = "formatted";
pub const RAW_TAB: &str = "raw";
pub const INFO_TAB: &str = "info";

const VIEWER: &str = "content-viewer";
const FILE_NAME: &str = "file-name";
const FILE_PATH: &str = "file-path";
const VIEWER_TABS: &str = "viewer-tabs";
const FORMATTED_CONTENT: &str = "formatted-content";
const CONTENT_STATS: &str = "content-stats";
const RAW_CONTENT: &str = "raw-content";
const INFO_GRID: &str = "info-grid";
const ACTION_BUTTONS: [&str; 3] = ["copy-btn", "reload-btn", "maximize-btn"];

/// Outcome of one `load-file` call.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded {
        path: String,
        content_type: ContentKind,
        size: usize,
    },
    /// Folders have no body.
    Skipped,
    /// A later load took over before this one finished.
    Superseded,
    Failed {
        message: String,
    },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Arguments of `format-json`.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRequest {
    pub value: Value,
    /// `None` shows strings in full.
    pub max_string_len: Option<usize>,
}

/// Pretty-print `value`, cutting long strings.
pub fn render_json(value: &Value, max_string_len: Option<usize>) -> String {
    let shown = match max_string_len {
        Some(max) => truncate_strings(value, max),
        None => value.clone(),
    };
    serde_json::to_string_pretty(&shown).unwrap_or_default()
}

fn truncate_strings(value: &Value, max: usize) -> Value {
    match value {
        Value::String(text) => Value::String(format::truncate(text, max)),
        Value::Array(items) => Value::Array(items.iter().map(|v| truncate_strings(v, max)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_strings(v, max)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Default)]
struct Current {
    path: Option<String>,
    namespace: Option<String>,
    kind: Option<String>,
    content_type: Option<ContentKind>,
    raw: String,
    value: Option<Value>,
}

pub struct ContentViewer {
    core: ComponentCore,
    api: DynCacheApi,
    tasks: Background,
    current: RwLock<Current>,
    active_tab: RwLock<String>,
    maximized: AtomicBool,
    requests: RequestGeneration,
    load_chain: InterceptorChain<FileSelected, LoadOutcome>,
    format_chain: InterceptorChain<FormatRequest, String>,
}

impl ContentViewer {
    pub fn new(deps: &Deps) -> Arc<Self> {
        let viewer = Arc::new(Self {
            core: deps.core(names::CONTENT_VIEWER, Self::render_root()),
            api: deps.api.clone(),
            tasks: deps.tasks.clone(),
            current: RwLock::new(Current::default()),
            active_tab: RwLock::new(FORMATTED_TAB.to_string()),
            maximized: AtomicBool::new(false),
            requests: RequestGeneration::new(),
            load_chain: InterceptorChain::new(names::CONTENT_VIEWER, LOAD_FILE),
            format_chain: InterceptorChain::new(names::CONTENT_VIEWER, FORMAT_JSON),
        });
        viewer.core.show_state(&LoadState::Empty);
        viewer
    }

    fn render_root() -> RenderRoot {
        let tab = |name: &str, label: &str| {
            Element::new("button")
                .with_id(format!("tab-{name}"))
                .with_class("viewer-tab")
                .with_attr("data-tab", name)
                .with_text(label)
        };
        let panel = |name: &str, child: Element| {
            Element::new("div")
                .with_id(format!("panel-{name}"))
                .with_class("viewer-panel")
                .with_attr("data-panel", name)
                .with_child(child)
        };
        let button = |id: &str, label: &str| {
            Element::new("button")
                .with_id(id)
                .with_attr("disabled", "true")
                .with_text(label)
        };

        let panels = vec![
            panel(
                FORMATTED_TAB,
                Element::new("pre").with_id(FORMATTED_CONTENT).with_class("json-content"),
            )
            .with_child(Element::new("span").with_id(CONTENT_STATS)),
            panel(RAW_TAB, Element::new("pre").with_id(RAW_CONTENT)).hidden(),
            panel(INFO_TAB, Element::new("dl").with_id(INFO_GRID).with_class("info-grid")).hidden(),
        ];

        let mut formatted = tab(FORMATTED_TAB, "Formatted");
        formatted.toggle_class("active", true);

        RenderRoot::new(
            names::CONTENT_VIEWER,
            Element::new("section").with_id(VIEWER).with_children([
                Element::new("header").with_id("viewer-header").with_children([
                    Element::new("span").with_id(FILE_NAME).with_text("No file selected"),
                    Element::new("span").with_id(FILE_PATH),
                ]),
                Element::new("div").with_id("viewer-actions").with_children([
                    button("copy-btn", "Copy"),
                    button("reload-btn", "Reload"),
                    button("maximize-btn", "Maximize"),
                ]),
                Element::new("div").with_id(VIEWER_TABS).with_children([
                    formatted,
                    tab(RAW_TAB, "Raw"),
                    tab(INFO_TAB, "Info"),
                ]),
                Element::new("div")
                    .with_id("viewer-body")
                    .with_children(state_elements("retry-btn", panels)),
            ]),
        )
        .with_slot("viewer-actions", "viewer-actions")
        .with_slot("viewer-tabs", VIEWER_TABS)
        .with_slot("viewer-panels", state_ids::CONTENT)
    }

    pub fn load_chain(&self) -> &InterceptorChain<FileSelected, LoadOutcome> {
        &self.load_chain
    }

    pub fn format_chain(&self) -> &InterceptorChain<FormatRequest, String> {
        &self.format_chain
    }

    pub fn current_path(&self) -> Option<String> {
        self.current.read().path.clone()
    }

    pub fn current_namespace(&self) -> Option<String> {
        self.current.read().namespace.clone()
    }

    pub fn content_type(&self) -> Option<ContentKind> {
        self.current.read().content_type
    }

    pub fn raw_content(&self) -> String {
        self.current.read().raw.clone()
    }

    pub fn decoded_value(&self) -> Option<Value> {
        self.current.read().value.clone()
    }

    pub fn formatted_text(&self) -> String {
        self.core
            .with_root(|root| root.text(FORMATTED_CONTENT).unwrap_or_default().to_string())
    }

    /// Text the copy action puts on the clipboard.
    pub fn copy_content(&self) -> Option<String> {
        let current = self.current.read();
        current.path.as_ref().map(|_| current.raw.clone())
    }

    /// Load a file through the `load-file` chain.
    pub async fn load_file(&self, request: FileSelected) -> LoadOutcome {
        self.load_chain
            .run(request, |request| self.fetch_and_render(request))
            .await
    }

    async fn fetch_and_render(&self, request: FileSelected) -> LoadOutcome {
        if request.is_folder() {
            return LoadOutcome::Skipped;
        }
        let ticket = self.requests.begin();
        let name = format::file_name(&request.path).to_string();
        *self.current.write() = Current {
            path: Some(request.path.clone()),
            namespace: request.namespace.clone(),
            kind: Some(request.kind.clone()),
            ..Default::default()
        };
        self.core.with_root_mut(|root| {
            root.set_text(FILE_NAME, name.as_str());
            root.set_text(FILE_PATH, request.path.as_str());
            for id in ACTION_BUTTONS {
                set_enabled(root, id, true);
            }
        });
        self.core.show_state(&LoadState::Loading);

        let result = self.api.file_json(&request.path).await;
        if !self.requests.is_current(ticket) {
            tracing::debug!(path = %request.path, "Dropping stale file body");
            return LoadOutcome::Superseded;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(path = %request.path, error = %e, "Failed to load content");
                self.core.show_state(&LoadState::error("Failed to load content"));
                return LoadOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };

        let raw = match &response {
            ApiResponse::Text(text) => text.clone(),
            ApiResponse::Json(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
        };
        let value = response.into_value();
        let content_type = ContentKind::detect(&value, &name);
        self.render_body(&request, &raw, &value, content_type);

        {
            let mut current = self.current.write();
            current.content_type = Some(content_type);
            current.raw = raw.clone();
            current.value = Some(value.clone());
        }
        self.switch_tab(FORMATTED_TAB);
        self.core.show_state(&LoadState::Content);

        let size = raw.len();
        tracing::debug!(path = %request.path, content_type = %content_type, size, "Content loaded");
        self.core.emit_typed(
            event::names::CONTENT_LOADED,
            &ContentLoaded {
                path: request.path.clone(),
                content_type: content_type.as_str().to_string(),
                size,
            },
        );
        self.core.emit_typed(
            event::names::CONTENT_DECODED,
            &ContentDecoded {
                path: request.path.clone(),
                content_type: content_type.as_str().to_string(),
                value,
            },
        );

        LoadOutcome::Loaded {
            path: request.path,
            content_type,
            size,
        }
    }

    fn render_body(&self, request: &FileSelected, raw: &str, value: &Value, content_type: ContentKind) {
        let (formatted, stats) = if content_type == ContentKind::Json {
            let structured = match value {
                Value::String(text) => serde_json::from_str(text.trim()).unwrap_or_else(|_| value.clone()),
                other => other.clone(),
            };
            let stats = json_stats(&structured);
            (
                self.format_json(&structured),
                format!("{} keys • {} levels deep", stats.keys, stats.depth),
            )
        } else {
            (
                raw.to_string(),
                format!("{} lines • {} chars", raw.lines().count(), raw.chars().count()),
            )
        };

        let info = parse_file_path(&request.path);
        let rows = [
            ("Path", request.path.clone()),
            ("Type", content_type.as_str().to_string()),
            ("Size", format::format_bytes(raw.len() as u64)),
            ("Namespace", request.namespace.clone().unwrap_or_else(|| "-".to_string())),
            ("Strategy", info.strategy.unwrap_or_else(|| "-".to_string())),
            ("Hash", info.hash.unwrap_or_else(|| "-".to_string())),
        ];
        let grid = rows
            .into_iter()
            .flat_map(|(label, value)| {
                let key = label.to_lowercase();
                [
                    Element::new("dt").with_class("info-label").with_text(format!("{label}:")),
                    Element::new("dd")
                        .with_id(format!("info-{key}"))
                        .with_class("info-value")
                        .with_text(value),
                ]
            })
            .collect();

        self.core.with_root_mut(|root| {
            root.set_text(FORMATTED_CONTENT, formatted);
            root.set_text(CONTENT_STATS, stats);
            root.set_text(RAW_CONTENT, raw);
            root.replace_children(INFO_GRID, grid);
        });
    }

    /// Pretty-print JSON through the `format-json` chain.
    pub fn format_json(&self, value: &Value) -> String {
        let request = FormatRequest {
            value: value.clone(),
            max_string_len: Some(DEFAULT_MAX_STRING_LEN),
        };
        self.format_chain
            .run_sync(request, |request| render_json(&request.value, request.max_string_len))
    }

    /// Load the current file again. Needs both a path and a namespace.
    pub async fn reload(&self) -> Option<LoadOutcome> {
        let request = {
            let current = self.current.read();
            match (&current.path, &current.namespace) {
                (Some(path), Some(namespace)) => FileSelected::new(
                    path.clone(),
                    current.kind.clone().unwrap_or_else(|| "file".to_string()),
                    Some(namespace.clone()),
                ),
                _ => return None,
            }
        };
        Some(self.load_file(request).await)
    }

    /// Visible tabs in display order.
    pub fn tabs(&self) -> Vec<String> {
        self.core.with_root(|root| {
            root.element(VIEWER_TABS)
                .map(|tabs| {
                    tabs.children
                        .iter()
                        .filter(|t| !t.hidden)
                        .filter_map(|t| t.attr("data-tab").map(str::to_string))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    pub fn active_tab(&self) -> String {
        self.active_tab.read().clone()
    }

    /// Show the panel of a visible tab.
    pub fn switch_tab(&self, name: &str) -> bool {
        if !self.tabs().iter().any(|t| t == name) {
            return false;
        }
        self.core.with_root_mut(|root| {
            mark_active(root, VIEWER_TABS, "data-tab", name);
            if let Some(content) = root.element_mut(state_ids::CONTENT) {
                for panel in content.children.iter_mut() {
                    if let Some(tab) = panel.attr("data-panel") {
                        panel.hidden = tab != name;
                    }
                }
            }
        });
        *self.active_tab.write() = name.to_string();
        true
    }

    pub fn next_tab(&self) -> bool {
        self.step_tab(nav::wrap_next)
    }

    pub fn prev_tab(&self) -> bool {
        self.step_tab(nav::wrap_prev)
    }

    fn step_tab(&self, step: fn(usize, usize) -> Option<usize>) -> bool {
        let tabs = self.tabs();
        let active = self.active_tab();
        let current = tabs.iter().position(|t| *t == active).unwrap_or(0);
        match step(current, tabs.len()) {
            Some(index) => self.switch_tab(&tabs[index]),
            None => false,
        }
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized.load(Ordering::SeqCst)
    }

    pub fn set_maximized(&self, maximized: bool) {
        self.maximized.store(maximized, Ordering::SeqCst);
        self.core.with_root_mut(|root| {
            if let Some(el) = root.element_mut(VIEWER) {
                el.toggle_class("maximized", maximized);
            }
        });
    }

    pub fn toggle_maximize(&self) -> bool {
        let maximized = !self.is_maximized();
        self.set_maximized(maximized);
        maximized
    }
}

#[async_trait]
impl Component for ContentViewer {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn required_elements(&self) -> &'static [&'static str] {
        &[FILE_NAME, VIEWER_TABS, FORMATTED_CONTENT, RAW_CONTENT, INFO_GRID]
    }

    fn extensible_operations(&self) -> &'static [&'static str] {
        &[LOAD_FILE, FORMAT_JSON]
    }

    fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
        scope.on_weak(event::names::FILE_SELECTED, &self, |this, event| {
            let Some(request) = event.detail_as::<FileSelected>() else {
                return;
            };
            if request.is_folder() {
                return;
            }
            let viewer = Arc::clone(this);
            this.tasks.spawn(async move {
                viewer.load_file(request).await;
            });
        });
        scope.on_weak(shortcuts::RELOAD, &self, |this, _| {
            if this.current_path().is_none() {
                return;
            }
            let viewer = Arc::clone(this);
            this.tasks.spawn(async move {
                viewer.reload().await;
            });
        });
        scope.on_weak(shortcuts::MAXIMIZE_TOGGLE, &self, |this, _| {
            this.toggle_maximize();
        });
        scope.on_weak(shortcuts::ESCAPE, &self, |this, _| {
            if this.is_maximized() {
                this.set_maximized(false);
            }
        });
        scope.on_weak(shortcuts::TAB_NEXT, &self, |this, _| {
            this.next_tab();
        });
        scope.on_weak(shortcuts::TAB_PREV, &self, |this, _| {
            this.prev_tab();
        });
    }

    fn clear(&self) {
        self.requests.invalidate();
        *self.current.write() = Current::default();
        self.core.with_root_mut(|root| {
            root.set_text(FILE_NAME, "No file selected");
            root.set_text(FILE_PATH, "");
            root.set_text(FORMATTED_CONTENT, "");
            root.set_text(CONTENT_STATS, "");
            root.set_text(RAW_CONTENT, "");
            root.replace_children(INFO_GRID, Vec::new());
            for id in ACTION_BUTTONS {
                set_enabled(root, id, false);
            }
        });
        self.core.show_state(&LoadState::Empty);
    }

    async fn refresh(&self) {
        self.reload().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_error, FakeApi};
    use cache_browser_api::endpoints;
    use cache_browser_core::{mount, EventBus, FnInterceptor};
    use serde_json::json;
    use std::time::Duration;

    const DOC: &str = "default/data/direct/a.json";

    fn service() -> Arc<FakeApi> {
        let api = FakeApi::new();
        api.respond(
            &endpoints::file_json(DOC),
            json!({"name": "x", "nested": {"k": [1, 2]}}),
        )
        .respond(&endpoints::file_json("default/notes.txt"), "line one\nline two");
        api
    }

    fn viewer(api: Arc<FakeApi>) -> (Arc<ContentViewer>, EventBus, Deps) {
        let bus = EventBus::new();
        let deps = Deps::new(bus.clone(), api);
        let viewer = ContentViewer::new(&deps);
        mount(&viewer).unwrap();
        (viewer, bus, deps)
    }

    fn doc() -> FileSelected {
        FileSelected::new(DOC, "json", Some("default".into()))
    }

    #[tokio::test]
    async fn test_file_selected_loads_json() {
        let (viewer, bus, deps) = viewer(service());
        let mut loaded = bus.filter().named(event::names::CONTENT_LOADED);
        let mut decoded = bus.filter().named(event::names::CONTENT_DECODED);

        bus.emit(event::names::FILE_SELECTED, serde_json::to_value(doc()).unwrap());
        deps.tasks.settle().await;

        assert_eq!(viewer.current_path().as_deref(), Some(DOC));
        assert_eq!(viewer.content_type(), Some(ContentKind::Json));
        assert!(viewer.formatted_text().contains("\"name\": \"x\""));

        let snapshot = viewer.core().snapshot();
        assert_eq!(snapshot.text(FILE_NAME), Some("a.json"));
        assert_eq!(snapshot.text(CONTENT_STATS), Some("3 keys • 3 levels deep"));
        assert_eq!(snapshot.text("info-strategy"), Some("direct"));
        assert_eq!(snapshot.text("info-namespace"), Some("default"));
        assert_eq!(snapshot.element("reload-btn").unwrap().attr("disabled"), None);
        assert_eq!(snapshot.is_hidden(state_ids::CONTENT), Some(false));

        let (event, _) = loaded.try_recv().unwrap();
        assert_eq!(event.detail["type"], "json");
        assert_eq!(event.detail["size"], viewer.raw_content().len());

        let (event, _) = decoded.try_recv().unwrap();
        assert_eq!(event.detail["contentType"], "json");
        assert_eq!(event.detail["value"]["nested"]["k"][1], 2);
    }

    #[tokio::test]
    async fn test_text_body_stats() {
        let (viewer, _bus, _deps) = viewer(service());
        let outcome = viewer
            .load_file(FileSelected::new("default/notes.txt", "text", Some("default".into())))
            .await;

        assert!(matches!(outcome, LoadOutcome::Loaded { content_type: ContentKind::Text, size: 17, .. }));
        assert_eq!(viewer.formatted_text(), "line one\nline two");
        assert_eq!(
            viewer.core().snapshot().text(CONTENT_STATS),
            Some("2 lines • 17 chars")
        );
    }

    #[tokio::test]
    async fn test_folders_are_skipped() {
        let api = service();
        let (viewer, _bus, _deps) = viewer(api.clone());
        let outcome = viewer
            .load_file(FileSelected::new("default/data", "folder", Some("default".into())))
            .await;
        assert_eq!(outcome, LoadOutcome::Skipped);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_shows_error_state() {
        let api = FakeApi::new();
        api.fail(&endpoints::file_json(DOC), http_error(500));
        let (viewer, _bus, _deps) = viewer(api);

        let outcome = viewer.load_file(doc()).await;
        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                message: "HTTP 500: Error".into()
            }
        );
        let snapshot = viewer.core().snapshot();
        assert_eq!(snapshot.text(state_ids::ERROR_MESSAGE), Some("Failed to load content"));
        assert_eq!(snapshot.is_hidden(state_ids::CONTENT), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_does_not_overwrite_newer_one() {
        let api = service();
        api.respond(&endpoints::file_json("default/slow.json"), json!({"old": true}))
            .delay(&endpoints::file_json("default/slow.json"), Duration::from_millis(300));
        let (viewer, _bus, _deps) = viewer(api);

        let (slow, fast) = tokio::join!(
            viewer.load_file(FileSelected::new("default/slow.json", "json", Some("default".into()))),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                viewer.load_file(doc()).await
            }
        );

        assert_eq!(slow, LoadOutcome::Superseded);
        assert!(fast.is_loaded());
        assert_eq!(viewer.current_path().as_deref(), Some(DOC));
        assert!(viewer.formatted_text().contains("nested"));
    }

    #[tokio::test]
    async fn test_long_strings_truncated_unless_hook_lifts_limit() {
        let (viewer, _bus, _deps) = viewer(service());
        let long = "a".repeat(600);
        let formatted = viewer.format_json(&json!({ "text": long }));
        assert!(formatted.contains(&format!("{}...", "a".repeat(500))));
        assert!(!formatted.contains(&long));

        viewer.format_chain().install(
            "untruncate",
            Arc::new(FnInterceptor::<FormatRequest, String>::new().before(|req| req.max_string_len = None)),
        );
        assert!(viewer.format_json(&json!({ "text": long })).contains(&long));
    }

    #[tokio::test]
    async fn test_pre_hook_normalises_request() {
        let api = service();
        let (viewer, _bus, _deps) = viewer(api.clone());
        viewer.load_chain().install(
            "trim",
            Arc::new(FnInterceptor::<FileSelected, LoadOutcome>::new().before(|req| {
                req.path = req.path.trim_start_matches('/').to_string();
            })),
        );

        let outcome = viewer
            .load_file(FileSelected::new(format!("/{DOC}"), "json", Some("default".into())))
            .await;
        assert!(outcome.is_loaded());
        assert_eq!(api.calls(), vec![endpoints::file_json(DOC)]);
    }

    #[tokio::test]
    async fn test_tabs_wrap_and_maximize() {
        let (viewer, bus, _deps) = viewer(service());
        assert_eq!(viewer.tabs(), vec![FORMATTED_TAB, RAW_TAB, INFO_TAB]);

        bus.emit(shortcuts::TAB_PREV, json!({}));
        assert_eq!(viewer.active_tab(), INFO_TAB);
        bus.emit(shortcuts::TAB_NEXT, json!({}));
        assert_eq!(viewer.active_tab(), FORMATTED_TAB);
        assert!(viewer.switch_tab(RAW_TAB));
        assert!(!viewer.switch_tab("html"));

        let snapshot = viewer.core().snapshot();
        assert_eq!(snapshot.is_hidden("panel-raw"), Some(false));
        assert_eq!(snapshot.is_hidden("panel-formatted"), Some(true));
        assert!(snapshot.element("tab-raw").unwrap().has_class("active"));

        bus.emit(shortcuts::MAXIMIZE_TOGGLE, json!({}));
        assert!(viewer.is_maximized());
        bus.emit(shortcuts::ESCAPE, json!({}));
        assert!(!viewer.is_maximized());
    }

    #[tokio::test]
    async fn test_reload_needs_namespace_and_clear_resets() {
        let api = service();
        let (viewer, _bus, _deps) = viewer(api.clone());

        viewer.load_file(FileSelected::new(DOC, "json", None)).await;
        assert!(viewer.reload().await.is_none());

        viewer.load_file(doc()).await;
        assert!(viewer.reload().await.unwrap().is_loaded());
        assert_eq!(api.call_count(&endpoints::file_json(DOC)), 3);

        viewer.clear();
        assert!(viewer.current_path().is_none());
        assert!(viewer.copy_content().is_none());
        let snapshot = viewer.core().snapshot();
        assert_eq!(snapshot.text(FILE_NAME), Some("No file selected"));
        assert_eq!(snapshot.element("copy-btn").unwrap().attr("disabled"), Some("true"));
        assert_eq!(snapshot.is_hidden(state_ids::EMPTY), Some(false));
    }
}
