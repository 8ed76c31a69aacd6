//! Cache entries of a namespace listed by cache id, with a detail pane.

use super::{list_rows, list_stats, mark_active, names, state_elements, Deps};
use crate::tasks::Background;
use async_trait::async_trait;
use cache_browser_api::DynCacheApi;
use cache_browser_core::event::{
    self, shortcuts, FileDetailLoaded, FileSelected, NamespaceChanged, NavigateToFile, ViewChanged,
};
use cache_browser_core::nav::FilteredList;
use cache_browser_core::{
    Component, ComponentCore, Element, ListenerScope, LoadState, RenderRoot, RequestGeneration,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FILES_VIEW: &str = "files";

const FILES_FILTER: &str = "files-filter";
const FILES_STATS: &str = "files-stats";
const FILES_ITEMS: &str = "files-items";
const DETAIL_EMPTY: &str = "detail-empty";
const DETAIL_CONTENT: &str = "detail-content";
const DETAIL_ID: &str = "detail-id";
const DETAIL_KEY_PATH: &str = "detail-key-path";
const DETAIL_TABS: &str = "detail-tabs";
const DETAIL_BODY: &str = "detail-body";
const DETAIL_ERROR: &str = "detail-error";

/// Tabs of the detail pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Content,
    Metadata,
    Config,
    Refs,
}

impl DetailTab {
    pub const ALL: [DetailTab; 4] = [
        DetailTab::Content,
        DetailTab::Metadata,
        DetailTab::Config,
        DetailTab::Refs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailTab::Content => "content",
            DetailTab::Metadata => "metadata",
            DetailTab::Config => "config",
            DetailTab::Refs => "refs",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    fn label(&self) -> &'static str {
        match self {
            DetailTab::Content => "Content",
            DetailTab::Metadata => "Metadata",
            DetailTab::Config => "Config",
            DetailTab::Refs => "Refs",
        }
    }
}

/// The parts of a `refs/all` answer the detail pane shows.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDetail {
    pub cache_id: String,
    pub strategy: Option<String>,
    pub cache_hash: Option<String>,
    pub file_type: Option<String>,
    pub content_path: Option<String>,
    /// Storage key of `key_based` entries.
    pub key_path: Option<String>,
    pub data_paths: Vec<String>,
    pub by_id_paths: Vec<String>,
    pub by_hash_paths: Vec<String>,
    pub metadata: Value,
    pub config: Value,
    /// Cache ids listed by the hash reference, this entry included.
    pub shared_with: Vec<String>,
}

impl FileDetail {
    pub fn from_refs(cache_id: &str, refs: &Value) -> Self {
        let by_id = &refs["by_id"];
        let details = &refs["details"];
        let text = |v: &Value| v.as_str().map(str::to_string);
        let paths = |v: &Value| -> Vec<String> {
            v.as_array()
                .map(|items| items.iter().filter_map(|p| p.as_str().map(str::to_string)).collect())
                .unwrap_or_default()
        };

        let data_paths = paths(&by_id["all_paths"]["data"]);
        let by_hash_paths = paths(&by_id["all_paths"]["by_hash"]);
        let detail_for = |suffix: &str| {
            data_paths
                .iter()
                .find(|p| p.ends_with(suffix))
                .and_then(|p| details.get(p))
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()))
        };
        let shared_with = by_hash_paths
            .first()
            .and_then(|p| details[p]["cache_ids"].as_array())
            .map(|ids| {
                ids.iter()
                    .filter_map(|item| item["cache_id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let strategy = text(&by_id["strategy"]);
        let content_path = by_id["file_paths"]["content_files"]
            .get(0)
            .and_then(Value::as_str)
            .map(str::to_string);
        let key_path = match (strategy.as_deref(), content_path.as_deref()) {
            (Some("key_based"), Some(path)) => key_path(path),
            _ => None,
        };

        Self {
            cache_id: text(&by_id["cache_id"]).unwrap_or_else(|| cache_id.to_string()),
            strategy,
            cache_hash: text(&by_id["cache_hash"]),
            file_type: text(&by_id["file_type"]),
            content_path,
            key_path,
            metadata: detail_for(".metadata"),
            config: detail_for(".config"),
            by_id_paths: paths(&by_id["all_paths"]["by_id"]),
            data_paths,
            by_hash_paths,
            shared_with,
        }
    }
}

fn key_path(content_path: &str) -> Option<String> {
    let (_, rest) = content_path.split_once("key-based/")?;
    let (key, _) = rest.split_once(".json")?;
    (!key.is_empty()).then(|| key.to_string())
}

#[derive(Debug, Default)]
struct DetailState {
    opened: Option<String>,
    detail: Option<FileDetail>,
    error: Option<String>,
}

pub struct FilesView {
    core: ComponentCore,
    api: DynCacheApi,
    tasks: Background,
    debounce: Duration,
    namespace: RwLock<Option<String>>,
    list: RwLock<FilteredList>,
    load_state: RwLock<LoadState>,
    detail: RwLock<DetailState>,
    tab: RwLock<DetailTab>,
    requests: RequestGeneration,
    detail_requests: RequestGeneration,
    filter_requests: RequestGeneration,
    active: AtomicBool,
}

impl FilesView {
    pub fn new(deps: &Deps) -> Arc<Self> {
        Arc::new(Self {
            core: deps.core(names::FILES_VIEW, Self::render_root()),
            api: deps.api.clone(),
            tasks: deps.tasks.clone(),
            debounce: deps.filter_debounce,
            namespace: RwLock::new(None),
            list: RwLock::new(FilteredList::default()),
            load_state: RwLock::new(LoadState::Idle),
            detail: RwLock::new(DetailState::default()),
            tab: RwLock::new(DetailTab::Content),
            requests: RequestGeneration::new(),
            detail_requests: RequestGeneration::new(),
            filter_requests: RequestGeneration::new(),
            active: AtomicBool::new(false),
        })
    }

    fn render_root() -> RenderRoot {
        let mut list = vec![
            Element::new("input")
                .with_id(FILES_FILTER)
                .with_attr("placeholder", "Filter by cache id..."),
            Element::new("span").with_id(FILES_STATS).with_text("0 files"),
        ];
        list.extend(state_elements(
            "files-retry-btn",
            vec![Element::new("div").with_id(FILES_ITEMS).with_class("files-items")],
        ));

        let tabs = DetailTab::ALL.into_iter().map(|tab| {
            let mut el = Element::new("button")
                .with_id(format!("detail-tab-{}", tab.as_str()))
                .with_class("detail-tab")
                .with_attr("data-tab", tab.as_str())
                .with_text(tab.label());
            el.toggle_class("active", tab == DetailTab::Content);
            el
        });

        RenderRoot::new(
            names::FILES_VIEW,
            Element::new("div").with_id("files-view").with_children([
                Element::new("div").with_id("files-list").with_children(list),
                Element::new("div").with_id("files-detail").with_children([
                    Element::new("div")
                        .with_id(DETAIL_EMPTY)
                        .with_text("Select a file to see its details"),
                    Element::new("div").with_id(DETAIL_CONTENT).hidden().with_children([
                        Element::new("span").with_id(DETAIL_ID),
                        Element::new("div").with_id(DETAIL_KEY_PATH).hidden(),
                        Element::new("div").with_id("detail-actions").with_children([
                            Element::new("button").with_id("detail-copy-btn").with_text("Copy id"),
                            Element::new("button").with_id("view-raw-btn").with_text("View in Raw"),
                        ]),
                        Element::new("div").with_id(DETAIL_TABS).with_children(tabs),
                        Element::new("div").with_id(DETAIL_BODY),
                        Element::new("div").with_id(DETAIL_ERROR).with_class("error").hidden(),
                    ]),
                ]),
            ]),
        )
        .with_slot("detail-actions", "detail-actions")
    }

    pub fn namespace(&self) -> Option<String> {
        self.namespace.read().clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn file_ids(&self) -> Vec<String> {
        self.list.read().items().to_vec()
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.list.read().visible().into_iter().map(str::to_string).collect()
    }

    /// Row the keyboard cursor is on.
    pub fn focused(&self) -> Option<String> {
        self.list.read().selected().map(str::to_string)
    }

    /// Entry whose detail is shown.
    pub fn opened(&self) -> Option<String> {
        self.detail.read().opened.clone()
    }

    pub fn detail(&self) -> Option<FileDetail> {
        self.detail.read().detail.clone()
    }

    pub fn detail_error(&self) -> Option<String> {
        self.detail.read().error.clone()
    }

    pub fn detail_tab(&self) -> DetailTab {
        *self.tab.read()
    }

    fn set_state(&self, state: LoadState) {
        self.core.show_state(&state);
        *self.load_state.write() = state;
    }

    fn reset(&self, namespace: Option<String>) {
        self.requests.invalidate();
        self.detail_requests.invalidate();
        *self.namespace.write() = namespace;
        self.list.write().clear();
        *self.detail.write() = DetailState::default();
        self.render_list();
        self.render_detail();
        self.set_state(LoadState::Idle);
    }

    pub async fn load_files(&self) {
        let Some(namespace) = self.namespace() else {
            return;
        };
        let ticket = self.requests.begin();
        self.set_state(LoadState::Loading);

        let result = self.api.file_ids(&namespace).await;
        if !self.requests.is_current(ticket) {
            tracing::debug!(namespace = %namespace, "Dropping stale file id list");
            return;
        }

        match result {
            Ok(response) => {
                let ids = response.strings();
                tracing::debug!(namespace = %namespace, count = ids.len(), "File ids loaded");
                let empty = ids.is_empty();
                self.list.write().set_items(ids);
                self.render_list();
                self.set_state(if empty { LoadState::Empty } else { LoadState::Content });
            }
            Err(e) => {
                tracing::warn!(namespace = %namespace, error = %e, "Failed to load files");
                self.set_state(LoadState::error(e.to_string()));
            }
        }
    }

    /// Fetch and show everything stored for one cache id.
    pub async fn load_file_detail(&self, cache_id: &str) {
        let Some(namespace) = self.namespace() else {
            return;
        };
        if cache_id.is_empty() {
            return;
        }
        let ticket = self.detail_requests.begin();
        {
            let mut detail = self.detail.write();
            detail.opened = Some(cache_id.to_string());
            detail.error = None;
        }
        self.render_list();

        let result = self.api.retrieve_refs_all(&namespace, cache_id).await;
        if !self.detail_requests.is_current(ticket) {
            return;
        }

        match result {
            Ok(response) => {
                let refs = response.into_value();
                let parsed = FileDetail::from_refs(cache_id, &refs);
                self.detail.write().detail = Some(parsed);
                self.render_detail();
                self.core.emit_typed(
                    event::names::FILE_DETAIL_LOADED,
                    &FileDetailLoaded {
                        cache_id: cache_id.to_string(),
                        refs,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(cache_id, error = %e, "Failed to load file detail");
                {
                    let mut detail = self.detail.write();
                    detail.detail = None;
                    detail.error = Some(e.to_string());
                }
                self.render_detail();
            }
        }
    }

    pub fn input_filter(self: &Arc<Self>, text: &str) {
        let ticket = self.filter_requests.begin();
        let this = Arc::clone(self);
        let text = text.to_string();
        self.core
            .with_root_mut(|root| root.set_attr(FILES_FILTER, "value", text.as_str()));
        self.tasks.spawn(async move {
            tokio::time::sleep(this.debounce).await;
            if this.filter_requests.is_current(ticket) {
                this.apply_filter(&text);
            }
        });
    }

    pub fn apply_filter(&self, text: &str) {
        let state = {
            let mut list = self.list.write();
            list.set_filter(text);
            list.clear_selection();
            if list.visible().is_empty() {
                LoadState::Empty
            } else {
                LoadState::Content
            }
        };
        self.render_list();
        if self.namespace().is_some() {
            self.set_state(state);
        }
    }

    pub fn focus_next(&self) -> Option<String> {
        let focused = self.list.write().select_next();
        self.render_list();
        focused
    }

    pub fn focus_prev(&self) -> Option<String> {
        let focused = self.list.write().select_prev();
        self.render_list();
        focused
    }

    /// Open the focused row.
    pub async fn open_focused(&self) {
        if let Some(id) = self.focused() {
            self.load_file_detail(&id).await;
        }
    }

    pub fn switch_detail_tab(&self, tab: DetailTab) {
        *self.tab.write() = tab;
        self.render_detail();
    }

    /// Show the entry's content file in the raw browser.
    pub fn view_raw(&self) -> bool {
        let Some(path) = self.detail().and_then(|d| d.content_path) else {
            return false;
        };
        self.core.emit_typed(
            event::names::FILE_SELECTED,
            &FileSelected::new(path, "json", self.namespace()),
        );
        true
    }

    /// Cache id the copy action puts on the clipboard.
    pub fn copy_id(&self) -> Option<String> {
        self.detail().map(|d| d.cache_id)
    }

    fn render_list(&self) {
        let (rows, stats) = {
            let list = self.list.read();
            let opened = self.detail.read().opened.clone();
            (
                list_rows(&list, "file", "file-item", opened.as_deref()),
                list_stats(list.visible().len(), list.len(), "files"),
            )
        };
        self.core.with_root_mut(|root| {
            root.replace_children(FILES_ITEMS, rows);
            root.set_text(FILES_STATS, stats);
        });
    }

    fn render_detail(&self) {
        let tab = self.detail_tab();
        let state = self.detail.read();
        self.core.with_root_mut(|root| {
            let has_detail = state.detail.is_some() || state.error.is_some();
            root.set_hidden(DETAIL_EMPTY, has_detail);
            root.set_hidden(DETAIL_CONTENT, !has_detail);
            mark_active(root, DETAIL_TABS, "data-tab", tab.as_str());

            root.set_hidden(DETAIL_ERROR, state.error.is_none());
            root.set_text(
                DETAIL_ERROR,
                state
                    .error
                    .as_deref()
                    .map(|e| format!("Failed to load details: {e}"))
                    .unwrap_or_default(),
            );

            let Some(detail) = &state.detail else {
                root.set_text(DETAIL_ID, "");
                root.replace_children(DETAIL_BODY, Vec::new());
                return;
            };
            root.set_text(DETAIL_ID, detail.cache_id.as_str());
            root.set_hidden(DETAIL_KEY_PATH, detail.key_path.is_none());
            root.set_text(DETAIL_KEY_PATH, detail.key_path.clone().unwrap_or_default());
            root.replace_children(DETAIL_BODY, detail_body(detail, tab));

            if let Some(row) = root.element_mut(&format!("file:{}", detail.cache_id)) {
                let strategy = detail.strategy.as_deref().unwrap_or("unknown");
                let meta = match &detail.cache_hash {
                    Some(hash) => {
                        let short: String = hash.chars().take(8).collect();
                        format!("{strategy} • {short}")
                    }
                    None => strategy.to_string(),
                };
                row.attrs.insert("data-meta".to_string(), meta);
            }
        });
    }
}

fn detail_body(detail: &FileDetail, tab: DetailTab) -> Vec<Element> {
    let json_or = |value: &Value, empty: &str| {
        let is_empty = value.as_object().map_or(true, |m| m.is_empty());
        if is_empty {
            Element::new("div").with_class("detail-empty-tab").with_text(empty)
        } else {
            Element::new("pre")
                .with_class("json-content")
                .with_text(serde_json::to_string_pretty(value).unwrap_or_default())
        }
    };
    let section = |title: &str, paths: &[String]| {
        Element::new("div")
            .with_class("refs-section")
            .with_child(Element::new("h4").with_text(format!("{title} ({})", paths.len())))
            .with_children(
                paths
                    .iter()
                    .map(|p| Element::new("div").with_class("ref-path").with_text(p.as_str())),
            )
    };

    match tab {
        DetailTab::Content => vec![Element::new("div")
            .with_id("detail-content-path")
            .with_text(format!(
                "Content Path: {}",
                detail.content_path.as_deref().unwrap_or("N/A")
            ))],
        DetailTab::Metadata => vec![json_or(&detail.metadata, "No metadata available")],
        DetailTab::Config => vec![json_or(&detail.config, "No config available")],
        DetailTab::Refs => {
            let mut sections = Vec::new();
            if !detail.data_paths.is_empty() {
                sections.push(section("Data Files", &detail.data_paths));
            }
            if !detail.by_id_paths.is_empty() {
                sections.push(section("By-ID References", &detail.by_id_paths));
            }
            if !detail.by_hash_paths.is_empty() {
                sections.push(section("By-Hash References", &detail.by_hash_paths));
            }
            if detail.shared_with.len() > 1 {
                sections.push(
                    Element::new("div")
                        .with_id("shared-hash-files")
                        .with_children(detail.shared_with.iter().map(|id| {
                            Element::new("div")
                                .with_class("shared-file")
                                .with_attr("data-cache-id", id.as_str())
                                .with_text(id.as_str())
                        })),
                );
            }
            sections
        }
    }
}

#[async_trait]
impl Component for FilesView {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn required_elements(&self) -> &'static [&'static str] {
        &[FILES_FILTER, FILES_ITEMS, DETAIL_EMPTY, DETAIL_CONTENT]
    }

    fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
        scope.on_weak(event::names::NAMESPACE_CHANGED, &self, |this, event| {
            let Some(changed) = event.detail_as::<NamespaceChanged>() else {
                return;
            };
            this.reset(Some(changed.namespace));
            if this.is_active() {
                let view = Arc::clone(this);
                this.tasks.spawn(async move { view.load_files().await });
            }
        });
        scope.on_weak(event::names::VIEW_CHANGED, &self, |this, event| {
            let Some(changed) = event.detail_as::<ViewChanged>() else {
                return;
            };
            let active = changed.view == FILES_VIEW;
            let was_active = this.active.swap(active, Ordering::SeqCst);
            if active && !was_active && this.namespace().is_some() && this.list.read().is_empty() {
                let view = Arc::clone(this);
                this.tasks.spawn(async move { view.load_files().await });
            }
        });
        scope.on_weak(event::names::NAVIGATE_TO_FILE, &self, |this, event| {
            let Some(target) = event.detail_as::<NavigateToFile>() else {
                return;
            };
            let view = Arc::clone(this);
            this.tasks
                .spawn(async move { view.load_file_detail(&target.cache_id).await });
        });
        scope.on_weak(shortcuts::ITEM_NEXT, &self, |this, _| {
            if this.is_active() {
                this.focus_next();
            }
        });
        scope.on_weak(shortcuts::ITEM_PREV, &self, |this, _| {
            if this.is_active() {
                this.focus_prev();
            }
        });
        scope.on_weak(shortcuts::ITEM_OPEN, &self, |this, _| {
            if !this.is_active() {
                return;
            }
            let view = Arc::clone(this);
            this.tasks.spawn(async move { view.open_focused().await });
        });
        scope.on_weak(shortcuts::RELOAD, &self, |this, _| {
            if !this.is_active() {
                return;
            }
            let view = Arc::clone(this);
            this.tasks.spawn(async move { view.load_files().await });
        });
    }

    fn clear(&self) {
        self.filter_requests.invalidate();
        let namespace = self.namespace();
        self.reset(namespace);
    }

    async fn refresh(&self) {
        self.load_files().await;
    }
}
