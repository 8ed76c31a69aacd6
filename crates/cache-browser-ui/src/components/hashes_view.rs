//! Cache entries of a namespace listed by content hash.
//!
//! Hash references are immutable for the life of a namespace listing, so
//! fetched details are kept per hash until the namespace changes.

use super::{list_rows, list_stats, names, state_elements, Deps};
use crate::tasks::Background;
use async_trait::async_trait;
use cache_browser_api::DynCacheApi;
use cache_browser_core::event::{
    self, shortcuts, HashDetailLoaded, NamespaceChanged, NavigateToFile, ViewChanged,
};
use cache_browser_core::nav::FilteredList;
use cache_browser_core::{
    Component, ComponentCore, Element, ListenerScope, LoadState, RenderRoot, RequestGeneration,
};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const HASHES_VIEW: &str = "hashes";

const HASHES_FILTER: &str = "hashes-filter";
const HASHES_STATS: &str = "hashes-stats";
const HASHES_ITEMS: &str = "hashes-items";
const HASH_DETAIL_EMPTY: &str = "hash-detail-empty";
const HASH_DETAIL_CONTENT: &str = "hash-detail-content";
const HASH_VALUE: &str = "hash-detail-hash";
const DUPLICATES_WARNING: &str = "duplicates-warning";
const HASH_FILES: &str = "hash-file-list";
const HASH_INFO: &str = "hash-info";
const HASH_DETAIL_ERROR: &str = "hash-detail-error";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HashEntry {
    pub cache_id: String,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// A `refs-hash` answer.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HashDetail {
    #[serde(default)]
    pub cache_ids: Vec<HashEntry>,
    #[serde(default)]
    pub latest_id: Option<String>,
    #[serde(default)]
    pub total_versions: Option<u64>,
}

impl HashDetail {
    pub fn from_refs(refs: &Value) -> Self {
        serde_json::from_value(refs.clone()).unwrap_or_default()
    }

    pub fn total_versions(&self) -> u64 {
        self.total_versions
            .filter(|n| *n > 0)
            .unwrap_or(self.cache_ids.len() as u64)
    }

    /// More than one entry stores the same bytes.
    pub fn has_duplicates(&self) -> bool {
        self.cache_ids.len() > 1
    }
}

#[derive(Debug, Default)]
struct DetailState {
    opened: Option<String>,
    error: Option<String>,
}

pub struct HashesView {
    core: ComponentCore,
    api: DynCacheApi,
    tasks: Background,
    debounce: Duration,
    namespace: RwLock<Option<String>>,
    list: RwLock<FilteredList>,
    load_state: RwLock<LoadState>,
    details: RwLock<HashMap<String, HashDetail>>,
    detail: RwLock<DetailState>,
    requests: RequestGeneration,
    detail_requests: RequestGeneration,
    filter_requests: RequestGeneration,
    active: AtomicBool,
}

impl HashesView {
    pub fn new(deps: &Deps) -> Arc<Self> {
        Arc::new(Self {
            core: deps.core(names::HASHES_VIEW, Self::render_root()),
            api: deps.api.clone(),
            tasks: deps.tasks.clone(),
            debounce: deps.filter_debounce,
            namespace: RwLock::new(None),
            list: RwLock::new(FilteredList::default()),
            load_state: RwLock::new(LoadState::Idle),
            details: RwLock::new(HashMap::new()),
            detail: RwLock::new(DetailState::default()),
            requests: RequestGeneration::new(),
            detail_requests: RequestGeneration::new(),
            filter_requests: RequestGeneration::new(),
            active: AtomicBool::new(false),
        })
    }

    fn render_root() -> RenderRoot {
        let mut list = vec![
            Element::new("input")
                .with_id(HASHES_FILTER)
                .with_attr("placeholder", "Filter by hash..."),
            Element::new("span").with_id(HASHES_STATS).with_text("0 hashes"),
        ];
        list.extend(state_elements(
            "hashes-retry-btn",
            vec![Element::new("div").with_id(HASHES_ITEMS).with_class("hashes-items")],
        ));

        RenderRoot::new(
            names::HASHES_VIEW,
            Element::new("div").with_id("hashes-view").with_children([
                Element::new("div").with_id("hashes-list").with_children(list),
                Element::new("div").with_id("hashes-detail").with_children([
                    Element::new("div")
                        .with_id(HASH_DETAIL_EMPTY)
                        .with_text("Select a hash to see the files sharing it"),
                    Element::new("div").with_id(HASH_DETAIL_CONTENT).hidden().with_children([
                        Element::new("div").with_id(HASH_VALUE),
                        Element::new("div").with_id(DUPLICATES_WARNING).hidden(),
                        Element::new("div").with_id(HASH_FILES).with_class("hash-file-list"),
                        Element::new("dl").with_id(HASH_INFO).with_class("info-grid"),
                        Element::new("div").with_id(HASH_DETAIL_ERROR).with_class("error").hidden(),
                    ]),
                ]),
            ]),
        )
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

    pub fn hashes(&self) -> Vec<String> {
        self.list.read().items().to_vec()
    }

    pub fn visible_hashes(&self) -> Vec<String> {
        self.list.read().visible().into_iter().map(str::to_string).collect()
    }

    pub fn focused(&self) -> Option<String> {
        self.list.read().selected().map(str::to_string)
    }

    pub fn opened(&self) -> Option<String> {
        self.detail.read().opened.clone()
    }

    pub fn detail(&self, hash: &str) -> Option<HashDetail> {
        self.details.read().get(hash).cloned()
    }

    pub fn detail_error(&self) -> Option<String> {
        self.detail.read().error.clone()
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
        self.details.write().clear();
        *self.detail.write() = DetailState::default();
        self.render_list();
        self.render_detail();
        self.set_state(LoadState::Idle);
    }

    pub async fn load_hashes(&self) {
        let Some(namespace) = self.namespace() else {
            return;
        };
        let ticket = self.requests.begin();
        self.set_state(LoadState::Loading);

        let result = self.api.file_hashes(&namespace).await;
        if !self.requests.is_current(ticket) {
            tracing::debug!(namespace = %namespace, "Dropping stale hash list");
            return;
        }

        match result {
            Ok(response) => {
                let hashes = response.strings();
                tracing::debug!(namespace = %namespace, count = hashes.len(), "Hashes loaded");
                let empty = hashes.is_empty();
                self.list.write().set_items(hashes);
                self.render_list();
                self.set_state(if empty { LoadState::Empty } else { LoadState::Content });
            }
            Err(e) => {
                tracing::warn!(namespace = %namespace, error = %e, "Failed to load hashes");
                self.set_state(LoadState::error(e.to_string()));
            }
        }
    }

    /// Show the entries sharing `hash`, fetching them on first use.
    pub async fn load_hash_detail(&self, hash: &str) {
        let Some(namespace) = self.namespace() else {
            return;
        };
        if hash.is_empty() {
            return;
        }
        let ticket = self.detail_requests.begin();
        *self.detail.write() = DetailState {
            opened: Some(hash.to_string()),
            error: None,
        };
        self.render_list();

        if self.details.read().contains_key(hash) {
            self.render_detail();
            return;
        }

        let result = self.api.retrieve_hash_refs(&namespace, hash).await;
        if !self.detail_requests.is_current(ticket) {
            return;
        }

        match result {
            Ok(response) => {
                let refs = response.into_value();
                self.details
                    .write()
                    .insert(hash.to_string(), HashDetail::from_refs(&refs));
                self.render_detail();
                self.core.emit_typed(
                    event::names::HASH_DETAIL_LOADED,
                    &HashDetailLoaded {
                        hash: hash.to_string(),
                        refs,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(hash, error = %e, "Failed to load hash detail");
                self.detail.write().error = Some(e.to_string());
                self.render_detail();
            }
        }
    }

    /// Ask the files view to open `cache_id`.
    pub fn navigate_to_file(&self, cache_id: &str) {
        tracing::debug!(cache_id, "Navigating to file");
        self.core.emit_typed(
            event::names::NAVIGATE_TO_FILE,
            &NavigateToFile {
                cache_id: cache_id.to_string(),
            },
        );
    }

    pub fn input_filter(self: &Arc<Self>, text: &str) {
        let ticket = self.filter_requests.begin();
        let this = Arc::clone(self);
        let text = text.to_string();
        self.core
            .with_root_mut(|root| root.set_attr(HASHES_FILTER, "value", text.as_str()));
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

    pub async fn open_focused(&self) {
        if let Some(hash) = self.focused() {
            self.load_hash_detail(&hash).await;
        }
    }

    fn render_list(&self) {
        let opened = self.opened();
        let details = self.details.read();
        let list = self.list.read();
        let mut rows = list_rows(&list, "hash", "hash-item", opened.as_deref());
        for row in rows.iter_mut() {
            let Some(detail) = row.attr("data-id").and_then(|h| details.get(h)) else {
                continue;
            };
            let count = detail.cache_ids.len();
            let duplicates = detail.has_duplicates();
            row.attrs.insert(
                "data-meta".to_string(),
                format!("{count} file{}", if count == 1 { "" } else { "s" }),
            );
            row.toggle_class("has-duplicates", duplicates);
        }
        let stats = list_stats(list.visible().len(), list.len(), "hashes");
        self.core.with_root_mut(|root| {
            root.replace_children(HASHES_ITEMS, rows);
            root.set_text(HASHES_STATS, stats);
        });
    }

    fn render_detail(&self) {
        let state = self.detail.read();
        let detail = state
            .opened
            .as_ref()
            .and_then(|hash| self.details.read().get(hash).cloned());
        let has_detail = detail.is_some() || state.error.is_some();

        self.core.with_root_mut(|root| {
            root.set_hidden(HASH_DETAIL_EMPTY, has_detail);
            root.set_hidden(HASH_DETAIL_CONTENT, !has_detail);
            root.set_hidden(HASH_DETAIL_ERROR, state.error.is_none());
            root.set_text(HASH_DETAIL_ERROR, state.error.clone().unwrap_or_default());
            root.set_text(HASH_VALUE, state.opened.clone().unwrap_or_default());

            let Some(detail) = detail else {
                root.set_hidden(DUPLICATES_WARNING, true);
                root.replace_children(HASH_FILES, Vec::new());
                root.replace_children(HASH_INFO, Vec::new());
                return;
            };

            let count = detail.cache_ids.len();
            root.set_hidden(DUPLICATES_WARNING, !detail.has_duplicates());
            root.set_text(
                DUPLICATES_WARNING,
                format!("{count} files share this content hash (potential duplicates)"),
            );

            let latest = detail.latest_id.as_deref();
            let files = detail
                .cache_ids
                .iter()
                .map(|entry| {
                    let mut item = Element::new("div")
                        .with_class("hash-file-item")
                        .with_attr("data-cache-id", entry.cache_id.as_str())
                        .with_text(entry.cache_id.as_str());
                    if let Some(ts) = &entry.timestamp {
                        item.attrs.insert("data-timestamp".to_string(), value_text(ts));
                    }
                    item.toggle_class("is-latest", latest == Some(entry.cache_id.as_str()));
                    item
                })
                .collect();
            root.replace_children(HASH_FILES, files);

            let status = if detail.has_duplicates() {
                "Duplicates detected"
            } else {
                "Unique"
            };
            let info = [
                ("total-versions", "Total Versions:", detail.total_versions().to_string()),
                ("latest-id", "Latest ID:", latest.unwrap_or("N/A").to_string()),
                ("status", "Status:", status.to_string()),
            ]
            .into_iter()
            .flat_map(|(key, label, value)| {
                [
                    Element::new("dt").with_text(label),
                    Element::new("dd").with_id(format!("hash-{key}")).with_text(value),
                ]
            })
            .collect();
            root.replace_children(HASH_INFO, info);
        });
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Component for HashesView {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn required_elements(&self) -> &'static [&'static str] {
        &[HASHES_FILTER, HASHES_ITEMS, HASH_DETAIL_EMPTY, HASH_DETAIL_CONTENT]
    }

    fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
        scope.on_weak(event::names::NAMESPACE_CHANGED, &self, |this, event| {
            let Some(changed) = event.detail_as::<NamespaceChanged>() else {
                return;
            };
            this.reset(Some(changed.namespace));
            if this.is_active() {
                let view = Arc::clone(this);
                this.tasks.spawn(async move { view.load_hashes().await });
            }
        });
        scope.on_weak(event::names::VIEW_CHANGED, &self, |this, event| {
            let Some(changed) = event.detail_as::<ViewChanged>() else {
                return;
            };
            let active = changed.view == HASHES_VIEW;
            let was_active = this.active.swap(active, Ordering::SeqCst);
            if active && !was_active && this.namespace().is_some() && this.list.read().is_empty() {
                let view = Arc::clone(this);
                this.tasks.spawn(async move { view.load_hashes().await });
            }
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
            this.tasks.spawn(async move { view.load_hashes().await });
        });
    }

    fn clear(&self) {
        self.filter_requests.invalidate();
        let namespace = self.namespace();
        self.reset(namespace);
    }

    async fn refresh(&self) {
        self.load_hashes().await;
    }
}
