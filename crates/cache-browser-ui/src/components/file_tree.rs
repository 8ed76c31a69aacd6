//! Raw storage browser: the namespace's files as a folder tree.

use super::{names, state_elements, Deps};
use crate::tasks::Background;
use async_trait::async_trait;
use cache_browser_api::DynCacheApi;
use cache_browser_core::event::{self, shortcuts, FileSelected, NamespaceChanged, ViewChanged};
use cache_browser_core::tree::{FileTreeModel, TreeStats, VisibleRow};
use cache_browser_core::{
    Component, ComponentCore, Element, ListenerScope, LoadState, RenderRoot, RequestGeneration,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TREE_FILTER: &str = "tree-filter";
const TREE_ROWS: &str = "tree-rows";
const STATS_REFS: &str = "stats-refs";
const STATS_DATA: &str = "stats-data";
const FILE_COUNT: &str = "file-count";

/// View the tree belongs to.
const RAW_VIEW: &str = "raw";

pub struct FileTree {
    core: ComponentCore,
    api: DynCacheApi,
    tasks: Background,
    debounce: Duration,
    model: RwLock<FileTreeModel>,
    namespace: RwLock<Option<String>>,
    load_state: RwLock<LoadState>,
    requests: RequestGeneration,
    filter_requests: RequestGeneration,
    // Keyboard navigation only applies while the raw view is showing.
    active: AtomicBool,
}

impl FileTree {
    pub fn new(deps: &Deps) -> Arc<Self> {
        Arc::new(Self {
            core: deps.core(names::FILE_TREE, Self::render_root()),
            api: deps.api.clone(),
            tasks: deps.tasks.clone(),
            debounce: deps.filter_debounce,
            model: RwLock::new(FileTreeModel::new()),
            namespace: RwLock::new(None),
            load_state: RwLock::new(LoadState::Idle),
            requests: RequestGeneration::new(),
            filter_requests: RequestGeneration::new(),
            active: AtomicBool::new(true),
        })
    }

    fn render_root() -> RenderRoot {
        let mut children = vec![
            Element::new("input")
                .with_id(TREE_FILTER)
                .with_attr("placeholder", "Filter files..."),
            Element::new("div").with_id("tree-stats").with_children([
                Element::new("span").with_id(STATS_REFS).with_text("refs: 0"),
                Element::new("span").with_id(STATS_DATA).with_text("data: 0"),
                Element::new("span").with_id(FILE_COUNT).with_text("0 files"),
            ]),
            Element::new("div").with_id("tree-actions").with_children([
                Element::new("button").with_id("refresh-btn").with_text("Refresh"),
                Element::new("button").with_id("collapse-all-btn").with_text("Collapse"),
                Element::new("button").with_id("expand-all-btn").with_text("Expand"),
            ]),
        ];
        children.extend(state_elements(
            "retry-btn",
            vec![Element::new("div").with_id(TREE_ROWS).with_class("tree")],
        ));
        RenderRoot::new(
            names::FILE_TREE,
            Element::new("div").with_id("file-tree").with_children(children),
        )
        .with_slot("tree-actions", "tree-actions")
    }

    pub fn namespace(&self) -> Option<String> {
        self.namespace.read().clone()
    }

    pub fn set_namespace(&self, namespace: impl Into<String>) {
        *self.namespace.write() = Some(namespace.into());
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        self.model.read().visible_rows()
    }

    pub fn visible_paths(&self) -> Vec<String> {
        self.model.read().visible_paths()
    }

    pub fn selected(&self) -> Option<String> {
        self.model.read().selected().map(str::to_string)
    }

    pub fn stats(&self) -> TreeStats {
        self.model.read().stats()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.model.read().is_expanded(path)
    }

    fn set_state(&self, state: LoadState) {
        self.core.show_state(&state);
        *self.load_state.write() = state;
    }

    /// List every file of the current namespace and rebuild the tree.
    pub async fn load_files(&self) {
        let Some(namespace) = self.namespace() else {
            return;
        };
        let ticket = self.requests.begin();
        self.set_state(LoadState::Loading);

        let result = self.api.all_files(&namespace).await;
        if !self.requests.is_current(ticket) {
            tracing::debug!(namespace = %namespace, "Dropping stale file list");
            return;
        }

        match result {
            Ok(response) => {
                let files = response.strings_or_field("files");
                tracing::debug!(namespace = %namespace, count = files.len(), "Loaded file list");
                let empty = files.is_empty();
                {
                    let mut model = self.model.write();
                    model.set_files(files);
                    model.expand_first_level();
                }
                self.render();
                self.set_state(if empty {
                    LoadState::Empty
                } else {
                    LoadState::Content
                });
            }
            Err(e) => {
                tracing::warn!(namespace = %namespace, error = %e, "Failed to load files");
                self.set_state(LoadState::error(e.to_string()));
            }
        }
    }

    pub async fn load_namespace(&self, namespace: String) {
        self.set_namespace(namespace);
        self.load_files().await;
    }

    /// Apply filter text typed into the filter box after the debounce
    /// interval. Only the most recent input is applied.
    pub fn input_filter(self: &Arc<Self>, text: &str) {
        let ticket = self.filter_requests.begin();
        let this = Arc::clone(self);
        let text = text.to_string();
        self.core
            .with_root_mut(|root| root.set_attr(TREE_FILTER, "value", text.as_str()));
        self.tasks.spawn(async move {
            tokio::time::sleep(this.debounce).await;
            if this.filter_requests.is_current(ticket) {
                this.apply_filter(&text);
            }
        });
    }

    /// Filter immediately.
    pub fn apply_filter(&self, text: &str) {
        self.model.write().set_filter(text);
        self.render();
    }

    pub fn toggle_folder(&self, path: &str) -> Option<bool> {
        let expanded = self.model.write().toggle_folder(path);
        self.render();
        expanded
    }

    pub fn expand_all(&self) {
        self.model.write().expand_all();
        self.render();
    }

    pub fn collapse_all(&self) {
        self.model.write().collapse_all();
        self.render();
    }

    /// Select a row and announce it.
    pub fn select_file(&self, path: &str) -> bool {
        let kind = self.model.write().select(path);
        match kind {
            Some(kind) => {
                self.render();
                self.announce(path, kind.as_str());
                true
            }
            None => false,
        }
    }

    pub fn select_next_item(&self) -> Option<VisibleRow> {
        let row = self.model.write().select_next()?;
        self.render();
        self.announce(&row.path, row.kind.as_str());
        Some(row)
    }

    pub fn select_prev_item(&self) -> Option<VisibleRow> {
        let row = self.model.write().select_prev()?;
        self.render();
        self.announce(&row.path, row.kind.as_str());
        Some(row)
    }

    /// Expand the selected folder, or move into it when already open.
    pub fn expand_or_descend(&self) -> Option<VisibleRow> {
        let moved = self.model.write().expand_or_descend();
        self.render();
        if let Some(row) = &moved {
            self.announce(&row.path, row.kind.as_str());
        }
        moved
    }

    /// Collapse the selected folder, or move up to its parent.
    pub fn collapse_or_ascend(&self) -> Option<VisibleRow> {
        let moved = self.model.write().collapse_or_ascend();
        self.render();
        if let Some(row) = &moved {
            self.announce(&row.path, row.kind.as_str());
        }
        moved
    }

    /// Open the selected row: folders toggle, files are announced again.
    pub fn activate_selected(&self) {
        let Some(path) = self.selected() else {
            return;
        };
        if self.model.read().is_folder(&path) {
            self.toggle_folder(&path);
        } else {
            self.select_file(&path);
        }
    }

    fn announce(&self, path: &str, kind: &str) {
        self.core.emit_typed(
            event::names::FILE_SELECTED,
            &FileSelected::new(path, kind, self.namespace()),
        );
    }

    fn render(&self) {
        let (rows, stats) = {
            let model = self.model.read();
            (model.visible_rows(), model.stats())
        };
        let file_count = rows.iter().filter(|r| !r.is_folder()).count();
        let elements: Vec<Element> = rows.iter().map(row_element).collect();

        self.core.with_root_mut(|root| {
            root.replace_children(TREE_ROWS, elements);
            root.set_text(STATS_REFS, format!("refs: {}", stats.refs));
            root.set_text(STATS_DATA, format!("data: {}", stats.data));
            root.set_text(FILE_COUNT, format!("{file_count} files"));
        });
    }
}

fn row_element(row: &VisibleRow) -> Element {
    let mut el = Element::new("div")
        .with_id(format!("tree-row:{}", row.path))
        .with_class("tree-item")
        .with_class(if row.is_folder() { "folder" } else { "file" })
        .with_attr("data-path", row.path.as_str())
        .with_attr("data-type", row.kind.as_str())
        .with_attr("data-depth", row.depth.to_string())
        .with_text(row.name.as_str());
    el.toggle_class("expanded", row.expanded);
    el.toggle_class("selected", row.selected);
    el.toggle_class("dim", row.kind.is_auxiliary());
    el
}

#[async_trait]
impl Component for FileTree {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn required_elements(&self) -> &'static [&'static str] {
        &[TREE_FILTER, TREE_ROWS, FILE_COUNT]
    }

    fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
        scope.on_weak(event::names::NAMESPACE_CHANGED, &self, |this, event| {
            let Some(changed) = event.detail_as::<NamespaceChanged>() else {
                return;
            };
            let tree = Arc::clone(this);
            this.tasks
                .spawn(async move { tree.load_namespace(changed.namespace).await });
        });
        scope.on_weak(event::names::VIEW_CHANGED, &self, |this, event| {
            if let Some(changed) = event.detail_as::<ViewChanged>() {
                this.active.store(changed.view == RAW_VIEW, Ordering::SeqCst);
            }
        });
        scope.on_weak(shortcuts::RELOAD, &self, |this, _| {
            if !this.is_active() {
                return;
            }
            let tree = Arc::clone(this);
            this.tasks.spawn(async move { tree.load_files().await });
        });
        scope.on_weak(shortcuts::ITEM_NEXT, &self, |this, _| {
            if this.is_active() {
                this.select_next_item();
            }
        });
        scope.on_weak(shortcuts::ITEM_PREV, &self, |this, _| {
            if this.is_active() {
                this.select_prev_item();
            }
        });
    }

    fn clear(&self) {
        self.requests.invalidate();
        self.filter_requests.invalidate();
        *self.model.write() = FileTreeModel::new();
        self.render();
        self.set_state(LoadState::Idle);
    }

    async fn refresh(&self) {
        self.load_files().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_error, FakeApi};
    use cache_browser_api::endpoints;
    use cache_browser_core::component::state_ids;
    use cache_browser_core::{mount, EventBus};
    use serde_json::json;

    const FILES: &[&str] = &[
        "default/data/direct/ab/doc.json",
        "default/data/direct/ab/doc.json.metadata",
        "default/refs/by-id/ab/doc.json",
        "default/refs/by-hash/cd/1234.json",
    ];

    fn service() -> Arc<FakeApi> {
        let api = FakeApi::new();
        api.respond(&endpoints::all_files("default"), json!(FILES));
        api
    }

    async fn loaded(api: Arc<FakeApi>) -> (Arc<FileTree>, EventBus, Deps) {
        let bus = EventBus::new();
        let deps = Deps::new(bus.clone(), api);
        let tree = FileTree::new(&deps);
        mount(&tree).unwrap();
        bus.emit(
            event::names::NAMESPACE_CHANGED,
            json!({"namespace": "default", "index": 0}),
        );
        deps.tasks.settle().await;
        (tree, bus, deps)
    }

    #[tokio::test]
    async fn test_namespace_change_loads_tree() {
        let (tree, _bus, _deps) = loaded(service()).await;

        assert_eq!(tree.load_state(), LoadState::Content);
        assert!(tree.is_expanded("default"));
        assert_eq!(tree.visible_paths(), vec!["default", "default/data", "default/refs"]);
        assert_eq!(tree.stats().refs, 2);
        assert_eq!(tree.stats().data, 2);

        let snapshot = tree.core().snapshot();
        assert_eq!(snapshot.text(STATS_REFS), Some("refs: 2"));
        assert_eq!(snapshot.is_hidden(state_ids::CONTENT), Some(false));
        assert_eq!(snapshot.is_hidden(state_ids::LOADING), Some(true));
    }

    #[tokio::test]
    async fn test_wrapped_listing_and_empty_state() {
        let api = FakeApi::new();
        api.respond(&endpoints::all_files("default"), json!({"files": ["default/a.json"]}));
        let (tree, _bus, _deps) = loaded(api.clone()).await;
        assert_eq!(tree.stats().total, 1);

        api.respond(&endpoints::all_files("default"), json!([]));
        tree.refresh().await;
        assert_eq!(tree.load_state(), LoadState::Empty);
        assert!(tree.visible_rows().is_empty());
    }

    #[tokio::test]
    async fn test_load_error_shows_message() {
        let api = FakeApi::new();
        api.fail(&endpoints::all_files("default"), http_error(500));
        let (tree, _bus, _deps) = loaded(api).await;

        assert!(tree.load_state().is_error());
        let snapshot = tree.core().snapshot();
        assert_eq!(snapshot.text(state_ids::ERROR_MESSAGE), Some("HTTP 500: Error"));
        assert_eq!(snapshot.is_hidden(state_ids::CONTENT), Some(true));
    }

    #[tokio::test]
    async fn test_selection_emits_file_selected() {
        let (tree, bus, _deps) = loaded(service()).await;
        let mut selected = bus.filter().named(event::names::FILE_SELECTED);
        tree.expand_all();

        assert!(tree.select_file("default/data/direct/ab/doc.json"));
        let (event, _) = selected.try_recv().unwrap();
        assert_eq!(
            event.detail,
            json!({"path": "default/data/direct/ab/doc.json", "type": "json", "namespace": "default"})
        );
        assert!(!tree.select_file("default/missing.json"));

        let row = tree.select_next_item().unwrap();
        assert_eq!(row.path, "default/data/direct/ab/doc.json.metadata");
        let snapshot = tree.core().snapshot();
        let el = snapshot.element(&format!("tree-row:{}", row.path)).unwrap();
        assert!(el.has_class("selected"));
        assert!(el.has_class("dim"));
    }

    #[tokio::test]
    async fn test_keyboard_navigation_skips_collapsed_rows() {
        let (tree, bus, _deps) = loaded(service()).await;

        bus.emit(shortcuts::ITEM_NEXT, json!({}));
        assert_eq!(tree.selected().as_deref(), Some("default"));
        bus.emit(shortcuts::ITEM_NEXT, json!({}));
        assert_eq!(tree.selected().as_deref(), Some("default/data"));
        bus.emit(shortcuts::ITEM_NEXT, json!({}));
        assert_eq!(tree.selected().as_deref(), Some("default/refs"));
        // Clamped at the last visible row.
        bus.emit(shortcuts::ITEM_NEXT, json!({}));
        assert_eq!(tree.selected().as_deref(), Some("default/refs"));

        tree.expand_or_descend();
        assert!(tree.is_expanded("default/refs"));
        let child = tree.expand_or_descend().unwrap();
        assert_eq!(child.path, "default/refs/by-hash");

        let parent = tree.collapse_or_ascend().unwrap();
        assert_eq!(parent.path, "default/refs");
        tree.collapse_or_ascend();
        assert!(!tree.is_expanded("default/refs"));
    }

    #[tokio::test]
    async fn test_navigation_ignored_outside_raw_view() {
        let (tree, bus, _deps) = loaded(service()).await;
        bus.emit(event::names::VIEW_CHANGED, json!({"view": "files", "namespace": "default"}));
        bus.emit(shortcuts::ITEM_NEXT, json!({}));
        assert!(tree.selected().is_none());

        bus.emit(event::names::VIEW_CHANGED, json!({"view": "raw"}));
        bus.emit(shortcuts::ITEM_NEXT, json!({}));
        assert_eq!(tree.selected().as_deref(), Some("default"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_is_debounced() {
        let (tree, _bus, deps) = loaded(service()).await;

        tree.input_filter("by");
        tree.input_filter("by-hash");
        assert_eq!(tree.visible_paths().len(), 3);

        deps.tasks.settle().await;
        assert_eq!(
            tree.visible_paths(),
            vec![
                "default",
                "default/refs",
                "default/refs/by-hash",
                "default/refs/by-hash/cd",
                "default/refs/by-hash/cd/1234.json",
            ]
        );
        assert_eq!(tree.core().snapshot().text(FILE_COUNT), Some("1 files"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_listing_is_dropped() {
        let api = service();
        api.respond(&endpoints::all_files("slow"), json!(["slow/old.json"]))
            .delay(&endpoints::all_files("slow"), Duration::from_millis(500));
        let bus = EventBus::new();
        let deps = Deps::new(bus.clone(), api);
        let tree = FileTree::new(&deps);
        mount(&tree).unwrap();

        bus.emit(event::names::NAMESPACE_CHANGED, json!({"namespace": "slow", "index": 1}));
        bus.emit(event::names::NAMESPACE_CHANGED, json!({"namespace": "default", "index": 0}));
        deps.tasks.settle().await;

        assert_eq!(tree.namespace().as_deref(), Some("default"));
        assert_eq!(tree.stats().total, FILES.len());
    }
}
