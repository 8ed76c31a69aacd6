//! Switcher between the files, hashes and raw views.

use super::{mark_active, names, Deps};
use crate::tasks::Background;
use async_trait::async_trait;
use cache_browser_api::{ApiResponse, DynCacheApi, Result as ApiResult};
use cache_browser_core::event::{self, shortcuts, FileSelected, NamespaceChanged, ViewChanged};
use cache_browser_core::format::format_count;
use cache_browser_core::{
    Component, ComponentCore, Element, ListenerScope, RenderRoot, RequestGeneration,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

const VIEW_TAB_BUTTONS: &str = "view-tab-buttons";
const FILES_COUNT: &str = "files-count";
const HASHES_COUNT: &str = "hashes-count";
const CURRENT_NAMESPACE: &str = "current-namespace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    Files,
    Hashes,
    #[default]
    Raw,
}

impl View {
    pub const ALL: [View; 3] = [View::Files, View::Hashes, View::Raw];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Files => "files",
            View::Hashes => "hashes",
            View::Raw => "raw",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == name)
    }

    fn label(&self) -> &'static str {
        match self {
            View::Files => "Files",
            View::Hashes => "Hashes",
            View::Raw => "Raw",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry count of one listing as shown on its tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Count {
    #[default]
    Unknown,
    Known(usize),
    Failed,
}

impl Count {
    fn from_result(result: &ApiResult<ApiResponse>) -> Self {
        match result {
            Ok(response) => match response.as_json() {
                Some(serde_json::Value::Array(items)) => Count::Known(items.len()),
                _ => Count::Known(0),
            },
            Err(_) => Count::Failed,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Count::Unknown => format_count(None),
            Count::Known(n) => format_count(Some(*n)),
            Count::Failed => "?".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct TabsState {
    view: View,
    namespace: Option<String>,
    files: Count,
    hashes: Count,
}

pub struct ViewTabs {
    core: ComponentCore,
    api: DynCacheApi,
    tasks: Background,
    state: RwLock<TabsState>,
    requests: RequestGeneration,
}

impl ViewTabs {
    pub fn new(deps: &Deps) -> Arc<Self> {
        Arc::new(Self {
            core: deps.core(names::VIEW_TABS, Self::render_root()),
            api: deps.api.clone(),
            tasks: deps.tasks.clone(),
            state: RwLock::new(TabsState::default()),
            requests: RequestGeneration::new(),
        })
    }

    fn render_root() -> RenderRoot {
        let buttons = View::ALL.into_iter().map(|view| {
            let mut button = Element::new("button")
                .with_id(format!("view-tab-{view}"))
                .with_class("view-tab-btn")
                .with_attr("data-view", view.as_str())
                .with_text(view.label());
            match view {
                View::Files => button = button.with_child(Element::new("span").with_id(FILES_COUNT).with_text("-")),
                View::Hashes => button = button.with_child(Element::new("span").with_id(HASHES_COUNT).with_text("-")),
                View::Raw => {}
            }
            button.toggle_class("active", view == View::default());
            button
        });
        RenderRoot::new(
            names::VIEW_TABS,
            Element::new("div").with_id("view-tabs").with_children([
                Element::new("div").with_id(VIEW_TAB_BUTTONS).with_children(buttons),
                Element::new("span").with_id(CURRENT_NAMESPACE),
            ]),
        )
    }

    pub fn active_view(&self) -> View {
        self.state.read().view
    }

    pub fn namespace(&self) -> Option<String> {
        self.state.read().namespace.clone()
    }

    /// `(files, hashes)` counts of the current namespace.
    pub fn counts(&self) -> (Count, Count) {
        let state = self.state.read();
        (state.files, state.hashes)
    }

    /// Show `view`. Switching to the active view does nothing.
    pub fn switch_view(&self, view: View) -> bool {
        let namespace = {
            let mut state = self.state.write();
            if state.view == view {
                return false;
            }
            state.view = view;
            state.namespace.clone()
        };
        self.core
            .with_root_mut(|root| mark_active(root, VIEW_TAB_BUTTONS, "data-view", view.as_str()));
        tracing::info!(view = %view, "View changed");
        self.core.emit_typed(
            event::names::VIEW_CHANGED,
            &ViewChanged {
                view: view.as_str().to_string(),
                namespace,
            },
        );
        true
    }

    pub fn switch_to(&self, name: &str) -> bool {
        View::parse(name).is_some_and(|view| self.switch_view(view))
    }

    pub fn set_namespace(&self, namespace: &str) {
        {
            let mut state = self.state.write();
            state.namespace = Some(namespace.to_string());
            state.files = Count::Unknown;
            state.hashes = Count::Unknown;
        }
        self.core.with_root_mut(|root| {
            root.set_text(CURRENT_NAMESPACE, namespace);
        });
        self.render_counts();
    }

    /// Fetch the entry counts shown on the files and hashes tabs.
    pub async fn load_counts(&self) {
        let Some(namespace) = self.namespace() else {
            return;
        };
        let ticket = self.requests.begin();
        let (files, hashes) = tokio::join!(
            self.api.file_ids(&namespace),
            self.api.file_hashes(&namespace)
        );
        if !self.requests.is_current(ticket) {
            return;
        }
        if let Err(e) = files.as_ref().and(hashes.as_ref()) {
            tracing::warn!(namespace = %namespace, error = %e, "Failed to load view counts");
        }
        {
            let mut state = self.state.write();
            state.files = Count::from_result(&files);
            state.hashes = Count::from_result(&hashes);
        }
        self.render_counts();
    }

    fn render_counts(&self) {
        let (files, hashes) = self.counts();
        self.core.with_root_mut(|root| {
            root.set_text(FILES_COUNT, files.label());
            root.set_text(HASHES_COUNT, hashes.label());
        });
    }
}

#[async_trait]
impl Component for ViewTabs {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn required_elements(&self) -> &'static [&'static str] {
        &[VIEW_TAB_BUTTONS, FILES_COUNT, HASHES_COUNT, CURRENT_NAMESPACE]
    }

    fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
        scope.on_weak(event::names::NAMESPACE_CHANGED, &self, |this, event| {
            let Some(changed) = event.detail_as::<NamespaceChanged>() else {
                return;
            };
            this.set_namespace(&changed.namespace);
            let tabs = Arc::clone(this);
            this.tasks.spawn(async move { tabs.load_counts().await });
        });
        scope.on_weak(shortcuts::VIEW_FILES, &self, |this, _| {
            this.switch_view(View::Files);
        });
        scope.on_weak(shortcuts::VIEW_HASHES, &self, |this, _| {
            this.switch_view(View::Hashes);
        });
        scope.on_weak(shortcuts::VIEW_RAW, &self, |this, _| {
            this.switch_view(View::Raw);
        });
        scope.on_weak(event::names::NAVIGATE_TO_FILE, &self, |this, _| {
            this.switch_view(View::Files);
        });
        // A file picked from a list view opens in the raw browser.
        scope.on_weak(event::names::FILE_SELECTED, &self, |this, event| {
            let Some(selected) = event.detail_as::<FileSelected>() else {
                return;
            };
            if !selected.is_folder() && this.active_view() != View::Raw {
                this.switch_view(View::Raw);
            }
        });
    }

    fn clear(&self) {
        self.requests.invalidate();
        {
            let mut state = self.state.write();
            state.files = Count::Unknown;
            state.hashes = Count::Unknown;
        }
        self.render_counts();
    }

    async fn refresh(&self) {
        self.load_counts().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_error, FakeApi};
    use cache_browser_api::endpoints;
    use cache_browser_core::{mount, EventBus};
    use serde_json::json;

    async fn mounted(api: Arc<FakeApi>) -> (Arc<ViewTabs>, EventBus, Deps) {
        let bus = EventBus::new();
        let deps = Deps::new(bus.clone(), api);
        let tabs = ViewTabs::new(&deps);
        mount(&tabs).unwrap();
        (tabs, bus, deps)
    }

    #[test]
    fn test_count_labels() {
        assert_eq!(Count::Unknown.label(), "-");
        assert_eq!(Count::Failed.label(), "?");
        assert_eq!(Count::Known(12).label(), "12");
        assert_eq!(Count::Known(1234).label(), "1.2k");
    }

    #[tokio::test]
    async fn test_switch_emits_once_per_change() {
        let (tabs, bus, _deps) = mounted(FakeApi::new()).await;
        let mut changed = bus.filter().named(event::names::VIEW_CHANGED);
        assert_eq!(tabs.active_view(), View::Raw);

        assert!(!tabs.switch_view(View::Raw));
        bus.emit(shortcuts::VIEW_HASHES, json!({}));
        bus.emit(shortcuts::VIEW_HASHES, json!({}));
        assert_eq!(tabs.active_view(), View::Hashes);

        let (event, meta) = changed.try_recv().unwrap();
        assert_eq!(event.detail["view"], "hashes");
        assert_eq!(meta.source, names::VIEW_TABS);
        assert!(changed.try_recv().is_none());

        let snapshot = tabs.core().snapshot();
        assert!(snapshot.element("view-tab-hashes").unwrap().has_class("active"));
        assert!(!snapshot.element("view-tab-raw").unwrap().has_class("active"));
        assert!(!tabs.switch_to("bogus"));
    }

    #[tokio::test]
    async fn test_namespace_change_loads_counts() {
        let api = FakeApi::new();
        api.respond(&endpoints::file_ids("default"), json!(["a", "b", "c"]))
            .fail(&endpoints::file_hashes("default"), http_error(500));
        let (tabs, bus, deps) = mounted(api).await;

        bus.emit(event::names::NAMESPACE_CHANGED, json!({"namespace": "default", "index": 0}));
        assert_eq!(tabs.core().snapshot().text(FILES_COUNT), Some("-"));
        deps.tasks.settle().await;

        assert_eq!(tabs.counts(), (Count::Known(3), Count::Failed));
        let snapshot = tabs.core().snapshot();
        assert_eq!(snapshot.text(CURRENT_NAMESPACE), Some("default"));
        assert_eq!(snapshot.text(FILES_COUNT), Some("3"));
        assert_eq!(snapshot.text(HASHES_COUNT), Some("?"));

        let mut changed = bus.filter().named(event::names::VIEW_CHANGED);
        tabs.switch_view(View::Files);
        assert_eq!(changed.try_recv().unwrap().0.detail["namespace"], "default");
    }

    #[tokio::test]
    async fn test_cross_view_navigation() {
        let (tabs, bus, _deps) = mounted(FakeApi::new()).await;
        bus.emit(event::names::NAVIGATE_TO_FILE, json!({"cacheId": "id-1"}));
        assert_eq!(tabs.active_view(), View::Files);

        bus.emit(event::names::FILE_SELECTED, json!({"path": "default/data", "type": "folder"}));
        assert_eq!(tabs.active_view(), View::Files);

        bus.emit(
            event::names::FILE_SELECTED,
            json!({"path": "default/data/a.json", "type": "json", "namespace": "default"}),
        );
        assert_eq!(tabs.active_view(), View::Raw);
    }
}
