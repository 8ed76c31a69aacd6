//! The orchestrator: waits for the base components, coordinates them over
//! the bus and owns the page-level state extension modules adjust.

use crate::components::{names, ContentViewer, FileTree, TopNav};
use cache_browser_core::event::{
    self, AuthErrorDetail, ComponentReady, ContentLoaded, FileSelected, NamespaceChanged,
    NetworkErrorDetail,
};
use cache_browser_core::format::format_bytes;
use cache_browser_core::{Component, EventBus, ListenerScope, ReadinessBoard, Result};
use parking_lot::{Mutex, RwLock};
use semver::Version;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Version of the base console, before any extension module attaches.
pub const BASE_VERSION: Version = Version::new(0, 1, 0);

/// Components the console cannot run without.
pub const BASE_COMPONENTS: [&str; 3] = [names::TOP_NAV, names::FILE_TREE, names::CONTENT_VIEWER];

/// Page layout flags owned by the orchestrator and driven by extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub sidebar_visible: bool,
    pub html_column_visible: bool,
    pub sidebar_width: Option<u32>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            sidebar_visible: true,
            html_column_visible: false,
            sidebar_width: None,
        }
    }
}

pub struct CacheBrowser {
    bus: EventBus,
    readiness: ReadinessBoard,
    version: RwLock<Version>,
    namespace: RwLock<Option<String>>,
    layout: RwLock<Layout>,
    initialized: AtomicBool,
    fatal: RwLock<Option<String>>,
    top_nav: Arc<TopNav>,
    file_tree: Arc<FileTree>,
    content_viewer: Arc<ContentViewer>,
    listeners: Mutex<ListenerScope>,
}

impl CacheBrowser {
    pub fn new(
        bus: &EventBus,
        readiness: &ReadinessBoard,
        top_nav: Arc<TopNav>,
        file_tree: Arc<FileTree>,
        content_viewer: Arc<ContentViewer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            bus: bus.clone(),
            readiness: readiness.clone(),
            version: RwLock::new(BASE_VERSION),
            namespace: RwLock::new(None),
            layout: RwLock::new(Layout::default()),
            initialized: AtomicBool::new(false),
            fatal: RwLock::new(None),
            top_nav,
            file_tree,
            content_viewer,
            listeners: Mutex::new(ListenerScope::new(bus)),
        })
    }

    pub fn version(&self) -> Version {
        self.version.read().clone()
    }

    /// Move the reported version forward. Older or equal versions are ignored.
    pub fn advance_version(&self, version: &Version) -> bool {
        let mut current = self.version.write();
        if *version <= *current {
            return false;
        }
        tracing::info!(from = %current, to = %version, "Console version advanced");
        *current = version.clone();
        true
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn current_namespace(&self) -> Option<String> {
        self.namespace.read().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Message shown in place of the page when initialization failed.
    pub fn fatal_error(&self) -> Option<String> {
        self.fatal.read().clone()
    }

    pub fn layout(&self) -> Layout {
        self.layout.read().clone()
    }

    pub fn set_sidebar_visible(&self, visible: bool) {
        self.layout.write().sidebar_visible = visible;
    }

    pub fn set_html_column_visible(&self, visible: bool) {
        self.layout.write().html_column_visible = visible;
    }

    pub fn set_sidebar_width(&self, width: u32) {
        self.layout.write().sidebar_width = Some(width);
    }

    pub fn content_viewer(&self) -> &Arc<ContentViewer> {
        &self.content_viewer
    }

    pub fn file_tree(&self) -> &Arc<FileTree> {
        &self.file_tree
    }

    pub fn top_nav(&self) -> &Arc<TopNav> {
        &self.top_nav
    }

    /// Wait for the base components, then start coordinating them.
    ///
    /// A component that never becomes ready fails initialization after
    /// `timeout`; the failure is kept as the page's fatal error.
    pub async fn init(self: &Arc<Self>, timeout: Duration) -> Result<()> {
        tracing::info!(version = %self.version(), "Cache browser initializing");
        let waits = BASE_COMPONENTS
            .iter()
            .map(|name| self.readiness.wait_for(name, timeout));
        if let Err(e) = futures::future::try_join_all(waits).await {
            tracing::error!(error = %e, "Failed to initialize cache browser");
            *self.fatal.write() = Some(format!("Failed to Initialize: {e}"));
            return Err(e);
        }

        self.coordinate();
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(version = %self.version(), "Cache browser ready");
        Ok(())
    }

    fn coordinate(self: &Arc<Self>) {
        let mut scope = ListenerScope::new(&self.bus);
        scope.on_weak(event::names::NAMESPACE_CHANGED, self, |this, event| {
            let Some(changed) = event.detail_as::<NamespaceChanged>() else {
                return;
            };
            tracing::info!(namespace = %changed.namespace, "Namespace changed");
            *this.namespace.write() = Some(changed.namespace);
            this.content_viewer.clear();
        });
        scope.on(event::names::FILE_SELECTED, |event| {
            if let Some(selected) = event.detail_as::<FileSelected>() {
                tracing::debug!(path = %selected.path, kind = %selected.kind, "File selected");
            }
        });
        scope.on(event::names::CONTENT_LOADED, |event| {
            if let Some(loaded) = event.detail_as::<ContentLoaded>() {
                tracing::info!(
                    path = %loaded.path,
                    content_type = %loaded.content_type,
                    size = %format_bytes(loaded.size as u64),
                    "Content loaded"
                );
            }
        });
        scope.on(event::names::AUTH_ERROR, |event| {
            if let Some(auth) = event.detail_as::<AuthErrorDetail>() {
                tracing::warn!(status = auth.status, endpoint = %auth.endpoint, "Auth error");
            }
        });
        scope.on(event::names::NETWORK_ERROR, |event| {
            if let Some(network) = event.detail_as::<NetworkErrorDetail>() {
                tracing::error!(endpoint = %network.endpoint, error = %network.error, "Network error");
            }
        });
        scope.on(event::names::COMPONENT_READY, |event| {
            if let Some(ready) = event.detail_as::<ComponentReady>() {
                tracing::debug!(component = %ready.component, "Component ready");
            }
        });
        self.listeners.lock().absorb(scope);
    }

    /// Reload the namespace list and the tree.
    pub async fn refresh(&self) {
        tokio::join!(self.top_nav.refresh(), self.file_tree.refresh());
    }

    pub fn teardown(&self) -> usize {
        self.listeners.lock().release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Deps;
    use crate::testing::FakeApi;
    use cache_browser_api::endpoints;
    use cache_browser_core::{mount, Error};
    use serde_json::json;

    fn parts() -> (Deps, Arc<TopNav>, Arc<FileTree>, Arc<ContentViewer>) {
        let api = FakeApi::new();
        api.respond(endpoints::HEALTH, json!({"status": "ok"}))
            .respond(endpoints::NAMESPACES, json!(["default"]))
            .respond(&endpoints::all_files("default"), json!(["default/data/a.json"]))
            .respond(&endpoints::file_json("default/data/a.json"), json!({"a": 1}));
        let deps = Deps::new(EventBus::new(), api);
        let top_nav = TopNav::new(&deps);
        let file_tree = FileTree::new(&deps);
        let viewer = ContentViewer::new(&deps);
        (deps, top_nav, file_tree, viewer)
    }

    #[test]
    fn test_version_only_advances() {
        let (deps, nav, tree, viewer) = parts();
        let browser = CacheBrowser::new(&deps.bus, &deps.readiness, nav, tree, viewer);
        assert!(browser.advance_version(&Version::new(0, 1, 2)));
        assert!(!browser.advance_version(&Version::new(0, 1, 1)));
        assert!(!browser.advance_version(&Version::new(0, 1, 2)));
        assert_eq!(browser.version().to_string(), "0.1.2");
    }

    #[tokio::test]
    async fn test_namespace_change_clears_viewer() {
        let (deps, nav, tree, viewer) = parts();
        mount(&nav).unwrap();
        mount(&tree).unwrap();
        mount(&viewer).unwrap();
        let browser = CacheBrowser::new(&deps.bus, &deps.readiness, nav, tree, viewer.clone());
        browser.init(Duration::from_secs(1)).await.unwrap();
        deps.tasks.settle().await;

        viewer
            .load_file(FileSelected::new("default/data/a.json", "json", Some("default".into())))
            .await;
        assert!(viewer.current_path().is_some());

        deps.bus.emit(event::names::NAMESPACE_CHANGED, json!({"namespace": "other", "index": 1}));
        assert_eq!(browser.current_namespace().as_deref(), Some("other"));
        assert!(viewer.current_path().is_none());
        assert!(browser.is_initialized());
        assert!(browser.teardown() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_fails_when_a_component_never_mounts() {
        let (deps, nav, tree, viewer) = parts();
        mount(&nav).unwrap();
        mount(&viewer).unwrap();
        let browser = CacheBrowser::new(&deps.bus, &deps.readiness, nav, tree, viewer);

        let err = browser.init(Duration::from_secs(10)).await.unwrap_err();
        assert!(matches!(err, Error::ReadyTimeout { ref component, .. } if component == "file-tree"));
        assert!(!browser.is_initialized());
        assert!(browser.fatal_error().unwrap().starts_with("Failed to Initialize"));
    }
}
