//! Composition root of the console.
//!
//! Every service the page uses is constructed here and handed to whatever
//! needs it: there are no ambient singletons. The console is also the
//! context extension modules attach against, so everything a module may
//! touch is reachable from it.

use crate::browser::CacheBrowser;
use crate::components::{
    names, ContentViewer, Deps, FileTree, FilesView, HashesView, HtmlPanel, TopNav, ViewTabs,
};
use crate::extensions;
use crate::tasks::Background;
use cache_browser_api::DynCacheApi;
use cache_browser_core::extension::DynExtension;
use cache_browser_core::preferences::WidthPreference;
use cache_browser_core::{
    mount, AttachReport, Component, ComponentRegistry, ConsoleConfig, EventBus, ExtensionHost,
    KeyEvent, ListenerScope, ReadinessBoard, Result, ShortcutDispatcher,
};
use parking_lot::{Mutex, RwLock};
use semver::Version;
use std::sync::Arc;

pub struct Console {
    config: ConsoleConfig,
    deps: Deps,
    registry: RwLock<ComponentRegistry>,
    shortcuts: Arc<ShortcutDispatcher>,
    width: Arc<WidthPreference>,
    browser: Arc<CacheBrowser>,
    view_tabs: Arc<ViewTabs>,
    files_view: Arc<FilesView>,
    hashes_view: Arc<HashesView>,
    html_panel: Arc<HtmlPanel>,
    // Listeners attached by extension modules.
    extension_listeners: Mutex<ListenerScope>,
    report: RwLock<AttachReport>,
}

impl Console {
    /// Construct every service and component. Nothing is mounted yet.
    pub fn new(config: ConsoleConfig, api: DynCacheApi) -> Self {
        Self::on_bus(EventBus::with_name("cache-browser"), config, api)
    }

    /// Like [`Console::new`], on a bus the caller already shares, typically
    /// with an API client that reports network errors on it.
    pub fn on_bus(bus: EventBus, config: ConsoleConfig, api: DynCacheApi) -> Self {
        let deps = Deps::new(bus, api).with_debounce(config.filter_debounce());

        let top_nav = TopNav::new(&deps);
        let file_tree = FileTree::new(&deps);
        let content_viewer = ContentViewer::new(&deps);
        let browser = CacheBrowser::new(&deps.bus, &deps.readiness, top_nav, file_tree, content_viewer);

        let registry = ComponentRegistry::with_base_components(
            config.default_version.clone(),
            config.registry_base_path.clone(),
        );
        let width = Arc::new(WidthPreference::at(config.preferences_path()));

        Self {
            shortcuts: ShortcutDispatcher::new(&deps.bus),
            view_tabs: ViewTabs::new(&deps),
            files_view: FilesView::new(&deps),
            hashes_view: HashesView::new(&deps),
            html_panel: HtmlPanel::new(&deps),
            extension_listeners: Mutex::new(ListenerScope::new(&deps.bus)),
            report: RwLock::new(AttachReport::default()),
            registry: RwLock::new(registry),
            config,
            deps,
            width,
            browser,
        }
    }

    /// Build the console with every shipped extension module.
    pub async fn start(config: ConsoleConfig, api: DynCacheApi) -> Result<Self> {
        Self::start_with(config, api, extensions::default_modules()).await
    }

    /// Build the console, wait for the base components, then attach
    /// `modules` in order.
    ///
    /// Fails only when a base component never becomes ready. Extension
    /// modules are best-effort and never fail startup.
    pub async fn start_with(
        config: ConsoleConfig,
        api: DynCacheApi,
        modules: Vec<DynExtension<Console>>,
    ) -> Result<Self> {
        Self::new(config, api).boot(modules).await
    }

    /// Mount, load shortcuts, wait for the base release and attach
    /// `modules` on a console built with [`Console::on_bus`].
    pub async fn boot(self, modules: Vec<DynExtension<Console>>) -> Result<Self> {
        self.mount_components();
        self.load_shortcuts().await;
        self.browser.init(self.config.ready_timeout()).await?;
        self.attach(modules).await;
        Ok(self)
    }

    fn mount_components(&self) {
        let results = [
            (names::TOP_NAV, mount(self.browser.top_nav())),
            (names::FILE_TREE, mount(self.browser.file_tree())),
            (names::CONTENT_VIEWER, mount(self.browser.content_viewer())),
            (names::VIEW_TABS, mount(&self.view_tabs)),
            (names::FILES_VIEW, mount(&self.files_view)),
            (names::HASHES_VIEW, mount(&self.hashes_view)),
            (names::HTML_PANEL, mount(&self.html_panel)),
        ];
        for (component, result) in results {
            if let Err(e) = result {
                tracing::error!(component, error = %e, "Component failed to mount");
            }
        }
    }

    async fn load_shortcuts(&self) {
        match &self.config.shortcuts_path {
            Some(path) => {
                self.shortcuts.load(path).await;
            }
            None => tracing::debug!("No shortcut document configured, using built-in shortcuts"),
        }
    }

    /// Attach `modules` in order. Each attached module advances the
    /// reported version.
    pub async fn attach(&self, modules: Vec<DynExtension<Console>>) -> AttachReport {
        let mut host = ExtensionHost::with_timeout(self.config.extension_timeout());
        for module in modules {
            host.register(module);
        }
        let report = host
            .attach_all(self, |manifest| {
                self.browser.advance_version(&manifest.version);
            })
            .await;
        tracing::info!(
            attached = report.attached().len(),
            version = %self.browser.version(),
            "Extension modules attached"
        );
        *self.report.write() = report.clone();
        report
    }

    /// Wait until every named component is ready, within the ready budget.
    pub async fn wait_for(&self, components: &[&str]) -> Result<()> {
        let timeout = self.config.ready_timeout();
        let waits = components
            .iter()
            .map(|name| self.deps.readiness.wait_for(name, timeout));
        futures::future::try_join_all(waits).await?;
        Ok(())
    }

    /// Keep listeners attached by an extension module until teardown.
    pub fn track(&self, scope: ListenerScope) {
        self.extension_listeners.lock().absorb(scope);
    }

    pub fn handle_key(&self, event: &KeyEvent) -> Option<String> {
        self.shortcuts.handle_key(event)
    }

    /// Wait for background work started by listeners.
    pub async fn settle(&self) {
        self.deps.tasks.settle().await;
    }

    /// Release every listener and stop background work.
    pub fn teardown(&self) -> usize {
        let mut released = self.extension_listeners.lock().release();
        released += self.browser.teardown();
        released += self.shortcuts.teardown();
        let cores = [
            self.browser.top_nav().core(),
            self.browser.file_tree().core(),
            self.browser.content_viewer().core(),
            self.view_tabs.core(),
            self.files_view.core(),
            self.hashes_view.core(),
            self.html_panel.core(),
        ];
        for core in cores {
            core.teardown();
        }
        let aborted = self.deps.tasks.abort_all();
        tracing::info!(released, aborted, "Console torn down");
        released
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.deps.bus
    }

    pub fn api(&self) -> &DynCacheApi {
        &self.deps.api
    }

    pub fn tasks(&self) -> &Background {
        &self.deps.tasks
    }

    pub fn readiness(&self) -> &ReadinessBoard {
        &self.deps.readiness
    }

    /// Snapshot of the registry.
    pub fn registry(&self) -> ComponentRegistry {
        self.registry.read().clone()
    }

    pub fn register_components<'a>(&self, components: impl IntoIterator<Item = (&'a str, &'a str)>) {
        self.registry.write().register_components(components);
    }

    pub fn shortcuts(&self) -> &Arc<ShortcutDispatcher> {
        &self.shortcuts
    }

    pub fn width_preference(&self) -> &Arc<WidthPreference> {
        &self.width
    }

    pub fn browser(&self) -> &Arc<CacheBrowser> {
        &self.browser
    }

    pub fn version(&self) -> Version {
        self.browser.version()
    }

    /// Outcomes of the last attachment pass.
    pub fn attach_report(&self) -> AttachReport {
        self.report.read().clone()
    }

    pub fn top_nav(&self) -> &Arc<TopNav> {
        self.browser.top_nav()
    }

    pub fn file_tree(&self) -> &Arc<FileTree> {
        self.browser.file_tree()
    }

    pub fn content_viewer(&self) -> &Arc<ContentViewer> {
        self.browser.content_viewer()
    }

    pub fn view_tabs(&self) -> &Arc<ViewTabs> {
        &self.view_tabs
    }

    pub fn files_view(&self) -> &Arc<FilesView> {
        &self.files_view
    }

    pub fn hashes_view(&self) -> &Arc<HashesView> {
        &self.hashes_view
    }

    pub fn html_panel(&self) -> &Arc<HtmlPanel> {
        &self.html_panel
    }
}
