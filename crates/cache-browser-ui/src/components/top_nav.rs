//! Navigation bar: service health, storage mode, namespace tabs and the
//! authentication banner.

use super::{mark_active, names, Deps};
use crate::tasks::Background;
use async_trait::async_trait;
use cache_browser_api::DynCacheApi;
use cache_browser_core::event::{self, shortcuts, NamespaceChanged};
use cache_browser_core::nav;
use cache_browser_core::{Component, ComponentCore, Element, ListenerScope, RenderRoot, RequestGeneration};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_NAMESPACE: &str = "default";

const HEALTH_STATUS: &str = "health-status";
const STORAGE_MODE: &str = "storage-mode";
const NAMESPACE_TABS: &str = "namespace-tabs";
const NAMESPACE_MESSAGE: &str = "namespace-message";
const NAMESPACE_RETRY: &str = "namespace-retry-btn";
const AUTH_BANNER: &str = "auth-banner";

/// Service health as shown in the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    #[default]
    Checking,
    Online,
    Offline,
}

impl Health {
    pub fn label(&self) -> &'static str {
        match self {
            Health::Checking => "Checking...",
            Health::Online => "Healthy",
            Health::Offline => "Offline",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Health::Checking => "status-checking",
            Health::Online => "status-online",
            Health::Offline => "status-offline",
        }
    }
}

#[derive(Debug, Default)]
struct NavState {
    namespaces: Vec<String>,
    active: Option<usize>,
    health: Health,
    storage_mode: Option<String>,
    // Namespace that was active before a failed load.
    remembered: Option<String>,
}

/// `default` first, the rest in byte order.
pub fn sort_namespaces(mut namespaces: Vec<String>) -> Vec<String> {
    namespaces.sort_by(|a, b| {
        (a != DEFAULT_NAMESPACE)
            .cmp(&(b != DEFAULT_NAMESPACE))
            .then_with(|| a.cmp(b))
    });
    namespaces
}

pub struct TopNav {
    core: ComponentCore,
    api: DynCacheApi,
    tasks: Background,
    state: RwLock<NavState>,
    requests: RequestGeneration,
}

impl TopNav {
    pub fn new(deps: &Deps) -> Arc<Self> {
        Arc::new(Self {
            core: deps.core(names::TOP_NAV, Self::render_root()),
            api: deps.api.clone(),
            tasks: deps.tasks.clone(),
            state: RwLock::new(NavState::default()),
            requests: RequestGeneration::new(),
        })
    }

    fn render_root() -> RenderRoot {
        let health = Health::Checking;
        RenderRoot::new(
            names::TOP_NAV,
            Element::new("nav").with_id("top-nav").with_children([
                Element::new("span")
                    .with_id(HEALTH_STATUS)
                    .with_class(health.class())
                    .with_text(health.label()),
                Element::new("span")
                    .with_id(STORAGE_MODE)
                    .with_class("storage-badge")
                    .hidden(),
                Element::new("div").with_id(NAMESPACE_TABS).hidden(),
                Element::new("span")
                    .with_id(NAMESPACE_MESSAGE)
                    .with_text("Loading namespaces..."),
                Element::new("button")
                    .with_id(NAMESPACE_RETRY)
                    .with_text("Retry")
                    .hidden(),
                Element::new("div")
                    .with_id("nav-actions")
                    .with_child(Element::new("button").with_id("help-btn").with_text("?")),
                Element::new("div")
                    .with_id(AUTH_BANNER)
                    .with_class("auth-banner")
                    .hidden()
                    .with_child(Element::new("span").with_text("Authentication required"))
                    .with_child(Element::new("button").with_id("auth-retry-btn").with_text("Retry")),
            ]),
        )
        .with_slot("nav-actions", "nav-actions")
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.state.read().namespaces.clone()
    }

    pub fn active_namespace(&self) -> Option<String> {
        let state = self.state.read();
        state.active.and_then(|i| state.namespaces.get(i).cloned())
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.read().active
    }

    pub fn health(&self) -> Health {
        self.state.read().health
    }

    pub fn storage_mode(&self) -> Option<String> {
        self.state.read().storage_mode.clone()
    }

    pub fn auth_banner_visible(&self) -> bool {
        self.core
            .with_root(|root| root.is_hidden(AUTH_BANNER) == Some(false))
    }

    fn set_health(&self, health: Health) {
        self.state.write().health = health;
        self.core.with_root_mut(|root| {
            if let Some(el) = root.element_mut(HEALTH_STATUS) {
                el.classes = vec![health.class().to_string()];
                el.text = health.label().to_string();
            }
        });
    }

    pub async fn check_health(&self) {
        self.set_health(Health::Checking);
        let health = match self.api.health().await {
            Ok(response) => {
                let ok = response
                    .as_json()
                    .and_then(|v| v.get("status"))
                    .and_then(Value::as_str)
                    == Some("ok");
                if ok {
                    Health::Online
                } else {
                    Health::Offline
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Health check failed");
                Health::Offline
            }
        };
        self.set_health(health);
    }

    pub async fn load_storage_info(&self) {
        let response = match self.api.storage_info().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "Storage info unavailable");
                return;
            }
        };
        let mode = response.as_json().and_then(|info| {
            info.get("storage_mode")
                .or_else(|| info.get("mode"))
                .and_then(Value::as_str)
                .map(str::to_uppercase)
        });
        if let Some(mode) = mode {
            self.core.with_root_mut(|root| {
                root.set_text(STORAGE_MODE, mode.as_str());
                root.set_hidden(STORAGE_MODE, false);
            });
            self.state.write().storage_mode = Some(mode);
        }
    }

    fn set_message(&self, message: Option<&str>) {
        self.core.with_root_mut(|root| match message {
            Some(text) => {
                root.set_text(NAMESPACE_MESSAGE, text);
                root.set_hidden(NAMESPACE_MESSAGE, false);
            }
            None => {
                root.set_hidden(NAMESPACE_MESSAGE, true);
            }
        });
    }

    pub fn tabs_visible(&self) -> bool {
        self.core
            .with_root(|root| root.is_hidden(NAMESPACE_TABS) == Some(false))
    }

    pub fn retry_visible(&self) -> bool {
        self.core
            .with_root(|root| root.is_hidden(NAMESPACE_RETRY) == Some(false))
    }

    /// Swap the tab strip for a status message, optionally with a retry
    /// button. The rendered tabs are dropped so no stale namespace stays
    /// clickable.
    fn show_status(&self, message: &str, retry: bool) {
        self.core.with_root_mut(|root| {
            root.replace_children(NAMESPACE_TABS, Vec::new());
            root.set_hidden(NAMESPACE_TABS, true);
            root.set_hidden(NAMESPACE_RETRY, !retry);
        });
        self.set_message(Some(message));
    }

    /// Fetch the namespace list and select one.
    ///
    /// The active namespace stays selected when it is still listed;
    /// otherwise the first namespace is selected. While loading, and after
    /// a failure, no tabs are shown; a failure offers a retry.
    pub async fn load_namespaces(&self) {
        let ticket = self.requests.begin();
        let previous = self
            .active_namespace()
            .or_else(|| self.state.read().remembered.clone());
        self.show_status("Loading namespaces...", false);

        let result = self.api.namespaces().await;
        if !self.requests.is_current(ticket) {
            tracing::debug!(ticket = ticket.value(), "Dropping stale namespace list");
            return;
        }

        let namespaces = match result {
            Ok(response) => sort_namespaces(response.strings()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load namespaces");
                {
                    let mut state = self.state.write();
                    state.namespaces.clear();
                    state.active = None;
                    state.remembered = previous;
                }
                self.show_status("Failed to load namespaces", true);
                return;
            }
        };

        let kept = previous
            .as_ref()
            .and_then(|p| namespaces.iter().position(|n| n == p));
        {
            let mut state = self.state.write();
            state.namespaces = namespaces.clone();
            state.active = kept;
            state.remembered = None;
        }
        self.render_tabs();

        if namespaces.is_empty() {
            self.set_message(Some("No namespaces found"));
            return;
        }
        self.core
            .with_root_mut(|root| root.set_hidden(NAMESPACE_TABS, false));
        self.set_message(None);
        tracing::debug!(count = namespaces.len(), "Loaded namespaces");

        if kept.is_none() {
            self.select_index(0);
        }
    }

    fn render_tabs(&self) {
        let (namespaces, active) = {
            let state = self.state.read();
            (state.namespaces.clone(), state.active)
        };
        let tabs = namespaces
            .iter()
            .enumerate()
            .map(|(i, ns)| {
                let mut tab = Element::new("button")
                    .with_id(format!("ns-tab-{i}"))
                    .with_class("namespace-tab")
                    .with_attr("data-namespace", ns.as_str())
                    .with_attr("data-index", i.to_string())
                    .with_text(ns.as_str());
                tab.toggle_class("active", active == Some(i));
                tab
            })
            .collect();
        self.core
            .with_root_mut(|root| root.replace_children(NAMESPACE_TABS, tabs));
    }

    /// Select the namespace at `index`. Out-of-range indexes and the
    /// already active namespace are ignored.
    pub fn select_index(&self, index: usize) -> bool {
        let namespace = {
            let mut state = self.state.write();
            let Some(namespace) = state.namespaces.get(index).cloned() else {
                return false;
            };
            if state.active == Some(index) {
                return false;
            }
            state.active = Some(index);
            namespace
        };

        self.core.with_root_mut(|root| {
            mark_active(root, NAMESPACE_TABS, "data-index", &index.to_string())
        });
        tracing::info!(namespace = %namespace, index, "Namespace selected");
        self.core.emit_typed(
            event::names::NAMESPACE_CHANGED,
            &NamespaceChanged { namespace, index },
        );
        true
    }

    pub fn select_namespace(&self, namespace: &str) -> bool {
        let index = self
            .state
            .read()
            .namespaces
            .iter()
            .position(|n| n == namespace);
        match index {
            Some(index) => self.select_index(index),
            None => false,
        }
    }

    /// Select the next namespace, wrapping to the first.
    pub fn next_namespace(&self) -> bool {
        let (active, len) = self.position();
        let target = match active {
            Some(current) => nav::wrap_next(current, len),
            None if len > 0 => Some(0),
            None => None,
        };
        target.is_some_and(|i| self.select_index(i))
    }

    /// Select the previous namespace, wrapping to the last.
    pub fn prev_namespace(&self) -> bool {
        let (active, len) = self.position();
        let target = match active {
            Some(current) => nav::wrap_prev(current, len),
            None if len > 0 => Some(len - 1),
            None => None,
        };
        target.is_some_and(|i| self.select_index(i))
    }

    fn position(&self) -> (Option<usize>, usize) {
        let state = self.state.read();
        (state.active, state.namespaces.len())
    }

    /// Show the authentication banner. Returns `false` if it was already up.
    pub fn show_auth_banner(&self) -> bool {
        let shown = self.core.with_root_mut(|root| {
            let was_hidden = root.is_hidden(AUTH_BANNER) == Some(true);
            if let Some(el) = root.element_mut(AUTH_BANNER) {
                el.hidden = false;
                el.toggle_class("show", true);
            }
            was_hidden
        });
        if shown {
            tracing::warn!("Authentication required, showing banner");
        }
        shown
    }

    pub fn hide_auth_banner(&self) {
        self.core.with_root_mut(|root| {
            if let Some(el) = root.element_mut(AUTH_BANNER) {
                el.hidden = true;
                el.toggle_class("show", false);
            }
        });
    }

    /// Load the namespace list again after a failure.
    pub async fn retry_namespaces(&self) {
        self.load_namespaces().await;
    }

    /// Hide the banner and load again.
    pub async fn retry_auth(&self) {
        self.hide_auth_banner();
        self.refresh().await;
    }

    /// Ask for the shortcut help overlay.
    pub fn help(&self) {
        self.core.emit(shortcuts::HELP_TOGGLE, json!({}));
    }

    async fn initial_load(&self) {
        tokio::join!(
            self.check_health(),
            self.load_storage_info(),
            self.load_namespaces()
        );
    }
}

#[async_trait]
impl Component for TopNav {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn required_elements(&self) -> &'static [&'static str] {
        &[HEALTH_STATUS, NAMESPACE_TABS, AUTH_BANNER]
    }

    fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
        scope.on_weak(shortcuts::NAMESPACE_NEXT, &self, |this, _| {
            this.next_namespace();
        });
        scope.on_weak(shortcuts::NAMESPACE_PREV, &self, |this, _| {
            this.prev_namespace();
        });
        scope.on_weak(shortcuts::NAMESPACE_SELECT, &self, |this, event| {
            if let Some(index) = event.detail.get("index").and_then(Value::as_u64) {
                this.select_index(index as usize);
            }
        });
        scope.on_weak(event::names::AUTH_ERROR, &self, |this, _| {
            this.show_auth_banner();
        });
    }

    fn on_ready(self: Arc<Self>) {
        let tasks = self.tasks.clone();
        tasks.spawn(async move { self.initial_load().await });
    }

    fn clear(&self) {
        self.requests.invalidate();
        {
            let mut state = self.state.write();
            state.namespaces.clear();
            state.active = None;
            state.remembered = None;
        }
        self.render_tabs();
        self.core
            .with_root_mut(|root| root.set_hidden(NAMESPACE_RETRY, true));
        self.set_message(None);
    }

    async fn refresh(&self) {
        self.check_health().await;
        self.load_namespaces().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_error, FakeApi};
    use cache_browser_api::endpoints;
    use cache_browser_core::{mount, BusEvent, EventBus};

    fn service() -> Arc<FakeApi> {
        let api = FakeApi::new();
        api.respond(endpoints::HEALTH, json!({"status": "ok"}))
            .respond(endpoints::STORAGE_INFO, json!({"storage_mode": "s3"}))
            .respond(endpoints::NAMESPACES, json!(["beta", "default", "Alpha", "alpha"]));
        api
    }

    async fn mounted(api: Arc<FakeApi>) -> (Arc<TopNav>, EventBus, Deps) {
        let bus = EventBus::new();
        let deps = Deps::new(bus.clone(), api);
        let nav = TopNav::new(&deps);
        mount(&nav).unwrap();
        deps.tasks.settle().await;
        (nav, bus, deps)
    }

    #[test]
    fn test_default_sorts_first() {
        let sorted = sort_namespaces(vec!["b".into(), "default".into(), "B".into(), "a".into()]);
        assert_eq!(sorted, vec!["default", "B", "a", "b"]);
    }

    #[tokio::test]
    async fn test_ready_loads_and_selects_first_namespace() {
        let bus = EventBus::new();
        let mut changed = bus.filter().named(event::names::NAMESPACE_CHANGED);
        let deps = Deps::new(bus.clone(), service());
        let nav = TopNav::new(&deps);
        mount(&nav).unwrap();
        deps.tasks.settle().await;

        assert_eq!(nav.namespaces(), vec!["default", "Alpha", "alpha", "beta"]);
        assert_eq!(nav.active_namespace().as_deref(), Some("default"));
        assert_eq!(nav.health(), Health::Online);
        assert_eq!(nav.storage_mode().as_deref(), Some("S3"));

        let (event, meta) = changed.try_recv().unwrap();
        assert_eq!(event.detail, json!({"namespace": "default", "index": 0}));
        assert_eq!(meta.source, names::TOP_NAV);
        assert!(changed.try_recv().is_none());

        let snapshot = nav.core().snapshot();
        assert!(snapshot.element("ns-tab-0").unwrap().has_class("active"));
        assert_eq!(snapshot.text(HEALTH_STATUS), Some("Healthy"));
        assert_eq!(snapshot.is_hidden(NAMESPACE_MESSAGE), Some(true));
    }

    #[tokio::test]
    async fn test_namespace_navigation_wraps() {
        let (nav, _bus, _deps) = mounted(service()).await;

        assert!(nav.prev_namespace());
        assert_eq!(nav.active_namespace().as_deref(), Some("beta"));
        assert!(nav.next_namespace());
        assert_eq!(nav.active_index(), Some(0));

        // Selecting the active namespace does nothing.
        assert!(!nav.select_namespace("default"));
        assert!(!nav.select_index(17));
    }

    #[tokio::test]
    async fn test_shortcuts_drive_selection() {
        let (nav, bus, _deps) = mounted(service()).await;

        bus.emit(shortcuts::NAMESPACE_SELECT, json!({"index": 2}));
        assert_eq!(nav.active_namespace().as_deref(), Some("alpha"));

        bus.emit(shortcuts::NAMESPACE_NEXT, json!({}));
        assert_eq!(nav.active_namespace().as_deref(), Some("beta"));

        bus.emit(shortcuts::NAMESPACE_SELECT, json!({"index": 99}));
        assert_eq!(nav.active_namespace().as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn test_failures_show_offline_and_message() {
        let api = FakeApi::new();
        api.respond(endpoints::HEALTH, json!({"status": "degraded"}))
            .fail(endpoints::NAMESPACES, http_error(500));
        let (nav, _bus, _deps) = mounted(api.clone()).await;

        assert_eq!(nav.health(), Health::Offline);
        assert!(nav.storage_mode().is_none());
        let snapshot = nav.core().snapshot();
        assert_eq!(snapshot.text(NAMESPACE_MESSAGE), Some("Failed to load namespaces"));
        assert_eq!(snapshot.is_hidden(STORAGE_MODE), Some(true));

        api.respond(endpoints::NAMESPACES, json!([]));
        nav.load_namespaces().await;
        assert_eq!(
            nav.core().snapshot().text(NAMESPACE_MESSAGE),
            Some("No namespaces found")
        );
    }

    #[tokio::test]
    async fn test_failed_reload_drops_tabs_and_offers_retry() {
        let api = FakeApi::new();
        api.respond(endpoints::NAMESPACES, json!(["default", "beta"]));
        let (nav, _bus, _deps) = mounted(api.clone()).await;
        nav.select_namespace("beta");
        assert!(nav.tabs_visible());
        assert!(!nav.retry_visible());

        api.fail(endpoints::NAMESPACES, http_error(500));
        nav.load_namespaces().await;

        assert!(nav.namespaces().is_empty());
        assert!(nav.active_namespace().is_none());
        assert!(!nav.tabs_visible());
        assert!(nav.retry_visible());
        let snapshot = nav.core().snapshot();
        assert_eq!(snapshot.count_id("ns-tab-0"), 0);
        assert_eq!(snapshot.count_id("ns-tab-1"), 0);
        assert_eq!(snapshot.is_hidden(NAMESPACE_MESSAGE), Some(false));
        assert_eq!(snapshot.text(NAMESPACE_MESSAGE), Some("Failed to load namespaces"));

        api.respond(endpoints::NAMESPACES, json!(["default", "beta"]));
        nav.retry_namespaces().await;

        assert_eq!(nav.namespaces(), vec!["default", "beta"]);
        assert_eq!(nav.active_namespace().as_deref(), Some("beta"));
        assert!(nav.tabs_visible());
        assert!(!nav.retry_visible());
        let snapshot = nav.core().snapshot();
        assert_eq!(snapshot.count_id("ns-tab-0"), 1);
        assert!(snapshot.element("ns-tab-1").unwrap().has_class("active"));
        assert_eq!(snapshot.is_hidden(NAMESPACE_MESSAGE), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tabs_hidden_while_loading() {
        let api = service();
        let (nav, _bus, _deps) = mounted(api.clone()).await;
        api.delay(endpoints::NAMESPACES, std::time::Duration::from_millis(50));

        let reload = {
            let nav = Arc::clone(&nav);
            tokio::spawn(async move { nav.load_namespaces().await })
        };
        tokio::task::yield_now().await;
        assert!(!nav.tabs_visible());
        assert_eq!(nav.core().snapshot().count_id("ns-tab-0"), 0);
        assert_eq!(
            nav.core().snapshot().text(NAMESPACE_MESSAGE),
            Some("Loading namespaces...")
        );

        reload.await.unwrap();
        assert!(nav.tabs_visible());
        assert_eq!(nav.active_namespace().as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_active_namespace() {
        let (nav, bus, _deps) = mounted(service()).await;
        nav.select_namespace("beta");

        let mut changed = bus.filter().named(event::names::NAMESPACE_CHANGED);
        nav.refresh().await;
        assert_eq!(nav.active_namespace().as_deref(), Some("beta"));
        assert!(changed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_auth_banner_shows_once_and_retry_hides_it() {
        let api = service();
        let (nav, bus, _deps) = mounted(api.clone()).await;

        let auth = json!({"status": 401, "endpoint": "/namespaces/list", "message": "Authentication required"});
        bus.emit_event(BusEvent::new(event::names::AUTH_ERROR, auth.clone()));
        assert!(nav.auth_banner_visible());
        assert!(!nav.show_auth_banner());
        bus.emit_event(BusEvent::new(event::names::AUTH_ERROR, auth));
        assert_eq!(nav.core().snapshot().count_id(AUTH_BANNER), 1);

        nav.retry_auth().await;
        assert!(!nav.auth_banner_visible());
        assert_eq!(api.call_count(endpoints::HEALTH), 2);
        assert_eq!(api.call_count(endpoints::NAMESPACES), 2);
    }

    #[tokio::test]
    async fn test_help_button_emits_toggle() {
        let (nav, bus, _deps) = mounted(service()).await;
        let mut help = bus.filter().named(shortcuts::HELP_TOGGLE);
        nav.help();
        assert!(help.try_recv().is_some());
    }
}
