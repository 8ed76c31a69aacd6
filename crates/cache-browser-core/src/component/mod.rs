//! Component lifecycle contract.
//!
//! A component moves through `Constructed → Bound → Listening → Ready` when
//! it is mounted and ends in `TornDown`. Binding checks that every element
//! the component expects exists in its render root; a mismatch is a
//! packaging defect and fails the mount loudly. Every bus listener attached
//! while listening is tracked and released together on teardown.

pub mod readiness;
pub mod render;
pub mod state;

pub use readiness::{Readiness, ReadinessBoard, DEFAULT_READY_TIMEOUT};
pub use render::{Element, Injection, Placement, RenderRoot};
pub use state::{state_ids, LoadState, RequestGeneration, Ticket};

use crate::error::{Error, Result};
use crate::event::{names, BusEvent, ComponentReady};
use crate::eventbus::{EventBus, ListenerId};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle position of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Constructed,
    Bound,
    Listening,
    Ready,
    TornDown,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Constructed => "constructed",
            LifecycleState::Bound => "bound",
            LifecycleState::Listening => "listening",
            LifecycleState::Ready => "ready",
            LifecycleState::TornDown => "torn_down",
        };
        write!(f, "{s}")
    }
}

/// Bus listeners owned by one component or module, released together.
///
/// Dropping the scope releases whatever it still holds.
pub struct ListenerScope {
    bus: EventBus,
    handles: Vec<ListenerId>,
}

impl ListenerScope {
    pub fn new(bus: &EventBus) -> Self {
        Self {
            bus: bus.clone(),
            handles: Vec::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Attach and track a listener.
    pub fn on<F>(&mut self, name: &str, handler: F) -> ListenerId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let id = self.bus.on(name, handler);
        self.handles.push(id);
        id
    }

    /// Attach a listener that holds `target` weakly and stops acting once
    /// the target is dropped.
    pub fn on_weak<T, F>(&mut self, name: &str, target: &Arc<T>, handler: F) -> ListenerId
    where
        T: Send + Sync + 'static,
        F: Fn(&Arc<T>, &BusEvent) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(target);
        self.on(name, move |event| {
            if let Some(target) = weak.upgrade() {
                handler(&target, event);
            }
        })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Take over every handle tracked by `other`.
    pub fn absorb(&mut self, mut other: ListenerScope) {
        self.handles.append(&mut other.handles);
    }

    /// Release every tracked listener. Safe to call repeatedly.
    pub fn release(&mut self) -> usize {
        let handles = std::mem::take(&mut self.handles);
        let count = handles.len();
        for id in handles {
            self.bus.off(id);
        }
        count
    }
}

impl Drop for ListenerScope {
    fn drop(&mut self) {
        self.release();
    }
}

/// State every component carries: identity, bus access, lifecycle,
/// tracked listeners, render root and readiness flag.
pub struct ComponentCore {
    name: String,
    bus: EventBus,
    lifecycle: Mutex<LifecycleState>,
    listeners: Mutex<ListenerScope>,
    root: RwLock<RenderRoot>,
    readiness: Readiness,
}

impl ComponentCore {
    pub fn new(name: impl Into<String>, bus: &EventBus, readiness: Readiness, root: RenderRoot) -> Self {
        Self {
            name: name.into(),
            bus: bus.clone(),
            lifecycle: Mutex::new(LifecycleState::Constructed),
            listeners: Mutex::new(ListenerScope::new(bus)),
            root: RwLock::new(root),
            readiness,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn lifecycle(&self) -> LifecycleState {
        *self.lifecycle.lock()
    }

    fn set_lifecycle(&self, state: LifecycleState) {
        *self.lifecycle.lock() = state;
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifecycle() == LifecycleState::TornDown
    }

    /// Emit an event sourced from this component.
    pub fn emit(&self, name: &str, detail: Value) -> usize {
        self.bus
            .emit_with_source(BusEvent::new(name, detail), self.name.as_str())
    }

    /// Emit a typed payload sourced from this component.
    pub fn emit_typed<T: Serialize>(&self, name: &str, payload: &T) -> usize {
        self.bus
            .emit_with_source(BusEvent::typed(name, payload), self.name.as_str())
    }

    pub fn with_root<R>(&self, f: impl FnOnce(&RenderRoot) -> R) -> R {
        f(&self.root.read())
    }

    pub fn with_root_mut<R>(&self, f: impl FnOnce(&mut RenderRoot) -> R) -> R {
        f(&mut self.root.write())
    }

    /// Snapshot of the render tree.
    pub fn snapshot(&self) -> RenderRoot {
        self.root.read().clone()
    }

    /// Show the element matching `state` and hide the other state elements.
    pub fn show_state(&self, state: &LoadState) {
        let visible = state.visible_element();
        let mut root = self.root.write();
        for id in [
            state_ids::LOADING,
            state_ids::ERROR,
            state_ids::EMPTY,
            state_ids::CONTENT,
        ] {
            root.set_hidden(id, Some(id) != visible);
        }
        if let Some(message) = state.error_message() {
            root.set_text(state_ids::ERROR_MESSAGE, message);
        }
    }

    /// Insert an extension-owned element into a declared slot.
    pub fn inject(
        &self,
        module: &str,
        slot: &str,
        element: Element,
        placement: Placement,
    ) -> Result<Injection> {
        let id = element.id.clone().unwrap_or_default();
        let outcome = self.root.write().inject(slot, element, placement)?;
        match outcome {
            Injection::Inserted => {
                tracing::debug!(component = %self.name, module, slot, element = %id, "Injected element")
            }
            Injection::AlreadyPresent => {
                tracing::debug!(component = %self.name, module, element = %id, "Element already injected")
            }
        }
        Ok(outcome)
    }

    /// Mutate an element previously placed by [`inject`](Self::inject).
    pub fn update_injected(&self, id: &str, f: impl FnOnce(&mut Element)) -> bool {
        self.root.write().update_injected(id, f)
    }

    /// Remove an element previously placed by [`inject`](Self::inject).
    pub fn remove_injected(&self, id: &str) -> bool {
        let mut root = self.root.write();
        if !root.is_injected(id) {
            return false;
        }
        root.remove(id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Release every tracked listener and move to `TornDown`.
    ///
    /// Returns `false` when already torn down.
    pub fn teardown(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if *lifecycle == LifecycleState::TornDown {
            return false;
        }
        let released = self.listeners.lock().release();
        *lifecycle = LifecycleState::TornDown;
        tracing::debug!(component = %self.name, released, "Component torn down");
        true
    }
}

/// Behaviour contract for leaf components.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    fn core(&self) -> &ComponentCore;

    fn name(&self) -> &str {
        self.core().name()
    }

    /// Element ids that must exist in the render root for binding to succeed.
    fn required_elements(&self) -> &'static [&'static str] {
        &[]
    }

    /// Operations extension modules may intercept.
    fn extensible_operations(&self) -> &'static [&'static str] {
        &[]
    }

    /// Attach bus listeners. Every listener must go through `scope`.
    fn listen(self: Arc<Self>, scope: &mut ListenerScope);

    /// Called once after readiness has been announced.
    fn on_ready(self: Arc<Self>) {}

    /// Reset visual and data state without destroying the instance.
    fn clear(&self);

    /// Re-run the data-loading step.
    async fn refresh(&self);

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        self.core().readiness().wait(timeout).await
    }
}

/// Run a component through bind, listen and ready.
///
/// Mounting an already mounted component is a no-op.
pub fn mount<C: Component>(component: &Arc<C>) -> Result<()> {
    let core = component.core();
    if core.lifecycle() != LifecycleState::Constructed {
        tracing::debug!(component = %core.name(), state = %core.lifecycle(), "Already mounted");
        return Ok(());
    }

    let missing = core.with_root(|root| {
        component
            .required_elements()
            .iter()
            .find(|id| !root.contains(id))
            .map(|id| id.to_string())
    });
    if let Some(element) = missing {
        tracing::error!(
            component = %core.name(),
            element = %element,
            "Required element missing from render root"
        );
        return Err(Error::MissingElement {
            component: core.name().to_string(),
            element,
        });
    }
    core.set_lifecycle(LifecycleState::Bound);

    let mut scope = ListenerScope::new(core.bus());
    component.clone().listen(&mut scope);
    core.listeners.lock().absorb(scope);
    core.set_lifecycle(LifecycleState::Listening);

    core.set_lifecycle(LifecycleState::Ready);
    core.readiness().mark_ready();
    core.emit_typed(
        names::COMPONENT_READY,
        &ComponentReady {
            component: core.name().to_string(),
        },
    );
    tracing::debug!(component = %core.name(), listeners = core.listener_count(), "Component ready");

    component.clone().on_ready();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Probe {
        core: ComponentCore,
        hits: AtomicUsize,
        cleared: AtomicUsize,
    }

    impl Probe {
        fn new(bus: &EventBus, root: RenderRoot) -> Arc<Self> {
            Arc::new(Self {
                core: ComponentCore::new("probe", bus, Readiness::new("probe"), root),
                hits: AtomicUsize::new(0),
                cleared: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Component for Probe {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn required_elements(&self) -> &'static [&'static str] {
            &["probe-body"]
        }

        fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
            scope.on_weak("ping", &self, |this, _| {
                this.hits.fetch_add(1, Ordering::SeqCst);
            });
            scope.on_weak("reset", &self, |this, _| this.clear());
        }

        fn clear(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }

        async fn refresh(&self) {}
    }

    fn probe_root() -> RenderRoot {
        RenderRoot::new(
            "probe",
            Element::new("div").with_id("probe-body").with_children([
                Element::new("div").with_id(state_ids::LOADING),
                Element::new("div").with_id(state_ids::ERROR).with_child(
                    Element::new("span").with_id(state_ids::ERROR_MESSAGE),
                ),
                Element::new("div").with_id(state_ids::CONTENT),
            ]),
        )
    }

    #[tokio::test]
    async fn test_mount_walks_lifecycle_and_announces_ready() {
        let bus = EventBus::new();
        let mut ready = bus.filter().named(names::COMPONENT_READY);
        let probe = Probe::new(&bus, probe_root());

        mount(&probe).unwrap();

        assert_eq!(probe.core().lifecycle(), LifecycleState::Ready);
        assert_eq!(probe.core().listener_count(), 2);
        let (event, meta) = ready.recv().await.unwrap();
        assert_eq!(event.detail["component"], "probe");
        assert_eq!(meta.source, "probe");
        assert!(probe.wait_ready(Duration::from_millis(1)).await.is_ok());

        bus.emit("ping", Value::Null);
        bus.emit("reset", Value::Null);
        assert_eq!(probe.hits.load(Ordering::SeqCst), 1);
        assert_eq!(probe.cleared.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_element_fails_mount() {
        let bus = EventBus::new();
        let probe = Probe::new(&bus, RenderRoot::new("probe", Element::new("div")));

        let err = mount(&probe).unwrap_err();
        assert!(matches!(err, Error::MissingElement { ref element, .. } if element == "probe-body"));
        assert_eq!(probe.core().lifecycle(), LifecycleState::Constructed);
        assert_eq!(bus.listener_count("ping"), 0);
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent_and_stops_delivery() {
        let bus = EventBus::new();
        let probe = Probe::new(&bus, probe_root());
        mount(&probe).unwrap();

        assert!(probe.core().teardown());
        assert!(!probe.core().teardown());
        assert_eq!(probe.core().lifecycle(), LifecycleState::TornDown);

        bus.emit("ping", Value::Null);
        assert_eq!(probe.hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count("ping"), 0);
    }

    #[tokio::test]
    async fn test_mount_twice_is_noop() {
        let bus = EventBus::new();
        let probe = Probe::new(&bus, probe_root());
        mount(&probe).unwrap();
        mount(&probe).unwrap();
        assert_eq!(bus.listener_count("ping"), 1);
    }

    #[test]
    fn test_show_state_is_exclusive() {
        let bus = EventBus::new();
        let core = ComponentCore::new("probe", &bus, Readiness::new("probe"), probe_root());

        core.show_state(&LoadState::error("server down"));
        core.with_root(|root| {
            assert_eq!(root.is_hidden(state_ids::ERROR), Some(false));
            assert_eq!(root.is_hidden(state_ids::LOADING), Some(true));
            assert_eq!(root.is_hidden(state_ids::CONTENT), Some(true));
            assert_eq!(root.text(state_ids::ERROR_MESSAGE), Some("server down"));
        });

        core.show_state(&LoadState::Content);
        core.with_root(|root| {
            assert_eq!(root.is_hidden(state_ids::ERROR), Some(true));
            assert_eq!(root.is_hidden(state_ids::CONTENT), Some(false));
        });
    }

    #[test]
    fn test_scope_drop_releases_listeners() {
        let bus = EventBus::new();
        {
            let mut scope = ListenerScope::new(&bus);
            scope.on("x", |_| {});
            scope.on("y", |_| {});
            assert_eq!(scope.len(), 2);
        }
        assert_eq!(bus.listener_count("x"), 0);
        assert_eq!(bus.listener_count("y"), 0);
    }
}
