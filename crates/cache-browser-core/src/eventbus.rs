//! Event bus for cross-component communication.
//!
//! Every component both emits and listens on one shared bus. Delivery to
//! registered listeners is synchronous and ordered by registration. A
//! broadcast tap additionally forwards each event to async subscribers,
//! which is how the composition root and tests observe traffic without
//! registering listeners.

use crate::event::{BusEvent, EventMetadata};
use parking_lot::RwLock;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default channel capacity for async subscribers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Listener callback.
pub type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    name: String,
    handler: Handler,
}

struct Inner {
    listeners: RwLock<Vec<Listener>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<(BusEvent, EventMetadata)>,
}

/// Event bus shared by every component of one console page.
///
/// Semantics:
/// - `emit` calls each listener registered for the name at the moment of
///   emission, in registration order. Listeners added during delivery do
///   not see the event being delivered.
/// - Listeners may emit further events (including the one they handle).
///   The bus holds no lock while a listener runs; recursion guards belong
///   to the listeners.
/// - A panicking listener is logged and skipped; remaining listeners still
///   receive the event.
/// - The payload is shared by reference and immutable for the whole
///   delivery.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
    name: String,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the specified async tap capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(Inner {
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                tx,
            }),
            name: "default".to_string(),
        }
    }

    /// Create a new event bus with a name.
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut bus = Self::new();
        bus.name = name.into();
        bus
    }

    /// Get the name of this event bus.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a listener for `name`.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.write().push(Listener {
            id,
            name: name.into(),
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a listener. Unknown or already removed handles are ignored.
    ///
    /// Returns `true` if a listener was removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .listeners
            .read()
            .iter()
            .filter(|l| l.name == name)
            .count()
    }

    /// Number of async subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    /// Emit an event by name with a JSON detail.
    ///
    /// Returns the number of listeners that ran to completion.
    pub fn emit(&self, name: impl Into<String>, detail: Value) -> usize {
        self.emit_event(BusEvent::new(name, detail))
    }

    /// Emit a prepared event from the "system" source.
    pub fn emit_event(&self, event: BusEvent) -> usize {
        self.emit_with_source(event, "system")
    }

    /// Emit a prepared event with a custom source.
    pub fn emit_with_source(&self, event: BusEvent, source: impl Into<String>) -> usize {
        let metadata = EventMetadata::new(source);
        self.emit_with_metadata(event, metadata)
    }

    /// Emit a prepared event with custom metadata.
    pub fn emit_with_metadata(&self, event: BusEvent, metadata: EventMetadata) -> usize {
        let handlers: Vec<(ListenerId, Handler)> = self
            .inner
            .listeners
            .read()
            .iter()
            .filter(|l| l.name == event.name)
            .map(|l| (l.id, l.handler.clone()))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::error!(
                        event = %event.name,
                        listener = id.0,
                        source = %metadata.source,
                        "Listener panicked during delivery"
                    );
                }
            }
        }

        let _ = self.inner.tx.send((event, metadata));
        delivered
    }

    /// Subscribe to all events.
    ///
    /// If the subscriber falls behind, older events may be dropped.
    pub fn subscribe(&self) -> EventBusReceiver {
        EventBusReceiver {
            rx: self.inner.tx.subscribe(),
        }
    }

    /// Subscribe to events matching a filter.
    pub fn subscribe_filtered<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&BusEvent) -> bool + Send + 'static,
    {
        FilteredReceiver::new(self.inner.tx.subscribe(), filter)
    }

    /// Create a filtered subscription helper for common patterns.
    pub fn filter(&self) -> FilterBuilder {
        FilterBuilder {
            tx: self.inner.tx.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for all events from the event bus.
pub struct EventBusReceiver {
    rx: broadcast::Receiver<(BusEvent, EventMetadata)>,
}

impl EventBusReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` if the event bus is closed.
    pub async fn recv(&mut self) -> Option<(BusEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&mut self) -> Option<(BusEvent, EventMetadata)> {
        self.rx.try_recv().ok()
    }

    /// Drain every buffered event name.
    pub fn drain_names(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        while let Some((event, _)) = self.try_recv() {
            names.push(event.name);
        }
        names
    }
}

/// Receiver for filtered events from the event bus.
pub struct FilteredReceiver<F>
where
    F: Fn(&BusEvent) -> bool + Send,
{
    rx: broadcast::Receiver<(BusEvent, EventMetadata)>,
    filter: F,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&BusEvent) -> bool + Send,
{
    fn new(rx: broadcast::Receiver<(BusEvent, EventMetadata)>, filter: F) -> Self {
        Self { rx, filter }
    }

    /// Receive the next event matching the filter.
    pub async fn recv(&mut self) -> Option<(BusEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok((event, meta)) => {
                    if (self.filter)(&event) {
                        return Some((event, meta));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive a matching event without blocking.
    pub fn try_recv(&mut self) -> Option<(BusEvent, EventMetadata)> {
        while let Ok((event, meta)) = self.rx.try_recv() {
            if (self.filter)(&event) {
                return Some((event, meta));
            }
        }
        None
    }
}

/// Builder for creating filtered subscriptions.
pub struct FilterBuilder {
    tx: broadcast::Sender<(BusEvent, EventMetadata)>,
}

impl FilterBuilder {
    /// Subscribe to `shortcut:*` events only.
    pub fn shortcuts(&self) -> FilteredReceiver<fn(&BusEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), BusEvent::is_shortcut)
    }

    /// Subscribe to `cache-api:*` error events only.
    pub fn api_errors(&self) -> FilteredReceiver<fn(&BusEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), BusEvent::is_api_error)
    }

    /// Subscribe to `html-panel:*` events only.
    pub fn html_panel(&self) -> FilteredReceiver<fn(&BusEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), BusEvent::is_html_panel)
    }

    /// Subscribe to a single event name.
    pub fn named(
        &self,
        name: impl Into<String>,
    ) -> FilteredReceiver<impl Fn(&BusEvent) -> bool + Send + 'static> {
        let target = name.into();
        FilteredReceiver::new(self.tx.subscribe(), move |event: &BusEvent| {
            event.name == target
        })
    }

    /// Subscribe with a custom filter function.
    pub fn custom<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&BusEvent) -> bool + Send + 'static,
    {
        FilteredReceiver::new(self.tx.subscribe(), filter)
    }
}

/// Shared event bus handle.
pub type SharedEventBus = Arc<EventBus>;
