//! Core traits and types for the cache browser console.
//!
//! This crate defines the composition protocol the console is built on:
//! the event bus, the component lifecycle, the version registry and the
//! extension protocol, plus the navigation models and preferences shared by
//! the UI crate.

pub mod component;
pub mod config;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod extension;
pub mod format;
pub mod nav;
pub mod preferences;
pub mod registry;
pub mod shortcuts;
pub mod tree;

pub use config::ConsoleConfig;
pub use error::{Error, Result};

// Event exports
pub use event::{BusEvent, EventMetadata};

// Event bus exports
pub use eventbus::{
    DEFAULT_CHANNEL_CAPACITY, EventBus, EventBusReceiver, FilterBuilder, FilteredReceiver,
    ListenerId, SharedEventBus,
};

pub use component::{
    Component, ComponentCore, Element, LifecycleState, ListenerScope, LoadState, Placement,
    Readiness, ReadinessBoard, RenderRoot, RequestGeneration, mount,
};
pub use extension::{
    AttachOutcome, AttachReport, ExtensionHost, ExtensionManifest, ExtensionModule,
    FnInterceptor, Interceptor, InterceptorChain,
};
pub use registry::ComponentRegistry;
pub use shortcuts::{KeyEvent, ShortcutConfig, ShortcutDefinition, ShortcutDispatcher};
pub use tree::{FileKind, FileTreeModel, VisibleRow};

/// Re-exports commonly used types.
pub mod prelude {
    // Configuration
    pub use crate::config::{ConsoleConfig, defaults, env_vars, timeouts};

    // Error handling
    pub use crate::error::{Error, Result};

    // Events
    pub use crate::event::{BusEvent, EventMetadata, names, shortcuts as shortcut_events};
    pub use crate::eventbus::{EventBus, ListenerId, SharedEventBus};

    // Components
    pub use crate::component::{
        Component, ComponentCore, Element, Injection, LifecycleState, ListenerScope, LoadState,
        Placement, Readiness, ReadinessBoard, RenderRoot, RequestGeneration, Ticket, mount,
        state_ids,
    };

    // Extensions
    pub use crate::extension::{
        AttachOutcome, DynExtension, ExtensionHost, ExtensionManifest, ExtensionModule,
        FnInterceptor, Interceptor, InterceptorChain,
    };

    pub use crate::registry::ComponentRegistry;
    pub use crate::shortcuts::{KeyEvent, ShortcutDispatcher};
    pub use crate::tree::{FileKind, FileTreeModel};
}
