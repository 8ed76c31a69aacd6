//! Error types shared by the console core.

use std::time::Duration;

/// Errors raised by the console core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A component's render root lacks an element it binds to.
    #[error("component '{component}' is missing required element '#{element}'")]
    MissingElement { component: String, element: String },

    /// A readiness wait ran out of budget.
    #[error("component '{component}' not ready after {waited:?}")]
    ReadyTimeout { component: String, waited: Duration },

    /// Lookup of a component that was never mounted.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// Injection into a slot the component never declared.
    #[error("component '{component}' has no slot named '{slot}'")]
    MissingSlot { component: String, slot: String },

    /// Injected elements must carry an id so injection can be idempotent.
    #[error("injected element has no id")]
    AnonymousElement,

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for console core operations.
pub type Result<T> = std::result::Result<T, Error>;
