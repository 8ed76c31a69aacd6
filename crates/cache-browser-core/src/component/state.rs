//! Loading state shared by every async-loading surface, and request
//! generations that keep stale responses from overwriting newer state.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Element ids a component uses for its visible loading states.
pub mod state_ids {
    pub const LOADING: &str = "state-loading";
    pub const ERROR: &str = "state-error";
    pub const ERROR_MESSAGE: &str = "error-message";
    pub const EMPTY: &str = "state-empty";
    pub const CONTENT: &str = "state-content";
}

/// Visible state of a data-loading surface.
///
/// Exactly one of loading, error, empty or content is shown at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Empty,
    Error {
        message: String,
    },
    Content,
}

impl LoadState {
    pub fn error(message: impl Into<String>) -> Self {
        LoadState::Error {
            message: message.into(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadState::Error { .. })
    }

    pub fn shows_content(&self) -> bool {
        matches!(self, LoadState::Content)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Element id that is visible in this state, if any.
    pub fn visible_element(&self) -> Option<&'static str> {
        match self {
            LoadState::Idle => None,
            LoadState::Loading => Some(state_ids::LOADING),
            LoadState::Empty => Some(state_ids::EMPTY),
            LoadState::Error { .. } => Some(state_ids::ERROR),
            LoadState::Content => Some(state_ids::CONTENT),
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => write!(f, "idle"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::Empty => write!(f, "empty"),
            LoadState::Error { message } => write!(f, "error: {message}"),
            LoadState::Content => write!(f, "content"),
        }
    }
}

/// Ticket identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic request counter for one logical target.
///
/// Every request takes a ticket; only the holder of the latest ticket may
/// apply its response.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding every earlier one.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Supersede every outstanding ticket without issuing a new request.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
