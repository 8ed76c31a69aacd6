//! Drag-resizable sidebar.
//!
//! The saved width is applied on attach. A drag follows the pointer's
//! horizontal offset from where it started, clamped to the allowed range,
//! and the final width is persisted when the pointer is released.

use super::V0_1_1;
use crate::console::Console;
use async_trait::async_trait;
use cache_browser_core::event::{self, PointerPosition};
use cache_browser_core::preferences::clamp_width;
use cache_browser_core::{ExtensionManifest, ExtensionModule, ListenerScope, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const MODULE_ID: &str = "sidebar-resizer";

/// Sidebar width before any drag or saved preference.
pub const DEFAULT_SIDEBAR_WIDTH: u32 = 300;

#[derive(Debug, Clone, Copy)]
struct Drag {
    start_x: i64,
    start_width: u32,
}

pub struct SidebarResizer {
    manifest: ExtensionManifest,
    listening: AtomicBool,
}

impl SidebarResizer {
    pub fn new() -> Self {
        Self {
            manifest: ExtensionManifest::new(MODULE_ID, V0_1_1)
                .with_description("Drag-resizable sidebar with a remembered width"),
            listening: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ExtensionModule<Console> for SidebarResizer {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn attach(&self, ctx: &Console) -> Result<()> {
        if let Some(width) = ctx.width_preference().load() {
            tracing::debug!(width, "Restoring sidebar width");
            ctx.browser().set_sidebar_width(width);
        }
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let drag: Arc<Mutex<Option<Drag>>> = Arc::new(Mutex::new(None));
        let mut scope = ListenerScope::new(ctx.bus());

        let state = drag.clone();
        scope.on_weak(event::names::SIDEBAR_RESIZE_START, ctx.browser(), move |browser, event| {
            let Some(pointer) = event.detail_as::<PointerPosition>() else {
                return;
            };
            let start_width = browser.layout().sidebar_width.unwrap_or(DEFAULT_SIDEBAR_WIDTH);
            *state.lock() = Some(Drag {
                start_x: pointer.x,
                start_width,
            });
        });

        let state = drag.clone();
        scope.on_weak(event::names::SIDEBAR_RESIZE_MOVE, ctx.browser(), move |browser, event| {
            let Some(drag) = *state.lock() else {
                return;
            };
            let Some(pointer) = event.detail_as::<PointerPosition>() else {
                return;
            };
            let width = clamp_width(drag.start_width as i64 + pointer.x - drag.start_x);
            browser.set_sidebar_width(width);
        });

        let preference = ctx.width_preference().clone();
        scope.on_weak(event::names::SIDEBAR_RESIZE_END, ctx.browser(), move |browser, _| {
            if drag.lock().take().is_none() {
                return;
            }
            let Some(width) = browser.layout().sidebar_width else {
                return;
            };
            match preference.save(width as i64) {
                Ok(saved) => tracing::debug!(width = saved, "Sidebar width saved"),
                Err(e) => tracing::warn!(error = %e, "Failed to save sidebar width"),
            }
        });
        ctx.track(scope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::{bare_console, service};
    use serde_json::json;

    fn drag(console: &Console, from: i64, to: &[i64]) {
        let bus = console.bus();
        bus.emit(event::names::SIDEBAR_RESIZE_START, json!({ "x": from }));
        for x in to {
            bus.emit(event::names::SIDEBAR_RESIZE_MOVE, json!({ "x": x }));
        }
        bus.emit(event::names::SIDEBAR_RESIZE_END, json!({}));
    }

    #[tokio::test]
    async fn test_drag_clamps_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        SidebarResizer::new().attach(&console).await.unwrap();
        assert_eq!(console.browser().layout().sidebar_width, None);

        drag(&console, 100, &[250]);
        assert_eq!(console.browser().layout().sidebar_width, Some(450));
        assert_eq!(console.width_preference().load(), Some(450));

        drag(&console, 500, &[100]);
        assert_eq!(console.browser().layout().sidebar_width, Some(200));

        drag(&console, 0, &[900, 2000]);
        assert_eq!(console.width_preference().load(), Some(600));
    }

    #[tokio::test]
    async fn test_saved_width_restored_on_attach() {
        let dir = tempfile::tempdir().unwrap();
        let first = bare_console(dir.path(), service()).await;
        first.width_preference().save(420).unwrap();

        let second = bare_console(dir.path(), service()).await;
        SidebarResizer::new().attach(&second).await.unwrap();
        assert_eq!(second.browser().layout().sidebar_width, Some(420));
    }

    #[tokio::test]
    async fn test_move_without_press_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        SidebarResizer::new().attach(&console).await.unwrap();

        console
            .bus()
            .emit(event::names::SIDEBAR_RESIZE_MOVE, json!({ "x": 400 }));
        console.bus().emit(event::names::SIDEBAR_RESIZE_END, json!({}));
        assert_eq!(console.browser().layout().sidebar_width, None);
        assert_eq!(console.width_preference().load(), None);
    }
}
