//! Files, hashes and raw views.
//!
//! Brings the view tabs and the two list views into the page, binds `1`,
//! `2` and `3` to them and keeps the sidebar for the raw browser only.

use super::{append_shortcuts, release_dir, V0_1_1};
use crate::components::{names, View};
use crate::console::Console;
use async_trait::async_trait;
use cache_browser_core::event::{self, shortcuts, NavigateToFile, ViewChanged};
use cache_browser_core::{
    ExtensionManifest, ExtensionModule, ListenerScope, Result, ShortcutDefinition,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const MODULE_ID: &str = "views";

const COMPONENTS: [&str; 3] = [names::VIEW_TABS, names::FILES_VIEW, names::HASHES_VIEW];

pub struct Views {
    manifest: ExtensionManifest,
    listening: AtomicBool,
}

impl Views {
    pub fn new() -> Self {
        Self {
            manifest: ExtensionManifest::new(MODULE_ID, V0_1_1)
                .with_description("Files, hashes and raw views"),
            listening: AtomicBool::new(false),
        }
    }

    fn shortcuts() -> Vec<ShortcutDefinition> {
        vec![
            ShortcutDefinition::new("1", shortcuts::VIEW_FILES, "Files View").in_category("view"),
            ShortcutDefinition::new("2", shortcuts::VIEW_HASHES, "Hashes View").in_category("view"),
            ShortcutDefinition::new("3", shortcuts::VIEW_RAW, "Raw View").in_category("view"),
        ]
    }
}

#[async_trait]
impl ExtensionModule<Console> for Views {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn attach(&self, ctx: &Console) -> Result<()> {
        ctx.wait_for(&COMPONENTS).await?;

        let release = release_dir(&self.manifest.version);
        ctx.register_components(COMPONENTS.iter().map(|name| (*name, release.as_str())));

        append_shortcuts(ctx.shortcuts(), Self::shortcuts(), Vec::new());
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut scope = ListenerScope::new(ctx.bus());
        let browser = Arc::downgrade(ctx.browser());
        let tasks = ctx.tasks().clone();
        scope.on_weak(event::names::VIEW_CHANGED, ctx.file_tree(), move |tree, event| {
            let Some(changed) = event.detail_as::<ViewChanged>() else {
                return;
            };
            let raw = View::parse(&changed.view) == Some(View::Raw);
            if let Some(browser) = browser.upgrade() {
                browser.set_sidebar_visible(raw);
            }
            if raw {
                let tree = Arc::clone(tree);
                tasks.spawn(async move { tree.load_files().await });
            }
        });
        scope.on(event::names::NAVIGATE_TO_FILE, |event| {
            if let Some(nav) = event.detail_as::<NavigateToFile>() {
                tracing::debug!(cache_id = %nav.cache_id, "Navigating to file");
            }
        });
        ctx.track(scope);

        tracing::info!(module = MODULE_ID, "Views enabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::{bare_console, service};
    use cache_browser_api::endpoints;
    use cache_browser_core::KeyEvent;

    #[tokio::test]
    async fn test_number_keys_switch_views() {
        let dir = tempfile::tempdir().unwrap();
        let api = service();
        let console = bare_console(dir.path(), api.clone()).await;
        Views::new().attach(&console).await.unwrap();

        assert_eq!(console.registry().component_version(names::FILES_VIEW), "v0.1.1");
        assert_eq!(console.registry().component_version(names::FILE_TREE), "v0.1.0");

        console.handle_key(&KeyEvent::new("1"));
        assert_eq!(console.view_tabs().active_view(), View::Files);
        assert!(!console.browser().layout().sidebar_visible);

        let loads = api.call_count(&endpoints::all_files("default"));
        console.handle_key(&KeyEvent::new("3"));
        console.settle().await;
        assert_eq!(console.view_tabs().active_view(), View::Raw);
        assert!(console.browser().layout().sidebar_visible);
        assert_eq!(api.call_count(&endpoints::all_files("default")), loads + 1);
    }

    #[tokio::test]
    async fn test_second_attach_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        let module = Views::new();
        module.attach(&console).await.unwrap();
        let listeners = console.bus().listener_count(event::names::VIEW_CHANGED);
        module.attach(&console).await.unwrap();

        let bound = console
            .shortcuts()
            .config()
            .shortcuts
            .iter()
            .filter(|s| s.event == shortcuts::VIEW_HASHES)
            .count();
        assert_eq!(bound, 1);
        assert_eq!(console.bus().listener_count(event::names::VIEW_CHANGED), listeners);
    }
}
