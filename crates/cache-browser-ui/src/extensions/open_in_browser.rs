//! "Open in browser" link in the viewer's action bar.
//!
//! One button is shared by both releases of this module. Each release
//! installs its own `load-file` post-hook; hooks run oldest first, so the
//! newest release decides the final link.

use super::{V0_1_2, V0_1_3};
use crate::components::{names, LoadOutcome};
use crate::console::Console;
use async_trait::async_trait;
use cache_browser_api::DynCacheApi;
use cache_browser_core::event::FileSelected;
use cache_browser_core::{
    Component, Element, ExtensionManifest, ExtensionModule, FnInterceptor, Placement, Result,
};
use std::sync::{Arc, Weak};

pub const BUTTON_ID: &str = "open-in-browser-btn";

/// Which storage view the link opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// The stored JSON document.
    Json,
    /// The file's raw content.
    Content,
}

impl LinkTarget {
    pub fn module_id(&self) -> &'static str {
        match self {
            LinkTarget::Json => "open-in-browser",
            LinkTarget::Content => "open-in-browser-content",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            LinkTarget::Json => "Open JSON in a new tab",
            LinkTarget::Content => "Open content in a new tab",
        }
    }

    pub fn link(&self, api: &DynCacheApi, path: &str) -> String {
        match self {
            LinkTarget::Json => api.file_json_link(path),
            LinkTarget::Content => api.file_content_link(path),
        }
    }
}

pub struct OpenInBrowser {
    manifest: ExtensionManifest,
    target: LinkTarget,
}

impl OpenInBrowser {
    pub fn new(target: LinkTarget) -> Self {
        let manifest = match target {
            LinkTarget::Json => ExtensionManifest::new(target.module_id(), V0_1_2),
            LinkTarget::Content => ExtensionManifest::new(target.module_id(), V0_1_3),
        }
        .with_description(target.title());
        Self { manifest, target }
    }

    fn button() -> Element {
        Element::new("a")
            .with_id(BUTTON_ID)
            .with_class("action-btn")
            .with_attr("target", "_blank")
            .with_attr("rel", "noopener")
            .with_text("Open")
            .hidden()
    }
}

#[async_trait]
impl ExtensionModule<Console> for OpenInBrowser {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn attach(&self, ctx: &Console) -> Result<()> {
        ctx.wait_for(&[names::CONTENT_VIEWER]).await?;
        let viewer = ctx.content_viewer();
        let module = self.target.module_id();
        viewer
            .core()
            .inject(module, "viewer-actions", Self::button(), Placement::First)?;

        let target = self.target;
        let api = ctx.api().clone();
        let weak: Weak<_> = Arc::downgrade(viewer);
        viewer.load_chain().install(
            module,
            Arc::new(FnInterceptor::new().after(
                move |_request: &FileSelected, outcome: &mut LoadOutcome| {
                    let Some(viewer) = weak.upgrade() else {
                        return;
                    };
                    let href = match &*outcome {
                        LoadOutcome::Loaded { path, .. } => Some(target.link(&api, path)),
                        LoadOutcome::Superseded => return,
                        LoadOutcome::Skipped | LoadOutcome::Failed { .. } => None,
                    };
                    viewer.core().update_injected(BUTTON_ID, |button| match href {
                        Some(href) => {
                            button.attrs.insert("href".to_string(), href);
                            button.attrs.insert("title".to_string(), target.title().to_string());
                            button.hidden = false;
                        }
                        None => {
                            button.attrs.remove("href");
                            button.hidden = true;
                        }
                    });
                },
            )),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::{bare_console, service, DOC};
    use cache_browser_api::endpoints;

    fn request(path: &str) -> FileSelected {
        FileSelected::new(path, "json", Some("default".into()))
    }

    fn href(console: &Console) -> Option<String> {
        console
            .content_viewer()
            .core()
            .snapshot()
            .element(BUTTON_ID)
            .and_then(|b| b.attr("href").map(str::to_string))
    }

    #[tokio::test]
    async fn test_json_link_after_load() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        OpenInBrowser::new(LinkTarget::Json).attach(&console).await.unwrap();

        let snapshot = console.content_viewer().core().snapshot();
        let actions = snapshot.element("viewer-actions").unwrap();
        assert_eq!(actions.children[0].id.as_deref(), Some(BUTTON_ID));
        assert_eq!(snapshot.is_hidden(BUTTON_ID), Some(true));

        console.content_viewer().load_file(request(DOC)).await;
        assert_eq!(
            href(&console).as_deref(),
            Some(endpoints::file_json_link("http://cache.test", DOC).as_str())
        );
    }

    #[tokio::test]
    async fn test_content_release_reuses_button_and_wins() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        OpenInBrowser::new(LinkTarget::Json).attach(&console).await.unwrap();
        OpenInBrowser::new(LinkTarget::Content).attach(&console).await.unwrap();

        let viewer = console.content_viewer();
        assert_eq!(viewer.core().snapshot().count_id(BUTTON_ID), 1);
        assert_eq!(
            viewer.load_chain().modules(),
            vec!["open-in-browser".to_string(), "open-in-browser-content".to_string()]
        );

        viewer.load_file(request(DOC)).await;
        assert_eq!(
            href(&console).as_deref(),
            Some("http://cache.test/admin/storage/file/content/default%2Fdata%2Fdirect%2Fab%2Fdoc.json")
        );

        viewer.load_file(request("default/data/gone.json")).await;
        assert!(href(&console).is_none());
        assert_eq!(viewer.core().snapshot().is_hidden(BUTTON_ID), Some(true));
    }
}
