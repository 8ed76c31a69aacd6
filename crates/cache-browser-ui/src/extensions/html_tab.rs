//! HTML preview tab inside the content viewer.
//!
//! The tab and its panel are injected once, hidden. They are shown while
//! the decoded content is an HTML document, either the body itself or the
//! `html` field of a JSON object; a badge marks the second case.

use super::V0_1_2;
use crate::components::content_viewer::FORMATTED_TAB;
use crate::components::{names, ContentViewer, LoadOutcome};
use crate::console::Console;
use crate::html::{extract_html, ExtractedHtml, HtmlSource};
use async_trait::async_trait;
use cache_browser_core::event::{self, ContentDecoded, FileSelected};
use cache_browser_core::{
    Component, Element, ExtensionManifest, ExtensionModule, FnInterceptor, ListenerScope,
    Placement, Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub const MODULE_ID: &str = "html-tab";

pub const HTML_TAB: &str = "html";
const TAB_ID: &str = "tab-html";
const PANEL_ID: &str = "panel-html";
const FRAME_ID: &str = "html-tab-frame";
const BADGE_ID: &str = "html-source-badge";

pub struct HtmlTab {
    manifest: ExtensionManifest,
    listening: AtomicBool,
}

impl HtmlTab {
    pub fn new() -> Self {
        Self {
            manifest: ExtensionManifest::new(MODULE_ID, V0_1_2)
                .with_description("HTML preview tab in the content viewer"),
            listening: AtomicBool::new(false),
        }
    }

    fn tab() -> Element {
        Element::new("button")
            .with_id(TAB_ID)
            .with_class("viewer-tab")
            .with_attr("data-tab", HTML_TAB)
            .with_text("HTML")
            .hidden()
            .with_child(
                Element::new("span")
                    .with_id(BADGE_ID)
                    .with_class("badge")
                    .with_text("field")
                    .hidden(),
            )
    }

    fn panel() -> Element {
        Element::new("div")
            .with_id(PANEL_ID)
            .with_class("viewer-panel")
            .with_attr("data-panel", HTML_TAB)
            .hidden()
            .with_child(
                Element::new("iframe")
                    .with_id(FRAME_ID)
                    .with_attr("sandbox", "allow-same-origin"),
            )
    }
}

fn show(viewer: &ContentViewer, found: &ExtractedHtml) {
    let core = viewer.core();
    core.update_injected(TAB_ID, |tab| {
        tab.hidden = false;
        if let Some(badge) = tab.find_mut(BADGE_ID) {
            badge.hidden = found.source != HtmlSource::JsonField;
        }
    });
    core.update_injected(PANEL_ID, |panel| {
        if let Some(frame) = panel.find_mut(FRAME_ID) {
            frame.attrs.insert("srcdoc".to_string(), found.html.clone());
        }
    });
}

fn hide(viewer: &ContentViewer) {
    if viewer.active_tab() == HTML_TAB {
        viewer.switch_tab(FORMATTED_TAB);
    }
    let core = viewer.core();
    core.update_injected(TAB_ID, |tab| tab.hidden = true);
    core.update_injected(PANEL_ID, |panel| {
        panel.hidden = true;
        if let Some(frame) = panel.find_mut(FRAME_ID) {
            frame.attrs.remove("srcdoc");
        }
    });
}

#[async_trait]
impl ExtensionModule<Console> for HtmlTab {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn attach(&self, ctx: &Console) -> Result<()> {
        ctx.wait_for(&[names::CONTENT_VIEWER]).await?;
        let viewer = ctx.content_viewer();
        viewer
            .core()
            .inject(MODULE_ID, "viewer-tabs", Self::tab(), Placement::Last)?;
        viewer
            .core()
            .inject(MODULE_ID, "viewer-panels", Self::panel(), Placement::Last)?;

        let target: Weak<ContentViewer> = Arc::downgrade(viewer);
        viewer.load_chain().install(
            MODULE_ID,
            Arc::new(FnInterceptor::new().after(
                move |_request: &FileSelected, outcome: &mut LoadOutcome| {
                    if outcome.is_loaded() {
                        return;
                    }
                    if let Some(viewer) = target.upgrade() {
                        hide(&viewer);
                    }
                },
            )),
        );

        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut scope = ListenerScope::new(ctx.bus());
        scope.on_weak(event::names::CONTENT_DECODED, viewer, |viewer, event| {
            let Some(decoded) = event.detail_as::<ContentDecoded>() else {
                return;
            };
            match extract_html(&decoded.value) {
                Some(found) => {
                    tracing::debug!(path = %decoded.path, source = found.source.as_str(), "HTML content detected");
                    show(viewer, &found);
                }
                None => hide(viewer),
            }
        });
        ctx.track(scope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::{bare_console, service, DOC, PAGE};
    use cache_browser_api::endpoints;
    use serde_json::json;

    const WRAPPED: &str = "default/data/direct/ef/wrapped.json";

    fn request(path: &str) -> FileSelected {
        FileSelected::new(path, "json", Some("default".into()))
    }

    #[tokio::test]
    async fn test_injection_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        let module = HtmlTab::new();
        module.attach(&console).await.unwrap();
        module.attach(&console).await.unwrap();

        let snapshot = console.content_viewer().core().snapshot();
        assert_eq!(snapshot.count_id(TAB_ID), 1);
        assert_eq!(snapshot.count_id(PANEL_ID), 1);
        assert_eq!(console.content_viewer().load_chain().len(), 1);
        assert!(!console.content_viewer().tabs().contains(&HTML_TAB.to_string()));
    }

    #[tokio::test]
    async fn test_tab_follows_decoded_content() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        HtmlTab::new().attach(&console).await.unwrap();
        let viewer = console.content_viewer();

        assert!(viewer.load_file(request(PAGE)).await.is_loaded());
        assert!(viewer.switch_tab(HTML_TAB));
        let snapshot = viewer.core().snapshot();
        assert_eq!(snapshot.is_hidden(PANEL_ID), Some(false));
        assert_eq!(snapshot.is_hidden(BADGE_ID), Some(true));
        assert_eq!(
            snapshot.element(FRAME_ID).unwrap().attr("srcdoc"),
            Some("<html><body>hi</body></html>")
        );

        viewer.load_file(request(DOC)).await;
        assert_eq!(viewer.active_tab(), FORMATTED_TAB);
        assert!(!viewer.tabs().contains(&HTML_TAB.to_string()));
        assert_eq!(viewer.core().snapshot().element(FRAME_ID).unwrap().attr("srcdoc"), None);
    }

    #[tokio::test]
    async fn test_html_field_shows_badge() {
        let dir = tempfile::tempdir().unwrap();
        let api = service();
        api.respond(&endpoints::file_json(WRAPPED), json!({"html": "<p>wrapped</p>"}));
        let console = bare_console(dir.path(), api).await;
        HtmlTab::new().attach(&console).await.unwrap();
        let viewer = console.content_viewer();

        viewer.load_file(request(WRAPPED)).await;
        assert!(viewer.tabs().contains(&HTML_TAB.to_string()));
        assert_eq!(viewer.core().snapshot().is_hidden(BADGE_ID), Some(false));
    }

    #[tokio::test]
    async fn test_failed_load_hides_tab() {
        let dir = tempfile::tempdir().unwrap();
        let console = bare_console(dir.path(), service()).await;
        HtmlTab::new().attach(&console).await.unwrap();
        let viewer = console.content_viewer();

        viewer.load_file(request(PAGE)).await;
        let outcome = viewer.load_file(request("default/data/missing.json")).await;
        assert!(!outcome.is_loaded());
        assert!(!viewer.tabs().contains(&HTML_TAB.to_string()));
    }
}
