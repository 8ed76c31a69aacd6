//! Side-by-side HTML column.
//!
//! Supersedes the in-viewer HTML tab: decoded HTML is routed to the
//! dedicated panel component and the layout opens its column.

use super::{release_dir, V0_1_3};
use crate::browser::CacheBrowser;
use crate::components::names;
use crate::console::Console;
use crate::html::extract_html;
use async_trait::async_trait;
use cache_browser_core::event::{self, ContentDecoded, HtmlPanelShow};
use cache_browser_core::{BusEvent, ExtensionManifest, ExtensionModule, ListenerScope, Result};
use std::sync::atomic::{AtomicBool, Ordering};

pub const MODULE_ID: &str = "html-panel";

pub struct HtmlPanelModule {
    manifest: ExtensionManifest,
    listening: AtomicBool,
}

impl HtmlPanelModule {
    pub fn new() -> Self {
        Self {
            manifest: ExtensionManifest::new(MODULE_ID, V0_1_3)
                .with_description("HTML preview in a resizable side column")
                .superseding(super::html_tab::MODULE_ID),
            listening: AtomicBool::new(false),
        }
    }
}

fn hide_column(browser: &CacheBrowser) {
    browser.set_html_column_visible(false);
    browser
        .bus()
        .emit_with_source(BusEvent::bare(event::names::HTML_PANEL_HIDE), MODULE_ID);
}

#[async_trait]
impl ExtensionModule<Console> for HtmlPanelModule {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn attach(&self, ctx: &Console) -> Result<()> {
        ctx.wait_for(&[names::CONTENT_VIEWER, names::HTML_PANEL]).await?;
        ctx.register_components([(names::HTML_PANEL, release_dir(&V0_1_3).as_str())]);
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut scope = ListenerScope::new(ctx.bus());
        scope.on_weak(event::names::CONTENT_DECODED, ctx.browser(), |browser, event| {
            let Some(decoded) = event.detail_as::<ContentDecoded>() else {
                return;
            };
            match extract_html(&decoded.value) {
                Some(found) => {
                    let show = HtmlPanelShow {
                        html: found.html,
                        path: decoded.path,
                        source_type: found.source.as_str().to_string(),
                    };
                    browser.set_html_column_visible(true);
                    browser.bus().emit_with_source(
                        BusEvent::typed(event::names::HTML_PANEL_SHOW, &show),
                        MODULE_ID,
                    );
                }
                None => hide_column(browser),
            }
        });
        scope.on_weak(event::names::HTML_PANEL_CLOSE, ctx.browser(), |browser, _| {
            hide_column(browser);
        });
        ctx.track(scope);
        Ok(())
    }
}
