//! Standalone HTML preview shown as a third column next to the viewer.

use super::{mark_active, names, set_enabled, Deps};
use async_trait::async_trait;
use cache_browser_core::event::{self, HtmlPanelShow};
use cache_browser_core::format::{file_name, format_bytes};
use cache_browser_core::{Component, ComponentCore, Element, ListenerScope, RenderRoot};
use parking_lot::RwLock;
use std::sync::Arc;

const DEFAULT_TITLE: &str = "HTML Preview";

const PANEL_TITLE: &str = "panel-title";
const HTML_SIZE: &str = "html-size";
const MODE_BUTTONS: &str = "mode-buttons";
const PREVIEW: &str = "preview-frame";
const SOURCE_VIEW: &str = "source-view";
const SOURCE_CODE: &str = "source-code";
const EMPTY_STATE: &str = "html-empty-state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlViewMode {
    #[default]
    Preview,
    Source,
}

impl HtmlViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlViewMode::Preview => "preview",
            HtmlViewMode::Source => "source",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PanelState {
    html: String,
    path: String,
    source_type: String,
    mode: HtmlViewMode,
}

pub struct HtmlPanel {
    core: ComponentCore,
    state: RwLock<PanelState>,
}

impl HtmlPanel {
    pub fn new(deps: &Deps) -> Arc<Self> {
        let panel = Arc::new(Self {
            core: deps.core(names::HTML_PANEL, Self::render_root()),
            state: RwLock::new(PanelState {
                source_type: "raw".to_string(),
                ..Default::default()
            }),
        });
        panel.render();
        panel
    }

    fn render_root() -> RenderRoot {
        let mode = |mode: HtmlViewMode, label: &str| {
            Element::new("button")
                .with_id(format!("mode-{}", mode.as_str()))
                .with_class("mode-btn")
                .with_attr("data-mode", mode.as_str())
                .with_text(label)
        };
        RenderRoot::new(
            names::HTML_PANEL,
            Element::new("aside").with_id("html-panel").with_children([
                Element::new("header").with_id("panel-header").with_children([
                    Element::new("span").with_id(PANEL_TITLE).with_text(DEFAULT_TITLE),
                    Element::new("span").with_id(HTML_SIZE),
                    Element::new("div").with_id(MODE_BUTTONS).with_children([
                        mode(HtmlViewMode::Preview, "Preview"),
                        mode(HtmlViewMode::Source, "Source"),
                    ]),
                    Element::new("div").with_id("panel-actions").with_children([
                        Element::new("button").with_id("html-copy-btn").with_text("Copy"),
                        Element::new("button").with_id("html-close-btn").with_text("Close"),
                    ]),
                ]),
                Element::new("div").with_id("panel-body").with_children([
                    Element::new("iframe").with_id(PREVIEW).with_attr("sandbox", "allow-same-origin"),
                    Element::new("pre")
                        .with_id(SOURCE_VIEW)
                        .with_child(Element::new("code").with_id(SOURCE_CODE)),
                    Element::new("div")
                        .with_id(EMPTY_STATE)
                        .with_text("Select an HTML file to preview it"),
                ]),
            ]),
        )
        .with_slot("panel-actions", "panel-actions")
    }

    pub fn html(&self) -> String {
        self.state.read().html.clone()
    }

    pub fn file_path(&self) -> String {
        self.state.read().path.clone()
    }

    pub fn source_type(&self) -> String {
        self.state.read().source_type.clone()
    }

    pub fn view_mode(&self) -> HtmlViewMode {
        self.state.read().mode
    }

    pub fn has_content(&self) -> bool {
        !self.state.read().html.is_empty()
    }

    pub fn show_content(&self, html: &str, path: &str, source_type: &str) {
        {
            let mut state = self.state.write();
            state.html = html.to_string();
            state.path = path.to_string();
            state.source_type = source_type.to_string();
        }
        tracing::debug!(path, source_type, size = html.len(), "Showing HTML");
        self.render();
    }

    /// Drop the shown document.
    pub fn clear_content(&self) {
        {
            let mut state = self.state.write();
            state.html.clear();
            state.path.clear();
            state.source_type = "raw".to_string();
        }
        self.render();
    }

    pub fn set_view_mode(&self, mode: HtmlViewMode) {
        self.state.write().mode = mode;
        self.render();
    }

    /// Ask the layout to close the panel.
    pub fn close(&self) {
        self.core.emit(event::names::HTML_PANEL_CLOSE, serde_json::json!({}));
    }

    /// Markup the copy action puts on the clipboard.
    pub fn copy_html(&self) -> Option<String> {
        let html = self.html();
        (!html.is_empty()).then_some(html)
    }

    fn render(&self) {
        let state = self.state.read().clone();
        let shown = !state.html.is_empty();
        let title = if state.path.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            file_name(&state.path).to_string()
        };
        let size = if shown {
            format_bytes(state.html.len() as u64)
        } else {
            String::new()
        };

        self.core.with_root_mut(|root| {
            root.set_text(PANEL_TITLE, title);
            root.set_attr(PANEL_TITLE, "title", state.path.as_str());
            root.set_text(HTML_SIZE, size);
            root.set_attr(PREVIEW, "srcdoc", state.html.as_str());
            root.set_text(SOURCE_CODE, state.html.as_str());
            root.set_hidden(EMPTY_STATE, shown);
            root.set_hidden(PREVIEW, !shown || state.mode != HtmlViewMode::Preview);
            root.set_hidden(SOURCE_VIEW, !shown || state.mode != HtmlViewMode::Source);
            mark_active(root, MODE_BUTTONS, "data-mode", state.mode.as_str());
            set_enabled(root, "html-copy-btn", shown);
        });
    }
}

#[async_trait]
impl Component for HtmlPanel {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn required_elements(&self) -> &'static [&'static str] {
        &[PANEL_TITLE, HTML_SIZE, PREVIEW, SOURCE_VIEW, EMPTY_STATE]
    }

    fn listen(self: Arc<Self>, scope: &mut ListenerScope) {
        scope.on_weak(event::names::HTML_PANEL_SHOW, &self, |this, event| {
            if let Some(show) = event.detail_as::<HtmlPanelShow>() {
                this.show_content(&show.html, &show.path, &show.source_type);
            }
        });
        scope.on_weak(event::names::HTML_PANEL_HIDE, &self, |this, _| {
            this.clear_content();
        });
    }

    fn clear(&self) {
        self.clear_content();
    }

    async fn refresh(&self) {
        self.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use cache_browser_core::{mount, EventBus};
    use serde_json::json;

    fn mounted() -> (Arc<HtmlPanel>, EventBus) {
        let bus = EventBus::new();
        let deps = Deps::new(bus.clone(), FakeApi::new());
        let panel = HtmlPanel::new(&deps);
        mount(&panel).unwrap();
        (panel, bus)
    }

    #[test]
    fn test_starts_empty() {
        let (panel, _bus) = mounted();
        let snapshot = panel.core().snapshot();
        assert_eq!(snapshot.text(PANEL_TITLE), Some(DEFAULT_TITLE));
        assert_eq!(snapshot.is_hidden(EMPTY_STATE), Some(false));
        assert_eq!(snapshot.is_hidden(PREVIEW), Some(true));
        assert!(panel.copy_html().is_none());
    }

    #[test]
    fn test_show_and_hide_events() {
        let (panel, bus) = mounted();
        bus.emit(
            event::names::HTML_PANEL_SHOW,
            json!({"html": "<p>hi</p>", "path": "ns/data/page.html", "sourceType": "json-field"}),
        );
        assert_eq!(panel.source_type(), "json-field");
        let snapshot = panel.core().snapshot();
        assert_eq!(snapshot.text(PANEL_TITLE), Some("page.html"));
        assert_eq!(snapshot.text(HTML_SIZE), Some("9 B"));
        assert_eq!(snapshot.is_hidden(EMPTY_STATE), Some(true));
        assert_eq!(snapshot.is_hidden(PREVIEW), Some(false));
        assert_eq!(snapshot.element(PREVIEW).unwrap().attr("srcdoc"), Some("<p>hi</p>"));

        bus.emit(event::names::HTML_PANEL_HIDE, json!({}));
        assert!(!panel.has_content());
        assert_eq!(panel.source_type(), "raw");
        assert_eq!(panel.core().snapshot().text(PANEL_TITLE), Some(DEFAULT_TITLE));
    }

    #[test]
    fn test_source_mode_and_close() {
        let (panel, bus) = mounted();
        let mut closed = bus.filter().named(event::names::HTML_PANEL_CLOSE);
        panel.show_content("<html></html>", "", "raw");
        panel.set_view_mode(HtmlViewMode::Source);

        let snapshot = panel.core().snapshot();
        assert_eq!(snapshot.text(PANEL_TITLE), Some(DEFAULT_TITLE));
        assert_eq!(snapshot.is_hidden(SOURCE_VIEW), Some(false));
        assert_eq!(snapshot.is_hidden(PREVIEW), Some(true));
        assert!(snapshot.element("mode-source").unwrap().has_class("active"));

        panel.close();
        assert_eq!(closed.try_recv().unwrap().1.source, names::HTML_PANEL);
    }
}
