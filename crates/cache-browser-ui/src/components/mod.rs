//! Leaf components of the console.
//!
//! Each component owns one region of the page, talks to the others only
//! over the bus and keeps its markup in its own [`RenderRoot`].

pub mod content_viewer;
pub mod file_tree;
pub mod files_view;
pub mod hashes_view;
pub mod html_panel;
pub mod top_nav;
pub mod view_tabs;

pub use content_viewer::{ContentViewer, FormatRequest, LoadOutcome};
pub use file_tree::FileTree;
pub use files_view::{DetailTab, FilesView};
pub use hashes_view::HashesView;
pub use html_panel::{HtmlPanel, HtmlViewMode};
pub use top_nav::{Health, TopNav};
pub use view_tabs::{View, ViewTabs};

use crate::tasks::Background;
use cache_browser_api::DynCacheApi;
use cache_browser_core::component::state_ids;
use cache_browser_core::config::timeouts;
use cache_browser_core::nav::FilteredList;
use cache_browser_core::{ComponentCore, Element, EventBus, ReadinessBoard, RenderRoot};
use std::time::Duration;

/// Component names, which double as their readiness keys.
pub mod names {
    pub const TOP_NAV: &str = "top-nav";
    pub const FILE_TREE: &str = "file-tree";
    pub const CONTENT_VIEWER: &str = "content-viewer";
    pub const VIEW_TABS: &str = "view-tabs";
    pub const FILES_VIEW: &str = "files-view";
    pub const HASHES_VIEW: &str = "hashes-view";
    pub const HTML_PANEL: &str = "html-panel";
}

/// Services every component is constructed with.
#[derive(Clone)]
pub struct Deps {
    pub bus: EventBus,
    pub api: DynCacheApi,
    pub tasks: Background,
    pub readiness: ReadinessBoard,
    pub filter_debounce: Duration,
}

impl Deps {
    pub fn new(bus: EventBus, api: DynCacheApi) -> Self {
        Self {
            bus,
            api,
            tasks: Background::new(),
            readiness: ReadinessBoard::new(),
            filter_debounce: Duration::from_millis(timeouts::FILTER_DEBOUNCE_MS),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.filter_debounce = debounce;
        self
    }

    pub(crate) fn core(&self, name: &str, root: RenderRoot) -> ComponentCore {
        ComponentCore::new(name, &self.bus, self.readiness.handle(name), root)
    }
}

/// The four load-state elements, with `content` inside the content element.
pub(crate) fn state_elements(retry_id: &str, content: Vec<Element>) -> Vec<Element> {
    vec![
        Element::new("div")
            .with_id(state_ids::LOADING)
            .with_class("state-loading")
            .hidden(),
        Element::new("div")
            .with_id(state_ids::EMPTY)
            .with_class("state-empty")
            .hidden(),
        Element::new("div")
            .with_id(state_ids::ERROR)
            .with_class("state-error")
            .hidden()
            .with_child(Element::new("span").with_id(state_ids::ERROR_MESSAGE))
            .with_child(Element::new("button").with_id(retry_id).with_text("Retry")),
        Element::new("div")
            .with_id(state_ids::CONTENT)
            .with_class("state-content")
            .hidden()
            .with_children(content),
    ]
}

pub(crate) fn set_enabled(root: &mut RenderRoot, id: &str, enabled: bool) {
    if let Some(el) = root.element_mut(id) {
        if enabled {
            el.attrs.remove("disabled");
        } else {
            el.attrs.insert("disabled".to_string(), "true".to_string());
        }
    }
}

/// Mark the child of `parent` whose `attr` equals `value` active and every
/// other child inactive.
pub(crate) fn mark_active(root: &mut RenderRoot, parent: &str, attr: &str, value: &str) {
    if let Some(el) = root.element_mut(parent) {
        for child in el.children.iter_mut() {
            let on = child.attr(attr) == Some(value);
            child.toggle_class("active", on);
        }
    }
}

/// `"12 files"`, or `"3 of 12 files"` while a filter hides some.
pub(crate) fn list_stats(visible: usize, total: usize, noun: &str) -> String {
    if visible == total {
        format!("{total} {noun}")
    } else {
        format!("{visible} of {total} {noun}")
    }
}

/// Rows of a filtered id list. The focused row carries `focused`, the row
/// whose detail is open carries `selected`.
pub(crate) fn list_rows(
    list: &FilteredList,
    prefix: &str,
    class: &str,
    opened: Option<&str>,
) -> Vec<Element> {
    list.visible()
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let mut row = Element::new("div")
                .with_id(format!("{prefix}:{item}"))
                .with_class(class)
                .with_attr("data-id", item)
                .with_attr("data-index", index.to_string())
                .with_text(item);
            row.toggle_class("focused", list.selected() == Some(item));
            row.toggle_class("selected", opened == Some(item));
            row
        })
        .collect()
}
