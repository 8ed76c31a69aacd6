//! Extension modules shipped by the releases after the base console.
//!
//! Each module targets components of earlier releases through their
//! declared slots and extensible operations only. Modules attach in
//! release order, so a later module's hooks wrap an earlier module's.

pub mod html_panel;
pub mod html_tab;
pub mod json_untruncate;
pub mod open_in_browser;
pub mod sidebar_resizer;
pub mod tree_keys;
pub mod views;

pub use html_panel::HtmlPanelModule;
pub use html_tab::HtmlTab;
pub use json_untruncate::JsonUntruncate;
pub use open_in_browser::{LinkTarget, OpenInBrowser};
pub use sidebar_resizer::SidebarResizer;
pub use tree_keys::TreeKeys;
pub use views::Views;

use crate::console::Console;
use cache_browser_core::extension::DynExtension;
use cache_browser_core::shortcuts::ShortcutCategory;
use cache_browser_core::{ShortcutDefinition, ShortcutDispatcher};
use semver::Version;
use std::sync::Arc;

pub const V0_1_1: Version = Version::new(0, 1, 1);
pub const V0_1_2: Version = Version::new(0, 1, 2);
pub const V0_1_3: Version = Version::new(0, 1, 3);

/// Every shipped module, in load order.
pub fn default_modules() -> Vec<DynExtension<Console>> {
    vec![
        // v0.1.1
        Arc::new(Views::new()),
        Arc::new(SidebarResizer::new()),
        // v0.1.2
        Arc::new(TreeKeys::new()),
        Arc::new(JsonUntruncate::new()),
        Arc::new(HtmlTab::new()),
        Arc::new(OpenInBrowser::new(LinkTarget::Json)),
        // v0.1.3
        Arc::new(HtmlPanelModule::new()),
        Arc::new(OpenInBrowser::new(LinkTarget::Content)),
    ]
}

/// Append the definitions not already bound, so a module attached twice
/// adds its shortcuts once. Returns how many were added.
pub(crate) fn append_shortcuts(
    dispatcher: &ShortcutDispatcher,
    shortcuts: Vec<ShortcutDefinition>,
    categories: Vec<(String, ShortcutCategory)>,
) -> usize {
    let existing = dispatcher.config().shortcuts;
    let missing: Vec<ShortcutDefinition> = shortcuts
        .into_iter()
        .filter(|def| {
            !existing.iter().any(|e| {
                e.key == def.key && e.event == def.event && e.ctrl == def.ctrl && e.shift == def.shift
            })
        })
        .collect();
    let added = missing.len();
    dispatcher.append(missing, categories);
    added
}

/// Release directory a component is served from.
pub(crate) fn release_dir(version: &Version) -> String {
    format!("v{version}")
}
