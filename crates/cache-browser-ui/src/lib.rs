//! Cache browser console.
//!
//! The base release mounts three components (navigation bar, file tree and
//! content viewer) under the [`CacheBrowser`] orchestrator. Later releases
//! add their components and behavior as extension modules that attach to
//! the running [`Console`] without editing what came before.

pub mod browser;
pub mod components;
pub mod console;
pub mod extensions;
pub mod html;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use browser::{CacheBrowser, Layout, BASE_VERSION};
pub use components::{
    ContentViewer, FileTree, FilesView, HashesView, HtmlPanel, LoadOutcome, TopNav, View, ViewTabs,
};
pub use console::Console;
pub use extensions::default_modules;
pub use html::{extract_html, ExtractedHtml, HtmlSource};
