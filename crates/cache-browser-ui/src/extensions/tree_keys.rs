//! Arrow-key navigation for the file tree.

use super::{append_shortcuts, V0_1_2};
use crate::components::names;
use crate::console::Console;
use async_trait::async_trait;
use cache_browser_core::event::shortcuts;
use cache_browser_core::{
    ExtensionManifest, ExtensionModule, ListenerScope, Result, ShortcutDefinition,
};
use std::sync::atomic::{AtomicBool, Ordering};

pub const MODULE_ID: &str = "tree-keys";

pub struct TreeKeys {
    manifest: ExtensionManifest,
    listening: AtomicBool,
}

impl TreeKeys {
    pub fn new() -> Self {
        Self {
            manifest: ExtensionManifest::new(MODULE_ID, V0_1_2)
                .with_description("Arrow keys move through the file tree"),
            listening: AtomicBool::new(false),
        }
    }

    fn shortcuts() -> Vec<ShortcutDefinition> {
        let nav = |key: &str, event: &str, label: &str| {
            ShortcutDefinition::new(key, event, label).in_category("navigation")
        };
        vec![
            nav("ArrowDown", shortcuts::ITEM_NEXT, "Next Item"),
            nav("ArrowUp", shortcuts::ITEM_PREV, "Previous Item"),
            nav("ArrowRight", shortcuts::TREE_EXPAND, "Expand Folder"),
            nav("ArrowLeft", shortcuts::TREE_COLLAPSE, "Collapse Folder"),
            nav("Enter", shortcuts::ITEM_OPEN, "Open"),
            nav(" ", shortcuts::ITEM_OPEN, "Open"),
        ]
    }
}

#[async_trait]
impl ExtensionModule<Console> for TreeKeys {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn attach(&self, ctx: &Console) -> Result<()> {
        ctx.wait_for(&[names::FILE_TREE]).await?;
        append_shortcuts(ctx.shortcuts(), Self::shortcuts(), Vec::new());
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Next and previous are handled by the tree itself.
        let mut scope = ListenerScope::new(ctx.bus());
        scope.on_weak(shortcuts::TREE_EXPAND, ctx.file_tree(), |tree, _| {
            if tree.is_active() {
                tree.expand_or_descend();
            }
        });
        scope.on_weak(shortcuts::TREE_COLLAPSE, ctx.file_tree(), |tree, _| {
            if tree.is_active() {
                tree.collapse_or_ascend();
            }
        });
        scope.on_weak(shortcuts::ITEM_OPEN, ctx.file_tree(), |tree, _| {
            if tree.is_active() {
                tree.activate_selected();
            }
        });
        ctx.track(scope);
        Ok(())
    }
}
