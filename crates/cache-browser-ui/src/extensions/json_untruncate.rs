//! Shows long JSON strings in full.

use super::V0_1_2;
use crate::components::{names, FormatRequest};
use crate::console::Console;
use async_trait::async_trait;
use cache_browser_core::{ExtensionManifest, ExtensionModule, FnInterceptor, Result};
use std::sync::Arc;

pub const MODULE_ID: &str = "json-untruncate";

pub struct JsonUntruncate {
    manifest: ExtensionManifest,
}

impl JsonUntruncate {
    pub fn new() -> Self {
        Self {
            manifest: ExtensionManifest::new(MODULE_ID, V0_1_2)
                .with_description("Formatted JSON keeps long strings intact"),
        }
    }
}

#[async_trait]
impl ExtensionModule<Console> for JsonUntruncate {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn attach(&self, ctx: &Console) -> Result<()> {
        ctx.wait_for(&[names::CONTENT_VIEWER]).await?;
        ctx.content_viewer().format_chain().install(
            MODULE_ID,
            Arc::new(FnInterceptor::<FormatRequest, String>::new().before(|request| {
                request.max_string_len = None;
            })),
        );
        Ok(())
    }
}
