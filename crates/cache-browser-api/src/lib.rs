//! Cache service client for the cache browser console.
//!
//! [`CacheApi`] is the RPC surface the console components consume. Every
//! endpoint is a `GET` routed through [`CacheApi::fetch`], so a test double
//! only has to answer `fetch`. [`CacheApiClient`] is the HTTP
//! implementation; it reports authentication and transport failures on the
//! event bus in addition to returning them.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod response;

pub use client::CacheApiClient;
pub use error::{ApiError, Result};
pub use response::ApiResponse;

use async_trait::async_trait;
use std::sync::Arc;

/// Endpoint catalog of the cache service.
#[async_trait]
pub trait CacheApi: Send + Sync {
    /// Base URL requests are sent to, without a trailing slash.
    fn base_url(&self) -> &str;

    /// `GET` an endpoint path relative to the base URL.
    async fn fetch(&self, endpoint: &str) -> Result<ApiResponse>;

    // info

    async fn health(&self) -> Result<ApiResponse> {
        self.fetch(endpoints::HEALTH).await
    }

    async fn server_info(&self) -> Result<ApiResponse> {
        self.fetch(endpoints::SERVER_INFO).await
    }

    async fn status(&self) -> Result<ApiResponse> {
        self.fetch(endpoints::STATUS).await
    }

    async fn versions(&self) -> Result<ApiResponse> {
        self.fetch(endpoints::VERSIONS).await
    }

    async fn storage_info(&self) -> Result<ApiResponse> {
        self.fetch(endpoints::STORAGE_INFO).await
    }

    // namespaces

    async fn namespaces(&self) -> Result<ApiResponse> {
        self.fetch(endpoints::NAMESPACES).await
    }

    async fn namespace_stats(&self, namespace: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::stats(namespace)).await
    }

    async fn file_ids(&self, namespace: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::file_ids(namespace)).await
    }

    async fn file_hashes(&self, namespace: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::file_hashes(namespace)).await
    }

    // retrieve by cache id

    async fn retrieve(&self, namespace: &str, cache_id: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve(namespace, cache_id)).await
    }

    async fn retrieve_as(&self, namespace: &str, cache_id: &str, kind: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_as(namespace, cache_id, kind))
            .await
    }

    async fn retrieve_metadata(&self, namespace: &str, cache_id: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_metadata(namespace, cache_id))
            .await
    }

    async fn retrieve_refs(&self, namespace: &str, cache_id: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_refs(namespace, cache_id))
            .await
    }

    async fn retrieve_refs_all(&self, namespace: &str, cache_id: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_refs_all(namespace, cache_id))
            .await
    }

    async fn retrieve_config(&self, namespace: &str, cache_id: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_config(namespace, cache_id))
            .await
    }

    // retrieve by hash

    async fn retrieve_by_hash(&self, namespace: &str, hash: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_by_hash(namespace, hash)).await
    }

    async fn retrieve_hash_metadata(&self, namespace: &str, hash: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_hash_metadata(namespace, hash))
            .await
    }

    async fn retrieve_hash_refs(&self, namespace: &str, hash: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_hash_refs(namespace, hash))
            .await
    }

    async fn retrieve_hash_cache_id(&self, namespace: &str, hash: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_hash_cache_id(namespace, hash))
            .await
    }

    async fn retrieve_hash_json(&self, namespace: &str, hash: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::retrieve_hash_json(namespace, hash))
            .await
    }

    async fn exists_by_hash(&self, namespace: &str, hash: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::exists_by_hash(namespace, hash)).await
    }

    // admin storage

    async fn bucket_name(&self) -> Result<ApiResponse> {
        self.fetch(endpoints::BUCKET_NAME).await
    }

    async fn file_exists(&self, path: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::file_exists(path)).await
    }

    async fn file_json(&self, path: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::file_json(path)).await
    }

    async fn all_files(&self, path: &str) -> Result<ApiResponse> {
        self.fetch(&endpoints::all_files(path)).await
    }

    async fn files_in(&self, path: &str, full_path: bool, recursive: bool) -> Result<ApiResponse> {
        self.fetch(&endpoints::files_in(path, full_path, recursive))
            .await
    }

    async fn folders(&self, path: &str, full_path: bool, recursive: bool) -> Result<ApiResponse> {
        self.fetch(&endpoints::folders(path, full_path, recursive))
            .await
    }

    /// Browser link showing a storage file as JSON.
    fn file_json_link(&self, path: &str) -> String {
        endpoints::file_json_link(self.base_url(), path)
    }

    /// Browser link to a storage file's raw content.
    fn file_content_link(&self, path: &str) -> String {
        endpoints::file_content_link(self.base_url(), path)
    }
}

/// Shared API handle.
pub type DynCacheApi = Arc<dyn CacheApi>;
